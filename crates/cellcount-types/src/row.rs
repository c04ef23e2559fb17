//! Partial aggregates produced by the store.

use serde::{Deserialize, Serialize};

use crate::ids::CellId;

/// Summed counter for one cell over a query's date range and filter.
///
/// Rows are ephemeral: a row source yields each one exactly once and exactly
/// one pipeline worker consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Sum of the per-day counter for the cell.
    pub value: u64,
    /// Cell the value belongs to.
    pub cell_id: CellId,
}

impl Row {
    /// Build a row from a raw value and cell identifier.
    pub const fn new(value: u64, cell_id: u64) -> Self {
        Self {
            value,
            cell_id: CellId(cell_id),
        }
    }
}
