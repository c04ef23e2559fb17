//! Construction errors for query types.

use chrono::NaiveDate;

use crate::ids::CellId;

/// Errors raised when a query value is built from inconsistent bounds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// The lower cell bound is greater than the upper bound.
    #[error("invalid cell range: min {min} is greater than max {max}")]
    InvalidCellRange {
        /// Requested lower bound.
        min: CellId,
        /// Requested upper bound.
        max: CellId,
    },

    /// The start date falls after the end date.
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Requested first day.
        start: NaiveDate,
        /// Requested last day.
        end: NaiveDate,
    },
}
