//! Cell identifier wrapper.
//!
//! Cell identifiers are 64-bit keys of a hierarchical spatial tessellation.
//! The aggregation pipeline only relies on their ordering; decoding a cell
//! into a point or a rectangle is the job of the geometry capability.

use serde::{Deserialize, Serialize};

/// Identifier of one cell in the spatial tessellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(pub u64);

impl CellId {
    /// Return the raw identifier.
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for CellId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CellId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<CellId> for u64 {
    fn from(id: CellId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_raw_value() {
        assert!(CellId(10) < CellId(50));
        assert_eq!(CellId::from(7).into_inner(), 7);
        assert_eq!(CellId(u64::MAX).to_string(), u64::MAX.to_string());
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&CellId(42)).unwrap_or_default();
        assert_eq!(json, "42");
    }
}
