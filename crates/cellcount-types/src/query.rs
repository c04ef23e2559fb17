//! Query inputs handed to a row source.
//!
//! A polygon is approximated by an ordered sequence of [`CellRange`]s (its
//! covering). Each range, combined with the request's [`DateRange`] and
//! [`EntityFilter`], forms one [`RangeQuery`]: the independent unit of work
//! the store answers and the pipeline aggregates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::CellId;

/// Contiguous, inclusive interval of cell identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellRange {
    /// Smallest identifier in the range.
    pub min: CellId,
    /// Largest identifier in the range.
    pub max: CellId,
}

impl CellRange {
    /// Build a range, rejecting `min > max`.
    pub fn new(min: CellId, max: CellId) -> Result<Self, TypeError> {
        if min > max {
            return Err(TypeError::InvalidCellRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Whether `cell` lies inside the range (bounds included).
    pub fn contains(&self, cell: CellId) -> bool {
        self.min <= cell && cell <= self.max
    }

    /// Whether the two ranges overlap or touch end to end.
    pub const fn joins(&self, other: &Self) -> bool {
        // `checked_add` keeps the u64::MAX edge from wrapping.
        let touches = match self.max.0.checked_add(1) {
            Some(next) => next >= other.min.0,
            None => true,
        };
        touches && other.max.0.saturating_add(1) >= self.min.0
    }
}

/// Inclusive range of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First day included in the query.
    pub start: NaiveDate,
    /// Last day included in the query.
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a date range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TypeError> {
        if start > end {
            return Err(TypeError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }
}

/// Optional restriction of the counters to a single entity.
///
/// Absence of a filter is explicit: an entity id of `0` is a legitimate id
/// and selects only that entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityFilter(Option<i64>);

impl EntityFilter {
    /// Filter matching every entity.
    pub const fn all() -> Self {
        Self(None)
    }

    /// Filter matching exactly one entity.
    pub const fn only(id: i64) -> Self {
        Self(Some(id))
    }

    /// The selected entity, if any.
    pub const fn entity(self) -> Option<i64> {
        self.0
    }

    /// Whether the filter lets every entity through.
    pub const fn is_all(self) -> bool {
        self.0.is_none()
    }
}

impl From<Option<i64>> for EntityFilter {
    fn from(id: Option<i64>) -> Self {
        Self(id)
    }
}

/// One store query: a single covering range for a date range and filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeQuery {
    /// Covering range to scan.
    pub range: CellRange,
    /// Days to include.
    pub dates: DateRange,
    /// Entity restriction.
    pub filter: EntityFilter,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    #[test]
    fn cell_range_rejects_inverted_bounds() {
        let err = CellRange::new(CellId(50), CellId(10));
        assert_eq!(
            err,
            Err(TypeError::InvalidCellRange {
                min: CellId(50),
                max: CellId(10)
            })
        );
    }

    #[test]
    fn cell_range_contains_bounds() {
        let range = CellRange::new(CellId(10), CellId(50)).unwrap_or(CellRange {
            min: CellId(0),
            max: CellId(0),
        });
        assert!(range.contains(CellId(10)));
        assert!(range.contains(CellId(50)));
        assert!(range.contains(CellId(12)));
        assert!(!range.contains(CellId(999)));
        assert!(!range.contains(CellId(9)));
    }

    #[test]
    fn adjacent_ranges_join() {
        let a = CellRange { min: CellId(1), max: CellId(5) };
        let b = CellRange { min: CellId(6), max: CellId(9) };
        let c = CellRange { min: CellId(8), max: CellId(20) };
        let d = CellRange { min: CellId(30), max: CellId(40) };
        assert!(a.joins(&b));
        assert!(b.joins(&c));
        assert!(!a.joins(&d));

        let top = CellRange { min: CellId(u64::MAX - 1), max: CellId(u64::MAX) };
        assert!(top.joins(&top));
    }

    #[test]
    fn date_range_is_inclusive_and_ordered() {
        assert!(DateRange::new(day(2015, 1, 1), day(2015, 1, 1)).is_ok());
        assert!(DateRange::new(day(2015, 1, 2), day(2015, 1, 1)).is_err());
    }

    #[test]
    fn zero_is_a_real_entity() {
        let filter = EntityFilter::only(0);
        assert!(!filter.is_all());
        assert_eq!(filter.entity(), Some(0));
        assert!(EntityFilter::default().is_all());
    }
}
