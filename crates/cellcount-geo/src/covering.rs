//! Cell-range coverings.
//!
//! A covering is a conservative approximation of a polygon by cells. The
//! store can only answer range scans, so every covering cell is widened to
//! the range of leaf identifiers it spans, and touching ranges are merged.
//! Rows from those ranges still go through the exact containment test.

use cellcount_types::{CellId, CellRange};
use geo_types::{Point, Polygon};
use s2::cellid::CellID;
use s2::rect::Rect;
use s2::region::RegionCoverer;
use s2::{r1, s1};

use crate::bbox::BoundingBox;
use crate::cells::{MAX_LEVEL, S2Cells};
use crate::error::GeoError;

/// Default cap on the number of cells in a covering.
pub const DEFAULT_MAX_CELLS: usize = 8;

/// Computes the cell-range covering of a polygon at a precision level.
pub trait Coverer: Send + Sync {
    /// Ordered, disjoint ranges whose union covers `polygon`.
    fn covering(&self, polygon: &Polygon<f64>, precision: u8) -> Result<Vec<CellRange>, GeoError>;

    /// Leaf range of the cell that encloses `point` at `precision`.
    fn point_range(&self, point: Point<f64>, precision: u8) -> Result<CellRange, GeoError>;
}

/// [`Coverer`] backed by the S2 region coverer.
///
/// The polygon is covered through its bounding rectangle, which keeps the
/// covering conservative without an S2 loop representation.
#[derive(Debug, Clone, Copy)]
pub struct S2Coverer {
    max_cells: usize,
}

impl S2Coverer {
    /// Create a coverer emitting at most `max_cells` cells per polygon.
    pub const fn new(max_cells: usize) -> Self {
        Self { max_cells }
    }

    /// Maximum number of cells per covering.
    pub const fn max_cells(&self) -> usize {
        self.max_cells
    }
}

impl Default for S2Coverer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CELLS)
    }
}

impl Coverer for S2Coverer {
    fn covering(&self, polygon: &Polygon<f64>, precision: u8) -> Result<Vec<CellRange>, GeoError> {
        check_precision(precision)?;
        let Some(bbox) = BoundingBox::of_polygon(polygon) else {
            return Err(GeoError::Empty(0));
        };

        let rect = Rect {
            lat: r1::interval::Interval {
                lo: bbox.min_lat.to_radians(),
                hi: bbox.max_lat.to_radians(),
            },
            lng: s1::interval::Interval {
                lo: bbox.min_lng.to_radians(),
                hi: bbox.max_lng.to_radians(),
            },
        };
        let coverer = RegionCoverer {
            min_level: 0,
            max_level: precision,
            level_mod: 1,
            max_cells: self.max_cells,
        };

        let ranges: Vec<CellRange> = coverer
            .covering(&rect)
            .0
            .iter()
            .map(leaf_range)
            .collect();
        let merged = merge_ranges(ranges);

        tracing::debug!(
            precision,
            max_cells = self.max_cells,
            ranges = merged.len(),
            "Computed covering"
        );
        Ok(merged)
    }

    fn point_range(&self, point: Point<f64>, precision: u8) -> Result<CellRange, GeoError> {
        check_precision(precision)?;
        Ok(leaf_range(&S2Cells::enclosing_cell(point, precision)))
    }
}

/// Sort ranges and merge the ones that overlap or touch.
pub fn merge_ranges(mut ranges: Vec<CellRange>) -> Vec<CellRange> {
    ranges.sort_unstable();
    let mut merged: Vec<CellRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if last.joins(&range) => {
                last.max = last.max.max(range.max);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Leaf identifiers spanned by a covering cell.
fn leaf_range(id: &CellID) -> CellRange {
    CellRange {
        min: CellId(id.range_min().0),
        max: CellId(id.range_max().0),
    }
}

const fn check_precision(precision: u8) -> Result<(), GeoError> {
    if precision > MAX_LEVEL {
        return Err(GeoError::InvalidPrecision(precision));
    }
    Ok(())
}
