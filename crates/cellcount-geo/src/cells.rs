//! Cell decoding capability.
//!
//! The pipeline treats cell identifiers as opaque ordered keys. Turning a
//! key into something spatial (its bounding box and a representative point)
//! goes through [`CellGeometry`], so tests can substitute a lookup table for
//! the real tessellation.

use cellcount_types::CellId;
use geo_types::Point;
use s2::cell::Cell;
use s2::cellid::CellID;
use s2::latlng::LatLng;

use crate::bbox::BoundingBox;

/// Finest level of the S2 hierarchy (leaf cells).
pub const MAX_LEVEL: u8 = 30;

/// Decodes cell identifiers into spatial extents.
pub trait CellGeometry: Send + Sync {
    /// Bounding box of the cell.
    fn cell_bound(&self, cell: CellId) -> BoundingBox;

    /// Representative point of the cell (x = longitude, y = latitude).
    fn cell_point(&self, cell: CellId) -> Point<f64>;
}

/// [`CellGeometry`] backed by the S2 tessellation.
#[derive(Debug, Clone, Copy, Default)]
pub struct S2Cells;

impl S2Cells {
    /// The cell at `level` that contains `point`.
    pub fn enclosing_cell(point: Point<f64>, level: u8) -> CellID {
        let leaf = CellID::from(&LatLng::from_degrees(point.y(), point.x()));
        leaf.parent(u64::from(level.min(MAX_LEVEL)))
    }
}

impl CellGeometry for S2Cells {
    fn cell_bound(&self, cell: CellId) -> BoundingBox {
        bound_of(CellID(cell.into_inner()))
    }

    fn cell_point(&self, cell: CellId) -> Point<f64> {
        let center = LatLng::from(&CellID(cell.into_inner()));
        Point::new(center.lng.deg(), center.lat.deg())
    }
}

/// Degree bounding box of an S2 cell.
fn bound_of(id: CellID) -> BoundingBox {
    let rect = Cell::from(&id).rect_bound();
    BoundingBox::new(
        rect.lat.lo.to_degrees(),
        rect.lat.hi.to_degrees(),
        rect.lng.lo.to_degrees(),
        rect.lng.hi.to_degrees(),
    )
}
