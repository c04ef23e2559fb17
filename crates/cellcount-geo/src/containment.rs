//! Per-cell containment test.
//!
//! Most cells returned for a covering range sit near the polygon's edge, so
//! the cheap box check rejects the bulk of them before the exact
//! point-in-polygon predicate runs. Point queries skip geometry entirely:
//! a row counts when its cell descends from the cell enclosing the point.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cellcount_types::{CellId, CellRange};
use geo::Contains;
use geo_types::Polygon;

use crate::bbox::BoundingBox;
use crate::cells::CellGeometry;

/// What a row's cell is tested against.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Cells whose representative point lies inside the polygon.
    Polygon(Polygon<f64>),
    /// Descendants of one cell, given as the leaf range that cell spans.
    Cell(CellRange),
}

impl From<Polygon<f64>> for Target {
    fn from(polygon: Polygon<f64>) -> Self {
        Self::Polygon(polygon)
    }
}

/// Tests cells against one target.
///
/// Read-only apart from the diagnostic hit counter, so a single tester is
/// shared by every worker of a pipeline.
pub struct ContainmentTester {
    target: Target,
    bound: Option<BoundingBox>,
    cells: Arc<dyn CellGeometry>,
    hits: AtomicU64,
}

impl ContainmentTester {
    /// Create a tester, precomputing the polygon's bounding box.
    pub fn new(target: impl Into<Target>, cells: Arc<dyn CellGeometry>) -> Self {
        let target = target.into();
        let bound = match &target {
            Target::Polygon(polygon) => BoundingBox::of_polygon(polygon),
            Target::Cell(_) => None,
        };
        Self {
            target,
            bound,
            cells,
            hits: AtomicU64::new(0),
        }
    }

    /// Whether the cell lies inside the target.
    ///
    /// For a polygon, returns `false` as soon as the cell's box leaves the
    /// polygon's box; otherwise defers to the exact predicate on the cell's
    /// point. For a cell target, the leaf range spanned by a cell holds
    /// exactly its descendants.
    pub fn contains(&self, cell: CellId) -> bool {
        let inside = match &self.target {
            Target::Polygon(polygon) => self.bound.is_some_and(|bound| {
                bound.contains(&self.cells.cell_bound(cell))
                    && polygon.contains(&self.cells.cell_point(cell))
            }),
            Target::Cell(range) => range.contains(cell),
        };
        if inside {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        inside
    }

    /// Number of `true` results so far. Diagnostic only.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// The target under test.
    pub const fn target(&self) -> &Target {
        &self.target
    }

    /// Precomputed polygon bounding box; `None` for cell targets.
    pub const fn bound(&self) -> Option<BoundingBox> {
        self.bound
    }
}

impl core::fmt::Debug for ContainmentTester {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContainmentTester")
            .field("bound", &self.bound)
            .field("hits", &self.hits())
            .finish_non_exhaustive()
    }
}
