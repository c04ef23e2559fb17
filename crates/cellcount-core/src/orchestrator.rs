//! Per-polygon orchestration.
//!
//! Each polygon of the input is counted independently: every covering range
//! becomes one row source and one pipeline run, and the range totals are
//! summed into the polygon's total. Polygons run in input order; the ranges
//! of a polygon run one after another. A polygon that fails yields an error
//! for its index and the remaining polygons are still counted.

use std::sync::Arc;
use std::time::Instant;

use cellcount_geo::{CellGeometry, ContainmentTester, Coverer, GeoError, Shape, Target};
use cellcount_types::{
    CellRange, CountsResponse, DateRange, EntityFilter, PolygonResult, RangeQuery,
};
use tracing::{debug, info, warn};

use crate::error::CountError;
use crate::pipeline::{Aggregate, Pipeline};
use crate::source::RowSourceFactory;

/// Which pipeline variant drives each range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Bounded worker pool.
    #[default]
    Concurrent,
    /// Direct consumption on the calling task.
    Serial,
}

/// A shape's containment target together with its covering.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonPlan {
    /// What rows are tested against.
    pub target: Target,
    /// Ordered, disjoint covering ranges.
    pub ranges: Vec<CellRange>,
}

impl PolygonPlan {
    /// Build plans for decoded shapes, in input order.
    ///
    /// A point is planned as the single leaf range of the cell enclosing it
    /// at `precision`.
    pub fn build(
        shapes: Vec<Shape>,
        precision: u8,
        coverer: &dyn Coverer,
    ) -> Result<Vec<Self>, GeoError> {
        shapes
            .into_iter()
            .enumerate()
            .map(|(index, shape)| match shape {
                Shape::Point(point) => {
                    let range = coverer.point_range(point, precision)?;
                    Ok(Self {
                        target: Target::Cell(range),
                        ranges: vec![range],
                    })
                }
                Shape::Polygon(polygon) => {
                    let ranges = coverer.covering(&polygon, precision).map_err(|e| match e {
                        GeoError::Empty(_) => GeoError::Empty(index),
                        other => other,
                    })?;
                    Ok(Self {
                        target: Target::Polygon(polygon),
                        ranges,
                    })
                }
            })
            .collect()
    }
}

/// Result of counting every polygon of a request.
#[derive(Debug, Default)]
pub struct CountOutcome {
    /// Totals of the polygons that completed, keyed by index.
    pub totals: CountsResponse,
    /// Polygons that produced no total, in input order.
    pub failures: Vec<CountError>,
}

impl CountOutcome {
    /// Whether every polygon produced a total.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives row sources and pipelines for every polygon of a request.
pub struct Orchestrator {
    factory: Arc<dyn RowSourceFactory>,
    cells: Arc<dyn CellGeometry>,
    pipeline: Pipeline,
}

impl Orchestrator {
    /// Create an orchestrator over an explicitly owned row source factory.
    pub fn new(
        factory: Arc<dyn RowSourceFactory>,
        cells: Arc<dyn CellGeometry>,
        pipeline: Pipeline,
    ) -> Self {
        Self {
            factory,
            cells,
            pipeline,
        }
    }

    /// The pipeline used for each range.
    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Count every polygon and merge the totals by index.
    ///
    /// A failing polygon is recorded in [`CountOutcome::failures`] and never
    /// appears in the totals; the other polygons are unaffected.
    pub async fn count(
        &self,
        plans: &[PolygonPlan],
        dates: DateRange,
        filter: EntityFilter,
        mode: ExecutionMode,
    ) -> CountOutcome {
        let started = Instant::now();
        let mut outcome = CountOutcome::default();
        for (index, plan) in plans.iter().enumerate() {
            match self.count_polygon(index, plan, dates, filter, mode).await {
                Ok(result) => outcome.totals.record(result),
                Err(e) => outcome.failures.push(e),
            }
        }
        info!(
            polygons = plans.len(),
            failed = outcome.failures.len(),
            ?mode,
            elapsed_ms = started.elapsed().as_millis(),
            "Geometry counted"
        );
        outcome
    }

    /// Count one polygon by summing the totals of its covering ranges.
    ///
    /// The first failing range aborts the polygon: later ranges are not
    /// queried.
    pub async fn count_polygon(
        &self,
        index: usize,
        plan: &PolygonPlan,
        dates: DateRange,
        filter: EntityFilter,
        mode: ExecutionMode,
    ) -> Result<PolygonResult, CountError> {
        let tester = Arc::new(ContainmentTester::new(
            plan.target.clone(),
            Arc::clone(&self.cells),
        ));

        let mut total: u64 = 0;
        for range in &plan.ranges {
            let query = RangeQuery {
                range: *range,
                dates,
                filter,
            };
            let rows = self.factory.open(query);
            let outcome = match mode {
                ExecutionMode::Concurrent => self.pipeline.run(rows, Arc::clone(&tester)).await,
                ExecutionMode::Serial => self.pipeline.run_serial(rows, &tester).await,
            };
            let Aggregate { total: range_total, .. } = outcome.map_err(|source| {
                warn!(
                    index,
                    min = %range.min,
                    max = %range.max,
                    error = %source,
                    "Range failed, abandoning polygon"
                );
                CountError::Polygon { index, source }
            })?;
            total = total
                .checked_add(range_total)
                .ok_or(CountError::Overflow { index })?;
        }

        debug!(
            index,
            ranges = plan.ranges.len(),
            total,
            contained_cells = tester.hits(),
            "Polygon counted"
        );
        Ok(PolygonResult { index, total })
    }
}

impl core::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
