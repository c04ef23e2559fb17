//! Shared application state for the counts API.
//!
//! [`AppState`] owns everything a request needs: the orchestrator (with its
//! row source factory and pipeline), the coverer that turns polygons into
//! cell ranges, and the geometry settings. It is built once at startup and
//! shared across handlers behind an [`Arc`].

use std::sync::Arc;

use cellcount_core::config::GeometrySection;
use cellcount_core::{CountsConfig, Orchestrator, Pipeline, PipelineError, RowSourceFactory};
use cellcount_geo::{CellGeometry, Coverer};

/// Shared state for all request handlers.
pub struct AppState {
    /// Drives the pipeline for every polygon of a request.
    pub orchestrator: Orchestrator,
    /// Computes the covering of each polygon.
    pub coverer: Arc<dyn Coverer>,
    /// Default precision and covering limits.
    pub geometry: GeometrySection,
}

impl AppState {
    /// Assemble the state from its capabilities and the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the pipeline section is unusable.
    pub fn new(
        factory: Arc<dyn RowSourceFactory>,
        cells: Arc<dyn CellGeometry>,
        coverer: Arc<dyn Coverer>,
        config: &CountsConfig,
    ) -> Result<Self, PipelineError> {
        let pipeline = Pipeline::new(config.pipeline.to_pipeline_config())?;
        Ok(Self {
            orchestrator: Orchestrator::new(factory, cells, pipeline),
            coverer,
            geometry: config.geometry.clone(),
        })
    }
}

impl core::fmt::Debug for AppState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppState")
            .field("orchestrator", &self.orchestrator)
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}
