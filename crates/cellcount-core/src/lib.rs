//! Concurrent containment-aggregation for the cellcount service.
//!
//! Given the cell-range covering of each input polygon, this crate pulls
//! pre-aggregated `(cell, count)` rows from a row source, keeps the ones
//! whose cell genuinely lies inside the polygon, and sums them into one
//! total per polygon.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator
//!     |
//!     +-- for each polygon (input order)
//!         +-- for each covering range
//!             |
//!             RowSourceFactory::open --> RowStream
//!                                           |
//!                                           v
//!             Pipeline: producer --> bounded queue --> W workers
//!                                                        |
//!                                           ContainmentTester + atomic sum
//!                                                        |
//!                                        close + join barrier --> total
//! ```
//!
//! # Modules
//!
//! - [`source`] -- Row source traits and the in-memory source
//! - [`pipeline`] -- The bounded worker-pool aggregation pipeline
//! - [`orchestrator`] -- Per-polygon, per-range driving and result merge
//! - [`config`] -- YAML configuration with environment overrides
//! - [`error`] -- Pipeline and orchestration errors

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod source;

pub use config::CountsConfig;
pub use error::{CountError, PipelineError};
pub use orchestrator::{CountOutcome, ExecutionMode, Orchestrator, PolygonPlan};
pub use pipeline::{Aggregate, Pipeline, PipelineConfig};
pub use source::{MemorySource, RowSourceFactory, RowStream, SourceError};
