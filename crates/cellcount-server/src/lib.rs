//! HTTP counts API for the cellcount service.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`POST /v1/counts/{kind}`** -- total of the per-cell counters inside
//!   each polygon of a `GeoJSON` body, aggregated by the worker pool
//! - **`POST /v1/counts/serial/{kind}`** -- the same query on the serial
//!   baseline
//! - **`GET /health`** -- liveness probe
//!
//! # Architecture
//!
//! ```text
//! request --> parse params + GeoJSON --> PolygonPlan::build (covering)
//!                                              |
//!                                              v
//!                     Orchestrator --> CountStore --> PostgreSQL
//!                                              |
//!                                              v
//!                                   {"0": n0, "1": n1, ...}
//! ```
//!
//! Input errors are rejected with `400` before any store query runs. A
//! polygon that cannot be counted fails the whole request with `500`
//! naming its index, or `504` when the aggregation deadline expired.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
