//! Shared type definitions for the cellcount spatial aggregation service.
//!
//! This crate is the single source of truth for the values that flow between
//! the store, the aggregation pipeline, and the HTTP layer. Response types
//! are exported to `TypeScript` via `ts-rs` for the map client.
//!
//! # Modules
//!
//! - [`ids`] -- The ordered [`CellId`] wrapper
//! - [`query`] -- Cell ranges, date ranges, entity filters, and range queries
//! - [`row`] -- Partial aggregates produced by the store
//! - [`response`] -- Per-polygon totals and the keyed response mapping
//! - [`error`] -- Construction errors for the query types

pub mod error;
pub mod ids;
pub mod query;
pub mod response;
pub mod row;

// Re-export all public types at crate root for convenience.
pub use error::TypeError;
pub use ids::CellId;
pub use query::{CellRange, DateRange, EntityFilter, RangeQuery};
pub use response::{CountsResponse, PolygonResult};
pub use row::Row;
