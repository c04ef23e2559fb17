//! `PostgreSQL` data layer for the cellcount service.
//!
//! Counters live in a single `data` table, pre-aggregated by entity, day and
//! leaf cell. The only read path is the range scan issued once per covering
//! range; it is exposed to the pipeline as a row source factory.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator
//!     |
//!     +-- RowSourceFactory::open(RangeQuery)
//!         |
//!         CountStore --> PostgreSQL (PostgresPool)
//!             SELECT SUM(count), s2cellid ... GROUP BY s2cellid
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`count_store`] -- The range-scan row source
//! - [`error`] -- Shared error types

pub mod count_store;
pub mod error;
pub mod postgres;

// Re-export primary types for convenience.
pub use count_store::{CountRow, CountStore};
pub use error::DbError;
pub use postgres::{PostgresConfig, PostgresPool};
