//! Geometry capability for the cellcount service.
//!
//! Everything the aggregation pipeline needs to know about space lives here:
//! decoding `GeoJSON` into polygons, computing the cell-range covering of a
//! polygon, decoding a cell identifier into a point and a bounding box, and
//! the per-cell containment test that gates every row.
//!
//! # Containment
//!
//! ```text
//! cell id --> cell bbox --(outside polygon bbox)--> false
//!                 |
//!                 v
//!            cell point --> exact point-in-polygon (geo crate) --> bool
//! ```
//!
//! A point query is planned as the leaf range of the cell enclosing it, and
//! a row counts when its cell falls in that range.
//!
//! # Modules
//!
//! - [`bbox`] -- Axis-aligned latitude/longitude boxes
//! - [`cells`] -- The [`CellGeometry`] capability and its S2 implementation
//! - [`covering`] -- The [`Coverer`] capability and its S2 implementation
//! - [`shape`] -- Decoding `GeoJSON` request bodies into shapes
//! - [`containment`] -- The [`ContainmentTester`]
//! - [`error`] -- Shared error types

pub mod bbox;
pub mod cells;
pub mod containment;
pub mod covering;
pub mod error;
pub mod shape;

pub use bbox::BoundingBox;
pub use cells::{CellGeometry, MAX_LEVEL, S2Cells};
pub use containment::{ContainmentTester, Target};
pub use covering::{Coverer, DEFAULT_MAX_CELLS, S2Coverer, merge_ranges};
pub use error::GeoError;
pub use shape::{GeometryKind, Shape, decode_geometry};
