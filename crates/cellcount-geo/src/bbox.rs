//! Axis-aligned latitude/longitude boxes.
//!
//! Boxes are closed on every side and expressed in degrees. They gate the
//! exact containment test: a cell whose box is not inside the polygon's box
//! cannot be inside the polygon.

use geo::BoundingRect;
use geo_types::{Polygon, Rect};

/// Closed latitude/longitude box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Southern edge.
    pub min_lat: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Western edge.
    pub min_lng: f64,
    /// Eastern edge.
    pub max_lng: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub const fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    /// Box of a `geo` rectangle (x = longitude, y = latitude).
    pub fn from_rect(rect: &Rect<f64>) -> Self {
        Self {
            min_lat: rect.min().y,
            max_lat: rect.max().y,
            min_lng: rect.min().x,
            max_lng: rect.max().x,
        }
    }

    /// Box of a polygon, or `None` when the exterior ring is empty.
    pub fn of_polygon(polygon: &Polygon<f64>) -> Option<Self> {
        polygon.bounding_rect().map(|rect| Self::from_rect(&rect))
    }

    /// Check if this box fully contains another.
    pub fn contains(&self, other: &Self) -> bool {
        self.min_lat <= other.min_lat
            && self.max_lat >= other.max_lat
            && self.min_lng <= other.min_lng
            && self.max_lng >= other.max_lng
    }
}
