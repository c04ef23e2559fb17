//! Error types for the geometry capability.

/// Errors raised while decoding or covering a geometry.
///
/// All variants are input errors: they are detected before any store query
/// runs and are never retried.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    /// The request body is not valid `GeoJSON` for the supported shapes.
    #[error("invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    /// The body's geometry type does not match the requested kind.
    #[error("geometry type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Kind named by the request.
        expected: String,
        /// Type found in the body.
        found: String,
    },

    /// The requested kind is not one of `point`, `polygon`, `multipolygon`.
    #[error("unsupported geometry kind: {0}")]
    UnsupportedKind(String),

    /// Precision outside the levels supported by the tessellation.
    #[error("invalid precision {0}: must be between 0 and 30")]
    InvalidPrecision(u8),

    /// The geometry has no area to cover (e.g. an empty exterior ring).
    #[error("geometry {0} has no bounding rectangle")]
    Empty(usize),
}
