//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] errors. Errors raised while streaming rows are reported to the
//! pipeline as [`SourceError`]s.

use cellcount_core::SourceError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A returned value does not fit the data model.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<DbError> for SourceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Postgres(
                e @ (sqlx::Error::ColumnDecode { .. }
                | sqlx::Error::ColumnNotFound(_)
                | sqlx::Error::Decode(_)),
            ) => Self::Decode(e.to_string()),
            DbError::Decode(msg) => Self::Decode(msg),
            other => Self::Query(other.to_string()),
        }
    }
}
