//! Error types for the counts API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cellcount_core::{CountError, CountOutcome};
use cellcount_geo::GeoError;

/// Errors that can occur in the counts API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A query parameter is missing or malformed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The geometry body or kind was rejected.
    #[error(transparent)]
    Geometry(#[from] GeoError),

    /// At least one polygon produced no total. The totals of the others
    /// are still reported.
    #[error("{}", describe(&.0.failures))]
    Incomplete(CountOutcome),
}

impl ApiError {
    /// HTTP status for this error.
    ///
    /// An incomplete count is a gateway timeout only when every failure was
    /// a deadline expiry.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidQuery(_) | Self::Geometry(_) => StatusCode::BAD_REQUEST,
            Self::Incomplete(outcome) if outcome.failures.iter().all(CountError::is_deadline) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            Self::Incomplete(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn describe(failures: &[CountError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Counts request failed");
        }

        let mut body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        if let (Self::Incomplete(outcome), Some(fields)) = (&self, body.as_object_mut()) {
            let failed: BTreeMap<String, String> = outcome
                .failures
                .iter()
                .map(|e| (e.index().to_string(), e.to_string()))
                .collect();
            fields.insert("failed".to_owned(), serde_json::json!(failed));
            fields.insert("totals".to_owned(), serde_json::json!(outcome.totals));
        }

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cellcount_core::{PipelineError, SourceError};
    use cellcount_types::PolygonResult;

    use super::*;

    fn incomplete(failures: Vec<CountError>) -> ApiError {
        let mut outcome = CountOutcome::default();
        outcome.totals.record(PolygonResult { index: 0, total: 4 });
        outcome.failures = failures;
        ApiError::Incomplete(outcome)
    }

    fn failed(index: usize) -> CountError {
        CountError::Polygon {
            index,
            source: PipelineError::Source(SourceError::Query("connection reset".to_owned())),
        }
    }

    fn timed_out(index: usize) -> CountError {
        CountError::Polygon {
            index,
            source: PipelineError::DeadlineExceeded(Duration::from_millis(10)),
        }
    }

    #[test]
    fn input_errors_are_bad_requests() {
        assert_eq!(
            ApiError::InvalidQuery("start is required".to_owned()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(GeoError::InvalidPrecision(31)).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn count_failures_are_server_errors() {
        let err = incomplete(vec![failed(2)]);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("no total produced for geometry index 2"));

        assert_eq!(incomplete(vec![timed_out(1)]).status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            incomplete(vec![timed_out(1), failed(2)]).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn message_lists_every_failed_index() {
        let message = incomplete(vec![failed(1), failed(3)]).to_string();
        assert!(message.contains("geometry index 1"));
        assert!(message.contains("; no total produced for geometry index 3"));
    }
}
