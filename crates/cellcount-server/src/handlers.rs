//! REST endpoint handlers for the counts API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness probe |
//! | `POST` | `/v1/counts/{kind}` | Counts inside each polygon (worker pool) |
//! | `POST` | `/v1/counts/serial/{kind}` | Same, on the serial baseline |
//!
//! `kind` is `point`, `polygon` or `multipolygon`. Query parameters:
//! `start` and `end` (inclusive, `YYYY-MM-DD`, required), `precision`
//! (cell level `0..=30`, optional) and `id` (entity filter, optional).

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use cellcount_core::{ExecutionMode, PolygonPlan};
use cellcount_geo::{GeometryKind, MAX_LEVEL, decode_geometry};
use cellcount_types::{DateRange, EntityFilter};
use chrono::NaiveDate;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Response header carrying the per-request query id.
pub const QUERY_ID_HEADER: &str = "x-query-id";

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Raw query parameters for the counts endpoints.
///
/// Kept as strings so malformed values are reported as JSON `400`s by
/// [`CountsQuery::parse`].
#[derive(Debug, Default, serde::Deserialize)]
pub struct CountsQuery {
    /// First day of the range, inclusive.
    pub start: Option<String>,
    /// Last day of the range, inclusive.
    pub end: Option<String>,
    /// Covering precision level.
    pub precision: Option<String>,
    /// Entity id to restrict the counts to.
    pub id: Option<String>,
}

/// Validated counts parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountsParams {
    /// Inclusive day range.
    pub dates: DateRange,
    /// Covering precision level.
    pub precision: u8,
    /// Entity filter.
    pub filter: EntityFilter,
}

impl CountsQuery {
    /// Validate the raw parameters, filling in the default precision.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidQuery`] for a missing or malformed date, a
    /// reversed date range, a precision above 30, or a non-numeric id.
    pub fn parse(&self, default_precision: u8) -> Result<CountsParams, ApiError> {
        let start = parse_date("start", self.start.as_deref())?;
        let end = parse_date("end", self.end.as_deref())?;
        let dates =
            DateRange::new(start, end).map_err(|e| ApiError::InvalidQuery(e.to_string()))?;

        let precision = match self.precision.as_deref() {
            None | Some("") => default_precision,
            Some(raw) => raw
                .parse::<u8>()
                .ok()
                .filter(|level| *level <= MAX_LEVEL)
                .ok_or_else(|| {
                    ApiError::InvalidQuery(format!(
                        "precision must be an integer between 0 and {MAX_LEVEL}, got {raw:?}"
                    ))
                })?,
        };

        let filter = match self.id.as_deref() {
            None | Some("") => EntityFilter::all(),
            Some(raw) => raw
                .parse::<i64>()
                .map(EntityFilter::only)
                .map_err(|e| ApiError::InvalidQuery(format!("invalid id {raw:?}: {e}")))?,
        };

        Ok(CountsParams {
            dates,
            precision,
            filter,
        })
    }
}

fn parse_date(name: &str, raw: Option<&str>) -> Result<NaiveDate, ApiError> {
    let raw = raw
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::InvalidQuery(format!("{name} is required")))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| ApiError::InvalidQuery(format!("invalid {name} {raw:?}: {e}")))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// POST /v1/counts/{kind}
// ---------------------------------------------------------------------------

/// Count rows inside each polygon using the worker pool.
pub async fn count(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(query): Query<CountsQuery>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    run_counts(&state, &kind, &query, &body, ExecutionMode::Concurrent).await
}

/// Count rows inside each polygon on the serial baseline.
pub async fn count_serial(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(query): Query<CountsQuery>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    run_counts(&state, &kind, &query, &body, ExecutionMode::Serial).await
}

async fn run_counts(
    state: &AppState,
    kind: &str,
    query: &CountsQuery,
    body: &[u8],
    mode: ExecutionMode,
) -> Result<impl IntoResponse + use<>, ApiError> {
    let query_id = Uuid::now_v7();
    let span = tracing::info_span!("counts", %query_id, kind, ?mode);

    async move {
        let params = query.parse(state.geometry.default_precision)?;
        let kind: GeometryKind = kind.parse()?;
        let shapes = decode_geometry(kind, body)?;
        let plans = PolygonPlan::build(shapes, params.precision, state.coverer.as_ref())?;

        tracing::info!(
            polygons = plans.len(),
            ranges = plans.iter().map(|plan| plan.ranges.len()).sum::<usize>(),
            precision = params.precision,
            start = %params.dates.start,
            end = %params.dates.end,
            "Counting geometry"
        );

        let outcome = state
            .orchestrator
            .count(&plans, params.dates, params.filter, mode)
            .await;
        if !outcome.is_complete() {
            return Err(ApiError::Incomplete(outcome));
        }

        Ok::<_, ApiError>(([(QUERY_ID_HEADER, query_id.to_string())], Json(outcome.totals)))
    }
    .instrument(span)
    .await
}
