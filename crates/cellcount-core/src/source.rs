//! Row sources.
//!
//! A row source answers one [`RangeQuery`] with a stream of per-cell partial
//! sums. The store-backed factory lives in `cellcount-db`; the
//! [`MemorySource`] here serves tests and the differential baseline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use cellcount_types::{CellRange, RangeQuery, Row};
use futures::StreamExt;
use futures::stream::{self, BoxStream};

/// Failure reported by a row source.
///
/// Connection loss, query failure, and constraint violations all surface as
/// [`SourceError::Query`]; rows that cannot be decoded as
/// [`SourceError::Decode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The store query failed.
    #[error("query failed: {0}")]
    Query(String),

    /// A returned row could not be decoded.
    #[error("row decode failed: {0}")]
    Decode(String),
}

/// Stream of rows for one range query.
pub type RowStream<'a> = BoxStream<'a, Result<Row, SourceError>>;

/// Opens a row stream per range query.
///
/// Implementations must tolerate concurrent `open` calls if polygons are
/// ever counted in parallel; a pooled store handle satisfies this.
pub trait RowSourceFactory: Send + Sync {
    /// Start the query and return its rows.
    ///
    /// Failures to issue the query are reported as the stream's first item.
    fn open(&self, query: RangeQuery) -> RowStream<'_>;
}

/// In-memory row source keyed by covering range.
///
/// Rows are returned as-is for the exact range they were registered under,
/// the way a store returns what it has for a scan. A registered failure
/// makes the stream yield an error after a given number of good rows.
#[derive(Debug, Default)]
pub struct MemorySource {
    rows: HashMap<CellRange, Vec<Row>>,
    failures: HashMap<CellRange, usize>,
    opened: AtomicUsize,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the rows returned for `range`.
    #[must_use]
    pub fn with_range(mut self, range: CellRange, rows: Vec<Row>) -> Self {
        self.rows.insert(range, rows);
        self
    }

    /// Make `range` fail after yielding `after` rows.
    #[must_use]
    pub fn with_failure(mut self, range: CellRange, after: usize) -> Self {
        self.failures.insert(range, after);
        self
    }

    /// Number of streams opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }
}

impl RowSourceFactory for MemorySource {
    fn open(&self, query: RangeQuery) -> RowStream<'_> {
        self.opened.fetch_add(1, Ordering::Relaxed);
        let rows = self.rows.get(&query.range).map_or(&[][..], Vec::as_slice);

        match self.failures.get(&query.range) {
            Some(&after) => {
                let failure = SourceError::Decode(format!(
                    "injected failure after {after} rows for range {}..={}",
                    query.range.min, query.range.max
                ));
                stream::iter(rows.iter().take(after).copied().map(Ok))
                    .chain(stream::once(async move { Err(failure) }))
                    .boxed()
            }
            None => stream::iter(rows.iter().copied().map(Ok)).boxed(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cellcount_types::{CellId, DateRange, EntityFilter};
    use chrono::NaiveDate;
    use futures::TryStreamExt;

    use super::*;

    fn query(min: u64, max: u64) -> RangeQuery {
        let day = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        RangeQuery {
            range: CellRange { min: CellId(min), max: CellId(max) },
            dates: DateRange::new(day, day).unwrap(),
            filter: EntityFilter::all(),
        }
    }

    #[tokio::test]
    async fn returns_registered_rows_in_order() {
        let q = query(10, 50);
        let source = MemorySource::new().with_range(q.range, vec![Row::new(5, 12), Row::new(7, 40)]);
        let rows: Vec<Row> = source.open(q).try_collect().await.unwrap();
        assert_eq!(rows, vec![Row::new(5, 12), Row::new(7, 40)]);
        assert_eq!(source.opened(), 1);
    }

    #[tokio::test]
    async fn unknown_range_is_empty() {
        let source = MemorySource::new();
        let rows: Vec<Row> = source.open(query(1, 2)).try_collect().await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn failure_follows_good_rows() {
        let q = query(10, 50);
        let source = MemorySource::new()
            .with_range(q.range, vec![Row::new(1, 11), Row::new(2, 12), Row::new(3, 13), Row::new(4, 14)])
            .with_failure(q.range, 3);
        let items: Vec<Result<Row, SourceError>> = source.open(q).collect().await;
        assert_eq!(items.len(), 4);
        assert!(items.iter().take(3).all(Result::is_ok));
        assert!(matches!(items.last(), Some(Err(SourceError::Decode(_)))));
    }
}
