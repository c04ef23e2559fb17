//! Range-scan row source over the `data` table.
//!
//! One parameterized statement answers every [`RangeQuery`]: counters are
//! filtered by entity, inclusive day range and inclusive cell range, then
//! summed per cell. Cell identifiers and sums are `NUMERIC` in the store
//! (cell ids exceed `BIGINT`), so both are decoded through [`Decimal`].

use std::time::Instant;

use cellcount_core::{RowSourceFactory, RowStream, SourceError};
use cellcount_types::{RangeQuery, Row};
use futures::StreamExt;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::PgPool;

use crate::error::DbError;
use crate::postgres::PostgresPool;

/// The range-scan statement.
///
/// `$1` is the optional entity id; `NULL` selects every entity.
const RANGE_SCAN_SQL: &str = "SELECT SUM(count) AS total, s2cellid \
     FROM data \
     WHERE ($1::BIGINT IS NULL OR id = $1) \
       AND daterange($2, $3, '[]') @> day \
       AND numrange($4, $5, '[]') @> s2cellid \
     GROUP BY s2cellid";

/// One grouped row of the range scan.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CountRow {
    /// Sum of `count` over the matched days; `NULL` when every count was.
    pub total: Option<Decimal>,
    /// Leaf cell identifier.
    pub s2cellid: Decimal,
}

impl CountRow {
    /// Convert into a pipeline [`Row`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] if either value is negative, fractional
    /// or wider than 64 bits.
    pub fn into_row(self) -> Result<Row, DbError> {
        let value = self.total.map_or(Ok(0), |total| to_u64(total, "total"))?;
        let cell = to_u64(self.s2cellid, "s2cellid")?;
        Ok(Row::new(value, cell))
    }
}

fn to_u64(value: Decimal, column: &str) -> Result<u64, DbError> {
    if !value.fract().is_zero() {
        return Err(DbError::Decode(format!("{column} is not integral: {value}")));
    }
    value
        .to_u64()
        .ok_or_else(|| DbError::Decode(format!("{column} does not fit u64: {value}")))
}

/// Row source factory backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct CountStore {
    pool: PgPool,
}

impl CountStore {
    /// Create a store sharing the given pool.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool().clone(),
        }
    }
}

impl RowSourceFactory for CountStore {
    fn open(&self, query: RangeQuery) -> RowStream<'_> {
        let started = Instant::now();
        tracing::debug!(
            min = %query.range.min,
            max = %query.range.max,
            start = %query.dates.start,
            end = %query.dates.end,
            entity = ?query.filter.entity(),
            "Opening range scan"
        );

        sqlx::query_as::<_, CountRow>(RANGE_SCAN_SQL)
            .bind(query.filter.entity())
            .bind(query.dates.start)
            .bind(query.dates.end)
            .bind(Decimal::from(query.range.min.into_inner()))
            .bind(Decimal::from(query.range.max.into_inner()))
            .fetch(&self.pool)
            .map(move |item| {
                item.map_err(DbError::from)
                    .and_then(CountRow::into_row)
                    .map_err(|e| {
                        tracing::warn!(
                            error = %e,
                            elapsed_ms = started.elapsed().as_millis(),
                            "Range scan failed"
                        );
                        SourceError::from(e)
                    })
            })
            .boxed()
    }
}
