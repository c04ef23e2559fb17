//! Error types for the aggregation pipeline and the orchestrator.

use std::time::Duration;

use crate::source::SourceError;

/// Errors from a single pipeline run (one covering range).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The row source failed mid-stream; the partial total was discarded.
    #[error("row source failed: {0}")]
    Source(#[from] SourceError),

    /// The caller-supplied deadline expired before every row was processed.
    #[error("aggregation exceeded deadline of {}ms", .0.as_millis())]
    DeadlineExceeded(Duration),

    /// A worker task panicked or was cancelled.
    #[error("worker failed: {0}")]
    Worker(String),

    /// Fewer rows were processed than were enqueued.
    #[error("pipeline lost rows: {produced} enqueued, {processed} processed")]
    Incomplete {
        /// Rows pushed onto the queue.
        produced: u64,
        /// Rows accounted for by workers.
        processed: u64,
    },

    /// The sum no longer fits in 64 bits.
    #[error("total overflowed u64")]
    Overflow,

    /// The pipeline configuration is unusable.
    #[error("invalid pipeline config: {0}")]
    Config(String),
}

/// Error reported for one polygon of the input geometry.
#[derive(Debug, thiserror::Error)]
pub enum CountError {
    /// A covering range of the polygon failed; no total was produced.
    #[error("no total produced for geometry index {index}: {source}")]
    Polygon {
        /// Position of the polygon in the input.
        index: usize,
        /// The failure of the range that aborted the polygon.
        source: PipelineError,
    },

    /// Summing the polygon's range totals overflowed.
    #[error("no total produced for geometry index {index}: total overflowed u64")]
    Overflow {
        /// Position of the polygon in the input.
        index: usize,
    },
}

impl CountError {
    /// Index of the polygon that failed.
    pub const fn index(&self) -> usize {
        match self {
            Self::Polygon { index, .. } | Self::Overflow { index } => *index,
        }
    }

    /// Whether the failure is a deadline expiry.
    pub const fn is_deadline(&self) -> bool {
        matches!(
            self,
            Self::Polygon {
                source: PipelineError::DeadlineExceeded(_),
                ..
            }
        )
    }
}
