//! The containment-aggregation pipeline.
//!
//! One run drains the row stream of a single covering range through a
//! bounded queue into a fixed pool of worker tasks. Each worker tests the
//! row's cell against the polygon and atomically adds matching values to a
//! shared total.
//!
//! Completion is a close-and-join barrier, never a counter poll:
//!
//! 1. the producer forwards every row, then drops the sender (closing the
//!    queue);
//! 2. each worker drains the queue until it observes closure and emptiness;
//! 3. the run joins all workers before reading the total.
//!
//! On a source error the producer stops, the queue is closed, queued rows are
//! drained, workers are joined, and the error replaces the total.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use cellcount_geo::ContainmentTester;
use cellcount_types::Row;
use futures::StreamExt;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::source::{RowStream, SourceError};

/// Default queue capacity: roughly one store batch.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Worker pool and queue sizing for a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Number of worker tasks started per run.
    pub workers: usize,
    /// Capacity of the bounded row queue.
    pub queue_capacity: usize,
    /// Optional limit on the wall-clock time of one run.
    pub deadline: Option<Duration>,
}

impl PipelineConfig {
    /// Reject configurations that could never make progress.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.workers == 0 {
            return Err(PipelineError::Config("workers must be at least 1".to_owned()));
        }
        if self.queue_capacity == 0 {
            return Err(PipelineError::Config(
                "queue_capacity must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// Set the number of workers.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the queue capacity.
    #[must_use]
    pub const fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the per-run deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: available_workers(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            deadline: None,
        }
    }
}

/// Number of available processing units, at least one.
pub fn available_workers() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Outcome of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aggregate {
    /// Sum of `value` over rows whose cell lies inside the polygon.
    pub total: u64,
    /// Rows consumed from the source.
    pub rows: u64,
    /// Rows whose cell lay inside the polygon.
    pub matched: u64,
}

/// State shared by the workers of one run.
#[derive(Debug, Default)]
struct Counters {
    total: AtomicU64,
    matched: AtomicU64,
    processed: AtomicU64,
    overflowed: AtomicBool,
}

/// Bounded fan-out/fan-in aggregation over a row stream.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline, validating its configuration.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The pipeline's configuration.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Sum the values of contained rows using the worker pool.
    ///
    /// Blocks until every enqueued row has been processed and all workers
    /// have exited. On expiry of the configured deadline the queue is closed,
    /// the workers are aborted and joined, and no total is returned.
    pub async fn run(
        &self,
        rows: RowStream<'_>,
        tester: Arc<ContainmentTester>,
    ) -> Result<Aggregate, PipelineError> {
        let started = Instant::now();
        let counters = Arc::new(Counters::default());
        let (tx, rx) = mpsc::channel::<Row>(self.config.queue_capacity);
        let queue = Arc::new(Mutex::new(rx));

        let mut workers = JoinSet::new();
        for _ in 0..self.config.workers {
            workers.spawn(work(
                Arc::clone(&queue),
                Arc::clone(&tester),
                Arc::clone(&counters),
            ));
        }
        // Only workers may hold the receiver, so a dead pool closes the queue
        // instead of leaving the producer parked on a full channel.
        drop(queue);

        let produced = match self.config.deadline {
            Some(deadline) => {
                if let Ok(outcome) =
                    tokio::time::timeout(deadline, drive(rows, tx, &mut workers)).await
                {
                    outcome
                } else {
                    workers.shutdown().await;
                    warn!(
                        deadline_ms = deadline.as_millis(),
                        processed = counters.processed.load(Ordering::Relaxed),
                        "Aggregation deadline exceeded"
                    );
                    return Err(PipelineError::DeadlineExceeded(deadline));
                }
            }
            None => drive(rows, tx, &mut workers).await,
        }?;

        // Every worker has been joined, so their writes are visible here.
        if counters.overflowed.load(Ordering::Relaxed) {
            warn!(workers = self.config.workers, "Range total overflowed u64");
            return Err(PipelineError::Overflow);
        }
        let aggregate = Aggregate {
            total: counters.total.load(Ordering::Relaxed),
            rows: counters.processed.load(Ordering::Relaxed),
            matched: counters.matched.load(Ordering::Relaxed),
        };
        if aggregate.rows != produced {
            return Err(PipelineError::Incomplete {
                produced,
                processed: aggregate.rows,
            });
        }

        debug!(
            workers = self.config.workers,
            rows = aggregate.rows,
            matched = aggregate.matched,
            total = aggregate.total,
            elapsed_ms = started.elapsed().as_millis(),
            "Range aggregated"
        );
        Ok(aggregate)
    }

    /// Sum the values of contained rows on the calling task.
    ///
    /// The single-worker degenerate case with no queue; used as the
    /// differential baseline for [`Pipeline::run`] and by the serial
    /// endpoint. Honors the configured deadline.
    pub async fn run_serial(
        &self,
        rows: RowStream<'_>,
        tester: &ContainmentTester,
    ) -> Result<Aggregate, PipelineError> {
        match self.config.deadline {
            Some(deadline) => tokio::time::timeout(deadline, consume(rows, tester))
                .await
                .map_err(|_elapsed| PipelineError::DeadlineExceeded(deadline))?,
            None => consume(rows, tester).await,
        }
    }
}

/// Produce every row, close the queue, then join the pool.
///
/// Returns the number of rows enqueued. A source error is reported only
/// after the workers have been joined.
async fn drive(
    rows: RowStream<'_>,
    tx: mpsc::Sender<Row>,
    workers: &mut JoinSet<()>,
) -> Result<u64, PipelineError> {
    let produced = produce(rows, tx).await;
    join_all(workers).await?;
    produced.map_err(|(enqueued, e)| {
        warn!(enqueued, error = %e, "Row source failed, discarding partial total");
        PipelineError::Source(e)
    })
}

/// Forward rows onto the queue in source order.
///
/// Consumes the sender, so the queue is closed on every exit path.
async fn produce(
    mut rows: RowStream<'_>,
    tx: mpsc::Sender<Row>,
) -> Result<u64, (u64, SourceError)> {
    let mut enqueued: u64 = 0;
    while let Some(item) = rows.next().await {
        let row = item.map_err(|e| (enqueued, e))?;
        if tx.send(row).await.is_err() {
            // Every worker is gone; join_all reports why.
            break;
        }
        enqueued = enqueued.saturating_add(1);
    }
    Ok(enqueued)
}

/// Wait for every worker to exit.
async fn join_all(workers: &mut JoinSet<()>) -> Result<(), PipelineError> {
    let mut failure = None;
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            failure.get_or_insert_with(|| PipelineError::Worker(e.to_string()));
        }
    }
    failure.map_or(Ok(()), Err)
}

/// Worker loop: drain the queue until it is closed and empty.
async fn work(
    queue: Arc<Mutex<mpsc::Receiver<Row>>>,
    tester: Arc<ContainmentTester>,
    counters: Arc<Counters>,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(row) = next else {
            break;
        };
        if tester.contains(row.cell_id) {
            let added = counters
                .total
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |t| {
                    t.checked_add(row.value)
                });
            if added.is_err() {
                counters.overflowed.store(true, Ordering::Relaxed);
            }
            counters.matched.fetch_add(1, Ordering::Relaxed);
        }
        counters.processed.fetch_add(1, Ordering::Relaxed);
    }
}

async fn consume(
    mut rows: RowStream<'_>,
    tester: &ContainmentTester,
) -> Result<Aggregate, PipelineError> {
    let mut aggregate = Aggregate::default();
    while let Some(item) = rows.next().await {
        let row = item?;
        aggregate.rows = aggregate.rows.saturating_add(1);
        if tester.contains(row.cell_id) {
            aggregate.total = aggregate
                .total
                .checked_add(row.value)
                .ok_or(PipelineError::Overflow)?;
            aggregate.matched = aggregate.matched.saturating_add(1);
        }
    }
    Ok(aggregate)
}
