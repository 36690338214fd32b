//! Batch execution: bounded parallel conversion with ordered aggregation.
//!
//! Files are converted on the blocking thread pool, at most `workers` at a
//! time. Results are consumed in submission order, so the event sequence and
//! the final [`BatchStats`] do not depend on the worker count.
//!
//! Cancellation is cooperative: the [`CancelFlag`] is checked right before a
//! file is started. Files already in flight when the flag is raised run to
//! completion and are counted; files never started are reported in
//! [`BatchStats::not_started`].

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{future, stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{BatchError, PipelineError};
use crate::types::{BatchStats, ConversionOutcome, ConversionReport, InputFile};

use super::channel::bounded_channel;
use super::processor::ConversionPipeline;

/// Shared flag used to stop a batch between files.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the batch to stop starting new files.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Lifecycle of one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchState {
    /// Not started
    Idle,
    /// File `index` (1-based) of `total` has been processed
    Processing { index: usize, total: usize },
    /// Run finished (possibly cancelled)
    Completed(BatchStats),
}

/// Progress notification emitted by [`BatchRunner`].
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// One file finished; `stats` are the running totals including it
    Processed {
        total: usize,
        report: ConversionReport,
        stats: BatchStats,
    },
    /// The run is over
    Completed(BatchStats),
}

impl BatchEvent {
    /// The state the runner is in once this event has been emitted.
    pub fn state(&self) -> BatchState {
        match self {
            BatchEvent::Processed { total, report, .. } => BatchState::Processing {
                index: report.index,
                total: *total,
            },
            BatchEvent::Completed(stats) => BatchState::Completed(stats.clone()),
        }
    }
}

/// A batch running on a background task.
pub struct BatchHandle {
    /// Per-file events followed by one `Completed` event
    pub events: mpsc::Receiver<BatchEvent>,
    task: JoinHandle<Result<BatchStats, BatchError>>,
}

impl BatchHandle {
    /// Wait for the batch to finish.
    ///
    /// The runner waits on `events` when its buffer is full, so drain the
    /// receiver (or drop it) before awaiting this.
    pub async fn join(self) -> Result<BatchStats, BatchError> {
        self.task
            .await
            .map_err(|e| BatchError::Aborted(e.to_string()))?
    }
}

/// Runs a [`ConversionPipeline`] over a list of files.
pub struct BatchRunner {
    pipeline: Arc<ConversionPipeline>,
    workers: usize,
    buffer_size: usize,
}

impl BatchRunner {
    /// Create a runner using the configured worker count and buffer size.
    pub fn new(pipeline: Arc<ConversionPipeline>, config: &Config) -> Self {
        Self {
            pipeline,
            workers: config.processing.parallel_workers.max(1),
            buffer_size: config.pipeline.buffer_size.max(1),
        }
    }

    /// Override the number of files converted concurrently.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process every file, calling `on_event` after each one and once more at
    /// the end.
    ///
    /// The only error is a fatal output directory problem, detected before any
    /// file is touched; in that case `on_event` is never called and nothing is
    /// logged, leaving the report to the caller.
    pub async fn run<F, Fut>(
        &self,
        files: Vec<InputFile>,
        cancel: &CancelFlag,
        mut on_event: F,
    ) -> Result<BatchStats, BatchError>
    where
        F: FnMut(BatchEvent) -> Fut,
        Fut: Future<Output = ()>,
    {
        self.pipeline.output().prepare()?;

        let total = files.len();
        let mut stats = BatchStats::default();
        let mut state = BatchState::Idle;
        tracing::trace!("Batch state: {:?}", state);
        tracing::info!(
            "Processing {} file(s) with {} worker(s) into {:?}",
            total,
            self.workers,
            self.pipeline.output().path()
        );

        let flag = cancel.clone();
        let pipeline = self.pipeline.clone();
        let mut reports = stream::iter(files.into_iter().enumerate())
            .take_while(move |_| future::ready(!flag.is_cancelled()))
            .map(move |(i, file)| {
                let pipeline = pipeline.clone();
                convert_on_worker(i + 1, file, move |file| pipeline.convert(file))
            })
            .buffered(self.workers);

        while let Some(report) = reports.next().await {
            stats.record(&report.outcome);
            let event = BatchEvent::Processed {
                total,
                report,
                stats: stats.clone(),
            };
            state = event.state();
            tracing::trace!("Batch state: {:?}", state);
            on_event(event).await;
        }

        stats.not_started = (total as u64).saturating_sub(stats.total);
        if stats.was_cancelled() {
            tracing::warn!(
                "Batch cancelled: {} of {} file(s) not started",
                stats.not_started,
                total
            );
        }
        debug_assert!(stats.is_consistent());

        tracing::info!(
            total = stats.total,
            succeeded = stats.succeeded,
            skipped = stats.skipped,
            failed = stats.failed,
            bytes_saved = stats.total_bytes_saved,
            "Success: {}/{}, Removed: {:.1} KB",
            stats.succeeded,
            stats.total,
            stats.saved_kb()
        );

        let done = BatchEvent::Completed(stats.clone());
        state = done.state();
        tracing::trace!("Batch state: {:?}", state);
        on_event(done).await;

        Ok(stats)
    }

    /// Run the batch on a background task, delivering events over a bounded
    /// channel.
    pub fn spawn(self: Arc<Self>, files: Vec<InputFile>, cancel: CancelFlag) -> BatchHandle {
        let (tx, rx) = bounded_channel(&crate::config::PipelineConfig {
            buffer_size: self.buffer_size,
        });

        let task = tokio::spawn(async move {
            self.run(files, &cancel, |event| {
                let tx = tx.clone();
                async move {
                    // A dropped receiver only means nobody is watching
                    let _ = tx.send(event).await;
                }
            })
            .await
        });

        BatchHandle { events: rx, task }
    }
}

/// Convert one file on the blocking pool. Never fails: a crashed worker is
/// reported as an encode failure.
async fn convert_on_worker<F>(index: usize, file: InputFile, convert: F) -> ConversionReport
where
    F: FnOnce(&InputFile) -> ConversionOutcome + Send + 'static,
{
    let path = file.path.clone();
    let worker = tokio::task::spawn_blocking(move || {
        let outcome = convert(&file);
        (file, outcome)
    });

    match worker.await {
        Ok((file, outcome)) => ConversionReport {
            index,
            file,
            outcome,
        },
        Err(e) => {
            let err = PipelineError::Worker {
                path: path.clone(),
                message: e.to_string(),
            };
            tracing::error!(
                file = %path.display(),
                outcome = "failed",
                "Failed to convert {}: {}",
                path.display(),
                err
            );
            ConversionReport {
                index,
                file: InputFile::new(path),
                outcome: ConversionOutcome::Failed {
                    kind: err.kind(),
                    error: err.to_string(),
                },
            }
        }
    }
}
