use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::TimeDelta;
use tokio::sync::mpsc;
use tokio::task::spawn_blocking;
use tracing::{debug, error, info};

use crate::decoder::RecordDecoder;
use crate::dedup::{Deduplicated, DuplicateFilter};
use crate::engine::errors::{PipelineError, StageError};
use crate::engine::memory::log_memory_usage;
use crate::engine::report::PipelineReport;
use crate::models::Transaction;
use crate::storage::Storage;
use crate::writer::BatchWriter;

/// Stages of a pipeline run, in the order they are entered.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PipelineState {
    Idle,
    Decoding,
    Deduplicating,
    Persisting,
    Done,
    Failed
}

impl fmt::Display for PipelineState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Decoding => "Decoding",
            Self::Deduplicating => "Deduplicating",
            Self::Persisting => "Persisting",
            Self::Done => "Done",
            Self::Failed => "Failed"
        };

        formatter.write_str(name)
    }
}

/// Tunables of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Transactions per storage batch.
    pub batch_size: usize,
    /// Maximum distance between two transactions judged to be the same event.
    pub window: TimeDelta,
    /// Transactions processed between two prunes of the duplicate window, `None` disables pruning.
    pub prune_interval: Option<usize>,
    /// Records decoded between two progress notifications.
    pub progress_interval: usize,
    /// Capacity of the channel between the decoder and the engine.
    pub backpressure: usize
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 5_000,
            window: TimeDelta::seconds(10),
            prune_interval: Some(10_000),
            progress_interval: 100_000,
            backpressure: 256
        }
    }
}

/// Runs the decode, deduplicate and persist stages over one input file.
///
/// Stages never overlap: duplicate detection needs the complete, ordered data set,
/// and persistence starts only once every survivor is known. The first failing stage
/// aborts the run, batches already written stay written.
pub struct DedupEngine<S: Storage> {
    storage: Arc<S>,
    config: PipelineConfig,
    state: PipelineState
}

struct StageFailure {
    source: StageError,
    processed: usize
}

impl<S: Storage> DedupEngine<S> {
    /// Creates a new engine writing into the provided storage.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            config: PipelineConfig::default(),
            state: PipelineState::Idle
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn with_window(mut self, window: TimeDelta) -> Self {
        self.config.window = window;
        self
    }

    pub fn with_prune_interval(mut self, prune_interval: Option<usize>) -> Self {
        self.config.prune_interval = prune_interval;
        self
    }

    pub fn with_backpressure(mut self, backpressure: usize) -> Self {
        self.config.backpressure = backpressure;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Processes the file at `path` end to end.
    ///
    /// # Errors
    /// Returns `PipelineError` wrapping the decode, persistence or task failure of the
    /// stage that was running.
    pub async fn run(&mut self, path: impl AsRef<Path>) -> Result<PipelineReport, PipelineError> {
        let path = path.as_ref().to_path_buf();
        let started = Instant::now();
        let mut report = PipelineReport::default();

        info!("Starting processing of file: {}", path.display());
        log_memory_usage("start");

        self.transition(PipelineState::Decoding);
        let stage_timer = Instant::now();

        let decoded = self.decode(path).await;
        let transactions = decoded.map_err(|failure| self.fail(failure, started))?;

        report.decoded = transactions.len();
        report.timings.decoding = stage_timer.elapsed();
        info!("Decoding finished in {:?}", report.timings.decoding);
        log_memory_usage("after decoding");

        self.transition(PipelineState::Deduplicating);
        let stage_timer = Instant::now();

        let filtered = self.deduplicate(transactions).await;
        let deduplicated = filtered
            .map_err(|source| self.fail(StageFailure { source, processed: report.decoded }, started))?;

        report.unique = deduplicated.unique.len();
        report.duplicates = deduplicated.duplicates.len();
        report.timings.deduplicating = stage_timer.elapsed();
        info!("Duplicate filtering finished in {:?}", report.timings.deduplicating);
        log_memory_usage("after deduplication");

        self.transition(PipelineState::Persisting);
        let stage_timer = Instant::now();

        let writer = BatchWriter::new(self.storage.clone()).with_batch_size(self.config.batch_size);
        let written = writer.write_all(deduplicated.unique).await;
        let summary = written
            .map_err(|error| {
                let processed = error.committed();
                self.fail(StageFailure { source: error.into(), processed }, started)
            })?;

        report.batches = summary.batches;
        report.timings.persisting = stage_timer.elapsed();
        info!("Persistence finished in {:?}", report.timings.persisting);
        log_memory_usage("after persistence");

        report.timings.total = started.elapsed();
        self.transition(PipelineState::Done);
        report.log();

        Ok(report)
    }

    async fn decode(&self, path: PathBuf) -> Result<Vec<Transaction>, StageFailure> {
        let (sender, mut receiver) = mpsc::channel::<Transaction>(self.config.backpressure.max(1));

        let decoder = RecordDecoder::new(path).with_progress_interval(self.config.progress_interval);
        let handle = spawn_blocking(move || {
            decoder.decode(|transaction| sender.blocking_send(transaction).is_ok())
        });

        let mut transactions = Vec::new();

        while let Some(transaction) = receiver.recv().await {
            transactions.push(transaction);
        }

        let processed = transactions.len();

        match handle.await {
            Ok(Ok(_)) => Ok(transactions),
            Ok(Err(error)) => Err(StageFailure { source: error.into(), processed }),
            Err(error) => Err(StageFailure { source: error.into(), processed })
        }
    }

    async fn deduplicate(&self, transactions: Vec<Transaction>) -> Result<Deduplicated, StageError> {
        let filter = DuplicateFilter::new()
            .with_window(self.config.window)
            .with_prune_interval(self.config.prune_interval);

        Ok(spawn_blocking(move || filter.filter(transactions)).await?)
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("Pipeline state [{}] -> [{}]", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, failure: StageFailure, started: Instant) -> PipelineError {
        let error = PipelineError {
            stage: self.state,
            elapsed: started.elapsed(),
            processed: failure.processed,
            source: failure.source
        };

        error!("{error}");
        self.transition(PipelineState::Failed);

        error
    }
}
