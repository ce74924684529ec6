use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinError;

use crate::decoder::DecodeError;
use crate::engine::PipelineState;
use crate::writer::PersistenceError;

#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("Stage task did not run to completion: {0}")]
    Task(#[from] JoinError)
}

/// A fatal pipeline failure along with where and when it happened.
#[derive(Debug, Error)]
#[error("Pipeline failed while [{stage}] after {elapsed:?} with [{processed}] transactions processed: {source}")]
pub struct PipelineError {
    /// Stage that was running when the failure happened.
    pub stage: PipelineState,
    /// Time since the run started.
    pub elapsed: Duration,
    /// Transactions decoded, or committed when persisting, before the failure.
    pub processed: usize,
    pub source: StageError
}
