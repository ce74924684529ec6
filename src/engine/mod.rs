mod dedup_engine;
mod errors;
mod memory;
mod report;

pub use dedup_engine::{DedupEngine, PipelineConfig, PipelineState};
pub use errors::{PipelineError, StageError};
pub use report::{PipelineReport, StageTimings};
