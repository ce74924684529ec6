use std::time::Duration;

use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    pub decoding: Duration,
    pub deduplicating: Duration,
    pub persisting: Duration,
    pub total: Duration
}

impl StageTimings {
    /// Share of the total run spent in `stage`, as a percentage.
    pub fn share(&self, stage: Duration) -> f64 {
        let total = self.total.as_secs_f64();

        if total == 0.0 {
            return 0.0;
        }

        stage.as_secs_f64() * 100.0 / total
    }
}

/// Counters and timings of a completed run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineReport {
    pub decoded: usize,
    pub unique: usize,
    pub duplicates: usize,
    pub batches: usize,
    pub timings: StageTimings
}

impl PipelineReport {
    pub fn duplicate_rate(&self) -> f64 {
        if self.decoded == 0 {
            return 0.0;
        }

        self.duplicates as f64 * 100.0 / self.decoded as f64
    }

    pub fn log(&self) {
        let timings = &self.timings;

        info!("Processing complete in {:?}", timings.total);
        info!("Transactions decoded: [{}]", self.decoded);
        info!("Unique transactions: [{}]", self.unique);
        info!("Duplicate transactions: [{}] ({:.2}%)", self.duplicates, self.duplicate_rate());
        info!("Batches written: [{}]", self.batches);
        info!("- Decoding: {:?} ({:.2}%)", timings.decoding, timings.share(timings.decoding));
        info!("- Deduplicating: {:?} ({:.2}%)", timings.deduplicating, timings.share(timings.deduplicating));
        info!("- Persisting: {:?} ({:.2}%)", timings.persisting, timings.share(timings.persisting));
    }
}
