use std::collections::HashMap;

use chrono::TimeDelta;
use tracing::{debug, info};

use crate::models::{DuplicateKey, Transaction};
use crate::types::Timestamp;

const DEFAULT_WINDOW_SECONDS: i64 = 10;
const DEFAULT_PRUNE_INTERVAL: usize = 10_000;
const PROGRESS_INTERVAL: usize = 100_000;

/// Timestamps of the kept transactions for each key, in the order they were kept.
type Window<'a> = HashMap<DuplicateKey<'a>, Vec<Timestamp>>;

/// Result of a filtering pass, both sides ordered by ascending timestamp.
#[derive(Debug, Default)]
pub struct Deduplicated {
    pub unique: Vec<Transaction>,
    pub duplicates: Vec<Transaction>
}

/// Removes transactions that repeat the value, payer and payee of an earlier kept
/// transaction within a time window.
///
/// Transactions are processed in timestamp order (ties keep their input order), so
/// the earliest transaction of a burst is the one that survives. The cost is linear in
/// practice, the worst case is `O(n * k)` where `k` is the largest number of kept
/// transactions sharing a key inside one window.
#[derive(Debug, Clone)]
pub struct DuplicateFilter {
    window: TimeDelta,
    prune_interval: Option<usize>
}

impl Default for DuplicateFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl DuplicateFilter {
    pub fn new() -> Self {
        Self {
            window: TimeDelta::seconds(DEFAULT_WINDOW_SECONDS),
            prune_interval: Some(DEFAULT_PRUNE_INTERVAL)
        }
    }

    /// Sets the maximum distance between two transactions judged to be the same event.
    pub fn with_window(mut self, window: TimeDelta) -> Self {
        self.window = window.abs();
        self
    }

    /// Sets how many transactions are processed between two prunes of the window.
    /// `None` disables pruning. Classification does not depend on this value.
    pub fn with_prune_interval(mut self, prune_interval: Option<usize>) -> Self {
        self.prune_interval = prune_interval.map(|interval| interval.max(1));
        self
    }

    pub fn window(&self) -> TimeDelta {
        self.window
    }

    /// Splits `transactions` into unique and duplicate transactions.
    pub fn filter(&self, mut transactions: Vec<Transaction>) -> Deduplicated {
        info!("Starting duplicate detection on [{}] transactions", transactions.len());

        //NOTE: sort_by_key is stable, equal timestamps keep their input order
        transactions.sort_by_key(|transaction| transaction.timestamp);

        let keep = self.classify(&transactions);

        let mut result = Deduplicated {
            unique: Vec::with_capacity(transactions.len()),
            duplicates: Vec::new()
        };

        for (transaction, is_unique) in transactions.into_iter().zip(keep) {
            if is_unique {
                result.unique.push(transaction);
            } else {
                result.duplicates.push(transaction);
            }
        }

        info!(
            "Duplicate detection complete, [{}] unique and [{}] duplicate transactions",
            result.unique.len(),
            result.duplicates.len()
        );

        result
    }

    /// Returns, for each transaction of the sorted slice, whether it is kept.
    fn classify(&self, sorted: &[Transaction]) -> Vec<bool> {
        let mut window: Window<'_> = HashMap::new();
        let mut keep = Vec::with_capacity(sorted.len());

        for (index, transaction) in sorted.iter().enumerate() {
            let processed = index + 1;
            let seen = window.entry(transaction.duplicate_key()).or_default();

            let is_duplicate = seen.iter()
                .any(|timestamp| (transaction.timestamp - *timestamp).abs() <= self.window);

            if !is_duplicate {
                seen.push(transaction.timestamp);
            }

            keep.push(!is_duplicate);

            if self.prune_interval.is_some_and(|interval| processed % interval == 0) {
                prune_window(&mut window, transaction.timestamp - self.window);
            }

            if processed % PROGRESS_INTERVAL == 0 {
                debug!("Processed [{processed}] transactions for duplicate detection...");
            }
        }

        keep
    }
}

/// Drops every timestamp older than `cutoff` and every key left without timestamps.
///
/// Later transactions are never earlier than the one that defined `cutoff`, so the
/// dropped timestamps can no longer fall inside their window.
fn prune_window(window: &mut Window<'_>, cutoff: Timestamp) {
    window.retain(|_, timestamps| {
        timestamps.retain(|timestamp| *timestamp >= cutoff);
        !timestamps.is_empty()
    });
}
