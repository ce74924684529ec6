use std::collections::{HashMap, HashSet};

use chrono::Timelike;
use rust_decimal::Decimal;

use crate::models::Transaction;

/// Lower bounds of the value ranges, the last range is open-ended.
const VALUE_RANGES: [i64; 7] = [0, 500, 1_000, 2_000, 3_000, 4_000, 5_000];
const FREQUENT_PAYER_THRESHOLD: usize = 5;
const TOP_RESULTS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ValueBucket {
    pub range: String,
    pub count: usize,
    pub percentage: f64
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourBucket {
    pub hour: u32,
    pub count: usize,
    pub percentage: f64
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneralStats {
    pub total_transactions: usize,
    pub average_value: Decimal,
    pub min_value: Decimal,
    pub max_value: Decimal,
    /// Sum of every value, `None` when it does not fit in a `Decimal`.
    pub total_value: Option<Decimal>,
    pub unique_payers: usize,
    pub unique_payees: usize
}

#[derive(Debug, Clone, Default)]
pub struct UnusualPatterns {
    /// Payers with more than five transactions, busiest first.
    pub frequent_payers: Vec<(String, usize)>,
    /// Transactions above `high_value_threshold`, largest first.
    pub high_value_transactions: Vec<Transaction>,
    pub average_value: Decimal,
    /// Twice the average value, `None` when no value can exceed it.
    pub high_value_threshold: Option<Decimal>
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }

    count as f64 * 100.0 / total as f64
}

/// Counts transactions per value range. Negative values fall outside every range.
pub fn value_distribution(transactions: &[Transaction]) -> Vec<ValueBucket> {
    let total = transactions.len();

    VALUE_RANGES.iter().enumerate()
        .map(|(index, lower)| {
            let lower_bound = Decimal::from(*lower);
            let upper_bound = VALUE_RANGES.get(index + 1).map(|upper| Decimal::from(*upper));

            let count = transactions.iter()
                .filter(|transaction| transaction.value >= lower_bound)
                .filter(|transaction| upper_bound.is_none_or(|upper| transaction.value < upper))
                .count();

            let range = match upper_bound {
                Some(upper) => format!("{lower_bound} - {upper}"),
                None => format!("{lower_bound} - above")
            };

            ValueBucket { range, count, percentage: percentage(count, total) }
        })
        .collect()
}

/// Counts transactions per hour of the day, in UTC.
pub fn hourly_distribution(transactions: &[Transaction]) -> Vec<HourBucket> {
    let total = transactions.len();
    let mut counts = [0usize; 24];

    for transaction in transactions {
        counts[transaction.timestamp.hour() as usize] += 1;
    }

    counts.iter().enumerate()
        .map(|(hour, count)| HourBucket {
            hour: hour as u32,
            count: *count,
            percentage: percentage(*count, total)
        })
        .collect()
}

pub fn general_stats(transactions: &[Transaction]) -> GeneralStats {
    let Some(first) = transactions.first() else {
        return GeneralStats {
            total_value: Some(Decimal::ZERO),
            ..GeneralStats::default()
        };
    };

    let mut stats = GeneralStats {
        total_transactions: transactions.len(),
        min_value: first.value,
        max_value: first.value,
        ..GeneralStats::default()
    };

    let mut payers = HashSet::new();
    let mut payees = HashSet::new();

    for transaction in transactions {
        stats.min_value = stats.min_value.min(transaction.value);
        stats.max_value = stats.max_value.max(transaction.value);
        payers.insert(transaction.payer.as_str());
        payees.insert(transaction.payee.as_str());
    }

    let count = Decimal::from(transactions.len());

    stats.total_value = transactions.iter()
        .try_fold(Decimal::ZERO, |total, transaction| total.checked_add(transaction.value));

    //NOTE: each share is bounded by the largest value, so the fallback sum cannot overflow
    stats.average_value = match stats.total_value {
        Some(total) => total / count,
        None => transactions.iter()
            .fold(Decimal::ZERO, |average, transaction| average.saturating_add(transaction.value / count))
    };

    stats.unique_payers = payers.len();
    stats.unique_payees = payees.len();

    stats
}

/// Flags busy payers and transactions worth more than twice the average value.
pub fn unusual_patterns(transactions: &[Transaction]) -> UnusualPatterns {
    let average_value = general_stats(transactions).average_value;
    let high_value_threshold = average_value.checked_mul(Decimal::from(2));

    let mut per_payer: HashMap<&str, usize> = HashMap::new();

    for transaction in transactions {
        *per_payer.entry(transaction.payer.as_str()).or_default() += 1;
    }

    let mut frequent_payers: Vec<(String, usize)> = per_payer.into_iter()
        .filter(|(_, count)| *count > FREQUENT_PAYER_THRESHOLD)
        .map(|(payer, count)| (payer.to_string(), count))
        .collect();

    frequent_payers.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));
    frequent_payers.truncate(TOP_RESULTS);

    let mut high_value_transactions: Vec<Transaction> = transactions.iter()
        .filter(|transaction| high_value_threshold.is_some_and(|threshold| transaction.value > threshold))
        .cloned()
        .collect();

    high_value_transactions.sort_by(|left, right| right.value.cmp(&left.value).then_with(|| left.id.cmp(&right.id)));
    high_value_transactions.truncate(TOP_RESULTS);

    UnusualPatterns {
        frequent_payers,
        high_value_transactions,
        average_value,
        high_value_threshold
    }
}

