use super::DuplicateFilter;

use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{TimeDelta, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::models::Transaction;
use crate::types::{Timestamp, TransactionId};

fn base_time() -> Result<Timestamp> {
    Utc.with_ymd_and_hms(2023, 1, 1, 10, 0, 0).single().ok_or_else(|| anyhow!("invalid base time"))
}

fn create_transaction(id: TransactionId, value: &str, payer: &str, payee: &str, offset_millis: i64) -> Result<Transaction> {
    Ok(Transaction {
        id,
        value: Decimal::from_str(value)?,
        payer: payer.to_string(),
        payee: payee.to_string(),
        timestamp: base_time()? + TimeDelta::milliseconds(offset_millis)
    })
}

fn ids(transactions: &[Transaction]) -> Vec<TransactionId> {
    transactions.iter().map(|transaction| transaction.id).collect()
}

/// Quadratic restatement of the rule, used to cross-check the windowed implementation.
fn reference_unique_ids(transactions: &[Transaction], window: TimeDelta) -> Vec<TransactionId> {
    let mut sorted = transactions.to_vec();
    sorted.sort_by_key(|transaction| transaction.timestamp);

    let mut kept: Vec<Transaction> = Vec::new();

    for transaction in sorted {
        let is_duplicate = kept.iter().any(|previous| {
            previous.duplicate_key() == transaction.duplicate_key()
                && (transaction.timestamp - previous.timestamp).abs() <= window
        });

        if !is_duplicate {
            kept.push(transaction);
        }
    }

    ids(&kept)
}

fn random_transactions(seed: u64, count: usize) -> Result<Vec<Transaction>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut transactions = Vec::with_capacity(count);

    for id in 0..count as TransactionId {
        let value = format!("{}.{:02}", rng.gen_range(1..4), rng.gen_range(0..2) * 50);
        let payer = format!("payer{}", rng.gen_range(0..3));
        let payee = format!("payee{}", rng.gen_range(0..3));
        let offset = rng.gen_range(0..600_000);

        transactions.push(create_transaction(id, &value, &payer, &payee, offset)?);
    }

    Ok(transactions)
}

#[test]
fn test_same_key_five_seconds_apart_keeps_the_earlier() -> Result<()> {
    let transactions = vec![
        create_transaction(2, "100.0", "12345", "67890", 5_000)?,
        create_transaction(1, "100.0", "12345", "67890", 0)?,
    ];

    let result = DuplicateFilter::new().filter(transactions);

    assert_eq!(ids(&result.unique), vec![1]);
    assert_eq!(ids(&result.duplicates), vec![2]);

    Ok(())
}

#[test]
fn test_same_key_fifteen_seconds_apart_keeps_both() -> Result<()> {
    let transactions = vec![
        create_transaction(1, "100.0", "12345", "67890", 0)?,
        create_transaction(2, "100.0", "12345", "67890", 15_000)?,
    ];

    let result = DuplicateFilter::new().filter(transactions);

    assert_eq!(ids(&result.unique), vec![1, 2]);
    assert!(result.duplicates.is_empty());

    Ok(())
}

#[test]
fn test_window_boundary_is_inclusive() -> Result<()> {
    let transactions = vec![
        create_transaction(1, "100.0", "a", "b", 0)?,
        create_transaction(2, "100.0", "a", "b", 10_000)?,
        create_transaction(3, "100.0", "a", "b", 20_001)?,
    ];

    let result = DuplicateFilter::new().filter(transactions);

    assert_eq!(ids(&result.unique), vec![1, 3]);
    assert_eq!(ids(&result.duplicates), vec![2]);

    Ok(())
}

#[test]
fn test_different_parties_or_value_are_never_duplicates() -> Result<()> {
    let transactions = vec![
        create_transaction(1, "100.0", "12345", "67890", 0)?,
        create_transaction(2, "100.0", "12345", "67890", 5_000)?,
        create_transaction(3, "100.0", "12345", "67890", 15_000)?,
        create_transaction(4, "200.0", "12345", "67890", 2_000)?,
        create_transaction(5, "100.0", "54321", "67890", 3_000)?,
        create_transaction(6, "100.0", "12345", "09876", 4_000)?,
    ];

    let result = DuplicateFilter::new().filter(transactions);

    assert_eq!(result.unique.len(), 5);
    assert_eq!(ids(&result.duplicates), vec![2]);

    Ok(())
}

#[test]
fn test_empty_input_produces_empty_output() {
    let result = DuplicateFilter::new().filter(Vec::new());

    assert!(result.unique.is_empty());
    assert!(result.duplicates.is_empty());
}

#[test]
fn test_equal_timestamps_keep_input_order() -> Result<()> {
    let transactions = vec![
        create_transaction(9, "1.0", "a", "b", 0)?,
        create_transaction(3, "1.0", "a", "b", 0)?,
        create_transaction(5, "2.0", "a", "b", 0)?,
    ];

    let result = DuplicateFilter::new().filter(transactions);

    assert_eq!(ids(&result.unique), vec![9, 5]);
    assert_eq!(ids(&result.duplicates), vec![3]);

    Ok(())
}

#[test]
fn test_duplicate_matches_a_survivor_rather_than_the_previous_transaction() -> Result<()> {
    // 19s and 21s are both within the window of the survivor at 12s.
    let transactions = vec![
        create_transaction(1, "5.0", "a", "b", 0)?,
        create_transaction(2, "5.0", "a", "b", 12_000)?,
        create_transaction(3, "5.0", "a", "b", 19_000)?,
        create_transaction(4, "5.0", "a", "b", 21_000)?,
    ];

    let result = DuplicateFilter::new().filter(transactions);

    assert_eq!(ids(&result.unique), vec![1, 2]);
    assert_eq!(ids(&result.duplicates), vec![3, 4]);

    Ok(())
}

#[test]
fn test_discarded_transactions_do_not_extend_the_window() -> Result<()> {
    // 8s is a duplicate of 0s, 16s is 16s away from the only survivor and is kept.
    let transactions = vec![
        create_transaction(1, "5.0", "a", "b", 0)?,
        create_transaction(2, "5.0", "a", "b", 8_000)?,
        create_transaction(3, "5.0", "a", "b", 16_000)?,
    ];

    let result = DuplicateFilter::new().filter(transactions);

    assert_eq!(ids(&result.unique), vec![1, 3]);

    Ok(())
}

#[test]
fn test_equal_decimal_values_share_a_key() -> Result<()> {
    let transactions = vec![
        create_transaction(1, "100.0", "a", "b", 0)?,
        create_transaction(2, "100.00", "a", "b", 1_000)?,
    ];

    let result = DuplicateFilter::new().filter(transactions);

    assert_eq!(ids(&result.unique), vec![1]);

    Ok(())
}

#[test]
fn test_output_is_sorted_by_timestamp() -> Result<()> {
    let transactions = random_transactions(7, 2_000)?;
    let result = DuplicateFilter::new().filter(transactions);

    assert!(result.unique.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
    assert!(result.duplicates.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));

    Ok(())
}

#[test]
fn test_ten_thousand_unique_with_injected_duplicates() -> Result<()> {
    let mut transactions = Vec::with_capacity(10_100);

    for id in 0..10_000 {
        let value = format!("{}.00", 100 + id % 100);
        let party = id % 50;

        transactions.push(create_transaction(id, &value, &format!("payer{party}"), &format!("payee{party}"), id as i64 * 1_000)?);
    }

    for index in 0..100 {
        let original = transactions[index * 100].clone();

        transactions.push(Transaction {
            id: 10_000 + index as TransactionId,
            timestamp: original.timestamp + TimeDelta::seconds(5),
            ..original
        });
    }

    let result = DuplicateFilter::new().filter(transactions);

    assert_eq!(result.unique.len(), 10_000);
    assert_eq!(result.duplicates.len(), 100);
    assert!(result.duplicates.iter().all(|transaction| transaction.id >= 10_000));

    Ok(())
}

#[test]
fn test_repeated_runs_are_deterministic() -> Result<()> {
    let transactions = random_transactions(42, 3_000)?;
    let filter = DuplicateFilter::new();

    let first = filter.filter(transactions.clone());
    let second = filter.filter(transactions);

    assert_eq!(ids(&first.unique), ids(&second.unique));
    assert_eq!(ids(&first.duplicates), ids(&second.duplicates));

    Ok(())
}

#[test]
fn test_classification_is_identical_for_any_prune_interval() -> Result<()> {
    let transactions = random_transactions(1234, 5_000)?;
    let expected = DuplicateFilter::new().with_prune_interval(None).filter(transactions.clone());

    for interval in [1, 7, 64, 10_000] {
        let result = DuplicateFilter::new().with_prune_interval(Some(interval)).filter(transactions.clone());

        assert_eq!(ids(&result.unique), ids(&expected.unique), "prune interval {interval}");
        assert_eq!(ids(&result.duplicates), ids(&expected.duplicates), "prune interval {interval}");
    }

    Ok(())
}

#[test]
fn test_matches_the_pairwise_rule() -> Result<()> {
    for seed in 0..5 {
        let transactions = random_transactions(seed, 1_500)?;
        let window = TimeDelta::seconds(10);
        let expected = reference_unique_ids(&transactions, window);

        let result = DuplicateFilter::new().with_prune_interval(Some(100)).filter(transactions);

        assert_eq!(ids(&result.unique), expected, "seed {seed}");
    }

    Ok(())
}

#[test]
fn test_disjoint_keys_do_not_influence_each_other() -> Result<()> {
    let alone = vec![
        create_transaction(1, "10.0", "a", "b", 0)?,
        create_transaction(2, "10.0", "a", "b", 4_000)?,
        create_transaction(3, "10.0", "a", "b", 30_000)?,
    ];

    let mut mixed = alone.clone();
    for id in 100..200 {
        mixed.push(create_transaction(id, "10.0", "x", "y", (id as i64 - 100) * 300)?);
    }

    let alone_result = DuplicateFilter::new().filter(alone);
    let mixed_result = DuplicateFilter::new().filter(mixed);

    let mixed_ids: Vec<_> = ids(&mixed_result.unique).into_iter().filter(|id| *id < 100).collect();

    assert_eq!(ids(&alone_result.unique), mixed_ids);

    Ok(())
}

#[test]
fn test_custom_window_is_honoured() -> Result<()> {
    let transactions = vec![
        create_transaction(1, "1.0", "a", "b", 0)?,
        create_transaction(2, "1.0", "a", "b", 3_000)?,
    ];

    let result = DuplicateFilter::new()
        .with_window(TimeDelta::seconds(2))
        .filter(transactions);

    assert_eq!(ids(&result.unique), vec![1, 2]);

    Ok(())
}

#[test]
fn test_window_defaults_to_ten_seconds_and_ignores_sign() {
    assert_eq!(DuplicateFilter::new().window(), TimeDelta::seconds(10));
    assert_eq!(DuplicateFilter::new().with_window(TimeDelta::seconds(-4)).window(), TimeDelta::seconds(4));
}
