use std::io::{stderr, stdout};
use std::process::exit;
use std::sync::Arc;

use anyhow::Result;
use chrono::SecondsFormat;
use csv::Writer;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use transaction_dedup_pipeline::engine::DedupEngine;
use transaction_dedup_pipeline::statistics;
use transaction_dedup_pipeline::storage::TransactionStorage;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: transaction-dedup-pipeline [input].json|csv [log_level:optional] > [output].csv");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: error)");
        exit(1);
    }

    let path = &args[1];
    let log_level = args.get(2)
        .map(|s| parse_log_level(s)).unwrap_or_else(|| LevelFilter::ERROR);

    setup_logging(log_level);

    let storage = Arc::new(TransactionStorage::new());
    let mut engine = DedupEngine::new(storage.clone());

    engine.run(path).await?;

    log_statistics(&storage);
    write_results_to_stdout(&storage)?;

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: stdout carries the persisted transactions, logging goes to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

fn log_statistics(storage: &TransactionStorage) {
    let transactions = storage.transactions();
    let general = statistics::general_stats(&transactions);

    let total_value = general.total_value
        .map_or_else(|| "overflow".to_string(), |total| total.to_string());

    info!(
        "Stored [{}] transactions, total value [{}], average [{}], min [{}], max [{}], [{}] payers, [{}] payees",
        general.total_transactions,
        total_value,
        general.average_value.round_dp(2),
        general.min_value,
        general.max_value,
        general.unique_payers,
        general.unique_payees
    );

    for bucket in statistics::value_distribution(&transactions) {
        info!("Value range [{}]: {} ({:.2}%)", bucket.range, bucket.count, bucket.percentage);
    }

    for bucket in statistics::hourly_distribution(&transactions).iter().filter(|bucket| bucket.count > 0) {
        info!("Hour [{:02}]: {} ({:.2}%)", bucket.hour, bucket.count, bucket.percentage);
    }

    let patterns = statistics::unusual_patterns(&transactions);

    for (payer, count) in &patterns.frequent_payers {
        info!("Frequent payer [{payer}] with [{count}] transactions");
    }

    if let Some(threshold) = patterns.high_value_threshold {
        for transaction in &patterns.high_value_transactions {
            info!(
                "High value transaction [{}] of [{}] above threshold [{}]",
                transaction.id,
                transaction.value,
                threshold.round_dp(2)
            );
        }
    }
}

fn write_results_to_stdout(storage: &TransactionStorage) -> Result<()> {
    //NOTE: payer and payee are opaque text, the csv writer quotes them when needed
    let mut output = Writer::from_writer(stdout().lock());

    output.write_record(["id", "value", "payer", "payee", "timestamp"])?;

    for transaction in storage.transactions() {
        output.write_record([
            transaction.id.to_string(),
            transaction.value.to_string(),
            transaction.payer,
            transaction.payee,
            transaction.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
        ])?;
    }

    output.flush()?;

    Ok(())
}
