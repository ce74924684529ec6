use std::fs;

use tracing::{debug, info};

/// Resident set size of the current process in megabytes, when the platform exposes it.
pub fn resident_memory_mb() -> Option<u64> {
    let status = fs::read_to_string("/proc/self/status").ok()?;

    status.lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|value| value.trim().trim_end_matches("kB").trim().parse::<u64>().ok())
        .map(|kilobytes| kilobytes / 1024)
}

pub fn log_memory_usage(label: &str) {
    match resident_memory_mb() {
        Some(megabytes) => info!("Memory ({label}): {megabytes} MB"),
        None => debug!("Memory ({label}): unavailable")
    }
}
