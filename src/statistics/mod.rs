mod report;

pub use report::{
    general_stats, hourly_distribution, unusual_patterns, value_distribution,
    GeneralStats, HourBucket, UnusualPatterns, ValueBucket
};
