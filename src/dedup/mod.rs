mod duplicate_filter;
#[cfg(test)]
mod tests;

pub use duplicate_filter::{Deduplicated, DuplicateFilter};
