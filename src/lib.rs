pub mod decoder;
pub mod dedup;
pub mod engine;
pub mod models;
pub mod statistics;
pub mod storage;
pub mod types;
pub mod writer;
