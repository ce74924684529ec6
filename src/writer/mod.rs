mod batch_writer;
mod errors;

pub use batch_writer::{BatchWriter, WriteSummary};
pub use errors::PersistenceError;
