mod errors;
mod record_decoder;

pub use errors::DecodeError;
pub use record_decoder::{RecordDecoder, RecordFormat};
