use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use serde::de::{self, SeqAccess, Visitor};
use tracing::info;

use crate::decoder::errors::DecodeError;
use crate::models::{CsvTransactionRecord, Transaction, TransactionRecord};

const DEFAULT_PROGRESS_INTERVAL: usize = 100_000;

/// Serialization of the input file.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RecordFormat {
    /// A single JSON array of records.
    Json,
    /// A CSV file with an `id,value,payer,payee,timestamp` header.
    Csv
}

impl RecordFormat {
    /// Picks the format from the file extension, anything that is not `.csv` is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|extension| extension.to_str()) {
            Some(extension) if extension.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Json
        }
    }
}

/// Streaming decoder turning an input file into `Transaction` values.
///
/// Records are handed to a sink one at a time, in file order, so the raw text is
/// never held in memory. The sink returns `false` to stop decoding.
pub struct RecordDecoder {
    path: PathBuf,
    format: RecordFormat,
    progress_interval: usize
}

impl RecordDecoder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = RecordFormat::from_path(&path);

        Self {
            path,
            format,
            progress_interval: DEFAULT_PROGRESS_INTERVAL
        }
    }

    pub fn with_format(mut self, format: RecordFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_progress_interval(mut self, progress_interval: usize) -> Self {
        self.progress_interval = progress_interval.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    /// Opens the input file and streams every record into `sink`.
    ///
    /// Returns the number of records emitted.
    ///
    /// # Errors
    /// Returns `DecodeError` if the file cannot be opened, the structure is malformed,
    /// a record misses a field, a timestamp cannot be parsed or the sink stops early.
    pub fn decode<F>(&self, sink: F) -> Result<usize, DecodeError>
    where
        F: FnMut(Transaction) -> bool
    {
        let file = File::open(&self.path).map_err(|error| DecodeError::open(&self.path, error))?;

        self.decode_reader(BufReader::new(file), sink)
    }

    /// Streams every record of an already opened source into `sink`.
    pub fn decode_reader<R, F>(&self, reader: R, sink: F) -> Result<usize, DecodeError>
    where
        R: Read,
        F: FnMut(Transaction) -> bool
    {
        let mut emitter = RecordEmitter {
            sink,
            emitted: 0,
            progress_interval: self.progress_interval
        };

        match self.format {
            RecordFormat::Json => decode_json(reader, &mut emitter)?,
            RecordFormat::Csv => decode_csv(reader, &mut emitter)?
        }

        info!("Decoding complete, [{}] transactions read", emitter.emitted);

        Ok(emitter.emitted)
    }

    /// Collects the whole input into memory, in file order.
    pub fn decode_all(&self) -> Result<Vec<Transaction>, DecodeError> {
        let mut transactions = Vec::new();

        self.decode(|transaction| {
            transactions.push(transaction);
            true
        })?;

        Ok(transactions)
    }
}

struct RecordEmitter<F> {
    sink: F,
    emitted: usize,
    progress_interval: usize
}

impl<F> RecordEmitter<F>
where
    F: FnMut(Transaction) -> bool
{
    fn emit(&mut self, record: TransactionRecord) -> Result<(), DecodeError> {
        let index = self.emitted;
        let transaction_id = record.id;

        let transaction = Transaction::try_from(record).map_err(|source| DecodeError::InvalidTimestamp {
            record: index,
            transaction_id,
            source
        })?;

        if !(self.sink)(transaction) {
            return Err(DecodeError::SinkClosed { record: index });
        }

        self.emitted += 1;

        if self.emitted % self.progress_interval == 0 {
            info!("Decoded [{}] transactions...", self.emitted);
        }

        Ok(())
    }
}

fn decode_json<R, F>(reader: R, emitter: &mut RecordEmitter<F>) -> Result<(), DecodeError>
where
    R: Read,
    F: FnMut(Transaction) -> bool
{
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    let mut failure = None;

    let visitor = RecordSeqVisitor {
        emitter: &mut *emitter,
        failure: &mut failure
    };

    let result = de::Deserializer::deserialize_seq(&mut deserializer, visitor);

    //NOTE: A rejected record surfaces from serde as a generic custom error, the real cause is kept aside
    if let Some(error) = failure {
        return Err(error);
    }

    result.map_err(|error| DecodeError::from_json(emitter.emitted, error))?;

    deserializer.end().map_err(|error| DecodeError::from_json(emitter.emitted, error))
}

fn decode_csv<R, F>(reader: R, emitter: &mut RecordEmitter<F>) -> Result<(), DecodeError>
where
    R: Read,
    F: FnMut(Transaction) -> bool
{
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(reader);

    for result in reader.deserialize::<CsvTransactionRecord>() {
        let record = result.map_err(|error| DecodeError::from_csv(emitter.emitted, error))?;
        emitter.emit(record.into())?;
    }

    Ok(())
}

struct RecordSeqVisitor<'a, F> {
    emitter: &'a mut RecordEmitter<F>,
    failure: &'a mut Option<DecodeError>
}

impl<'de, F> Visitor<'de> for RecordSeqVisitor<'_, F>
where
    F: FnMut(Transaction) -> bool
{
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an array of transaction records")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>
    {
        let Self { emitter, failure } = self;

        while let Some(record) = seq.next_element::<TransactionRecord>()? {
            if let Err(error) = emitter.emit(record) {
                *failure = Some(error);
                return Err(de::Error::custom("record rejected"));
            }
        }

        Ok(())
    }
}
