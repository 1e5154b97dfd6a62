use bloom::BloomError;
use config::ConfigError;
use memtable::MemtableError;
use sstable::TableError;
use std::io;
use thiserror::Error;

/// Errors surfaced by the engine API.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The key is not live anywhere: never written, or deleted.
    #[error("key not found")]
    NotFound,

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Malformed table bytes on disk.
    #[error("decode error: {0}")]
    Decode(String),

    /// A bit index outside a bloom filter's bit vector.
    #[error("bit index {index} out of bounds for length {len}")]
    Bounds { index: u64, len: u64 },

    /// Compaction could not run, e.g. the source level is empty.
    #[error("merge error: {0}")]
    Merge(String),

    #[error("key must not be empty")]
    EmptyKey,

    #[error("key is {size} bytes, maximum is {max}")]
    KeyTooLarge { size: usize, max: usize },

    #[error("value is {size} bytes, maximum is {max}")]
    ValueTooLarge { size: usize, max: usize },

    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl From<BloomError> for EngineError {
    fn from(e: BloomError) -> Self {
        match e {
            BloomError::OutOfBounds { index, len } => Self::Bounds { index, len },
            BloomError::Decode(msg) => Self::Decode(msg),
            BloomError::Io(e) => Self::Io(e),
        }
    }
}

impl From<TableError> for EngineError {
    fn from(e: TableError) -> Self {
        match e {
            TableError::NotFound => Self::NotFound,
            TableError::Io(e) => Self::Io(e),
            TableError::Decode(msg) => Self::Decode(msg),
            TableError::Bloom(e) => e.into(),
            TableError::Empty => Self::Merge("refusing to write an empty table".to_string()),
        }
    }
}

impl From<MemtableError> for EngineError {
    fn from(_: MemtableError) -> Self {
        Self::NotFound
    }
}
