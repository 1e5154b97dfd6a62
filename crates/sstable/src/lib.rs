//! # SSTable - Sorted String Table
//!
//! Immutable, on-disk storage files for the StrataKV storage engine.
//!
//! When the in-memory [`memtable::Memtable`] exceeds its size threshold the
//! engine flushes it to disk as an SSTable. SSTables are *write-once,
//! read-many*: once created they are never modified (only replaced during
//! compaction).
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ HEADER (32 bytes)                                             │
//! │                                                               │
//! │ index_block_size (u64) | bloom_filter_size (u64)              │
//! │ data_block_size (u64)  | level (u64)                          │
//! ├───────────────────────────────────────────────────────────────┤
//! │ BLOOM SECTION (bloom_filter_size bytes)                       │
//! │                                                               │
//! │ byte_len (u64) | bits (bytes)                                 │
//! ├───────────────────────────────────────────────────────────────┤
//! │ INDEX SECTION (index_block_size bytes)                        │
//! │                                                               │
//! │ key_len (u64) | key | offset (u64)                            │
//! │ ... one entry per record, ascending by key ...                │
//! ├───────────────────────────────────────────────────────────────┤
//! │ DATA SECTION (data_block_size bytes)                          │
//! │                                                               │
//! │ key_len (u64) | key | val_len (u64) | value | tombstone (u8)  │
//! │ ... repeated for each record, ascending by key ...            │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. Index offsets are relative to the start
//! of the data section. Files are named `L<level>_<seq>-<nanos>.data`. The
//! caller-assigned `<seq>` orders tables; `<nanos>` is the creation time and
//! plays no part in ordering.
//!
//! The bloom section does not record the `(n, p)` it was sized from, so a
//! table can only be reopened with the [`BloomParams`] it was created with.

mod format;
mod merge;
mod reader;
mod table;
mod writer;

pub use bloom::BloomParams;
pub use format::{
    decode_index, decode_record, decode_records, encode_index, encode_record, encode_records,
    encoded_len, IndexEntry, Metadata, HEADER_BYTES, MAX_KEY_BYTES, MAX_VALUE_BYTES,
};
pub use merge::{merge, merge_keep_tombstones, MergeIterator};
pub use table::{parse_table_file_name, Table, TABLE_EXTENSION, TMP_EXTENSION};

use bloom::BloomError;
use std::io;
use thiserror::Error;

/// Errors produced while writing, opening, or reading tables.
#[derive(Debug, Error)]
pub enum TableError {
    /// The key is not in this table. Used for control flow by callers.
    #[error("key not found in table")]
    NotFound,

    /// An underlying I/O error (create, open, seek, read, rename, remove).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Malformed on-disk bytes: bad length prefixes, truncation, size
    /// mismatches.
    #[error("corrupt table: {0}")]
    Decode(String),

    /// The embedded bloom filter failed to reconstruct.
    #[error("bloom filter: {0}")]
    Bloom(#[from] BloomError),

    /// Refusing to write a table with no records.
    #[error("refusing to write an empty table")]
    Empty,
}

pub type Result<T> = std::result::Result<T, TableError>;
