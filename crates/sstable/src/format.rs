//! SSTable binary format: the metadata header, the index block, and the
//! record codec used by the data block.
//!
//! ## Header (32 bytes)
//!
//! ```text
//! [index_block_size: u64 LE][bloom_filter_size: u64 LE][data_block_size: u64 LE][level: u64 LE]
//! ```
//!
//! ## Index entry
//!
//! ```text
//! [key_len: u64 LE][key][offset: u64 LE]
//! ```
//!
//! `offset` is relative to the start of the data block.
//!
//! ## Data record
//!
//! ```text
//! [key_len: u64 LE][key][val_len: u64 LE][value][tombstone: u8 (1|0)]
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use memtable::Record;
use std::io::{self, Cursor, Read, Write};

use crate::{Result, TableError};

/// Size of the metadata header in bytes: four `u64` fields.
pub const HEADER_BYTES: u64 = 4 * 8;

/// Maximum key size we'll allocate during reads (64 KiB). Prevents OOM on corrupt files.
pub const MAX_KEY_BYTES: u64 = 64 * 1024;
/// Maximum value size we'll allocate during reads (10 MiB). Prevents OOM on corrupt files.
pub const MAX_VALUE_BYTES: u64 = 10 * 1024 * 1024;

/// Byte counts of the three sections following the header, plus the level
/// the table was written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Metadata {
    pub index_block_size: u64,
    pub bloom_filter_size: u64,
    pub data_block_size: u64,
    pub level: u64,
}

impl Metadata {
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u64::<LittleEndian>(self.index_block_size)?;
        w.write_u64::<LittleEndian>(self.bloom_filter_size)?;
        w.write_u64::<LittleEndian>(self.data_block_size)?;
        w.write_u64::<LittleEndian>(self.level)?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            index_block_size: r.read_u64::<LittleEndian>().map_err(truncated)?,
            bloom_filter_size: r.read_u64::<LittleEndian>().map_err(truncated)?,
            data_block_size: r.read_u64::<LittleEndian>().map_err(truncated)?,
            level: r.read_u64::<LittleEndian>().map_err(truncated)?,
        })
    }

    /// File position where the index block starts.
    #[must_use]
    pub fn index_start(&self) -> u64 {
        HEADER_BYTES.saturating_add(self.bloom_filter_size)
    }

    /// File position where the data block starts.
    #[must_use]
    pub fn data_start(&self) -> u64 {
        self.index_start().saturating_add(self.index_block_size)
    }

    /// Total file size implied by the header. Saturates on corrupt sizes.
    #[must_use]
    pub fn file_size(&self) -> u64 {
        self.data_start().saturating_add(self.data_block_size)
    }
}

/// One index entry: a key and the offset of its record in the data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub key: Vec<u8>,
    pub offset: u64,
}

/// Writes index entries back to back.
pub fn encode_index<W: Write>(w: &mut W, entries: &[IndexEntry]) -> io::Result<()> {
    for entry in entries {
        w.write_u64::<LittleEndian>(entry.key.len() as u64)?;
        w.write_all(&entry.key)?;
        w.write_u64::<LittleEndian>(entry.offset)?;
    }
    Ok(())
}

/// Decodes an entire index block.
pub fn decode_index(buf: &[u8]) -> Result<Vec<IndexEntry>> {
    let mut cursor = Cursor::new(buf);
    let mut entries = Vec::new();

    while (cursor.position() as usize) < buf.len() {
        let key = read_bytes(&mut cursor, MAX_KEY_BYTES, "index key")?;
        let offset = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
        entries.push(IndexEntry { key, offset });
    }

    Ok(entries)
}

/// Number of bytes [`encode_record`] writes for `record`.
#[must_use]
pub fn encoded_len(record: &Record) -> usize {
    8 + record.key.len() + 8 + record.value.len() + 1
}

/// Writes one record in data-block form.
pub fn encode_record<W: Write>(w: &mut W, record: &Record) -> io::Result<()> {
    w.write_u64::<LittleEndian>(record.key.len() as u64)?;
    w.write_all(&record.key)?;
    w.write_u64::<LittleEndian>(record.value.len() as u64)?;
    w.write_all(&record.value)?;
    w.write_u8(u8::from(record.tombstone))?;
    Ok(())
}

/// Reads exactly one record.
///
/// # Errors
///
/// [`TableError::Decode`] on truncation, oversized length prefixes, or a
/// tombstone byte other than 0 or 1.
pub fn decode_record<R: Read>(r: &mut R) -> Result<Record> {
    let key = read_bytes(r, MAX_KEY_BYTES, "key")?;
    let value = read_bytes(r, MAX_VALUE_BYTES, "value")?;
    let tombstone = match r.read_u8().map_err(truncated)? {
        0 => false,
        1 => true,
        other => {
            return Err(TableError::Decode(format!(
                "invalid tombstone byte {:#04x}",
                other
            )))
        }
    };
    Ok(Record {
        key,
        value,
        tombstone,
    })
}

/// Writes a run of records back to back.
pub fn encode_records<W: Write>(w: &mut W, records: &[Record]) -> io::Result<()> {
    for record in records {
        encode_record(w, record)?;
    }
    Ok(())
}

/// Decodes a whole data block, preserving order.
pub fn decode_records(buf: &[u8]) -> Result<Vec<Record>> {
    let mut cursor = Cursor::new(buf);
    let mut records = Vec::new();
    while (cursor.position() as usize) < buf.len() {
        records.push(decode_record(&mut cursor)?);
    }
    Ok(records)
}

fn read_bytes<R: Read>(r: &mut R, max: u64, what: &str) -> Result<Vec<u8>> {
    let len = r.read_u64::<LittleEndian>().map_err(truncated)?;
    if len > max {
        return Err(TableError::Decode(format!(
            "{} length {} exceeds maximum {}",
            what, len, max
        )));
    }
    let mut bytes = vec![0u8; len as usize];
    r.read_exact(&mut bytes).map_err(truncated)?;
    Ok(bytes)
}

/// Maps an unexpected EOF to a decode error; other I/O errors pass through.
pub(crate) fn truncated(e: io::Error) -> TableError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        TableError::Decode("unexpected end of buffer".to_string())
    } else {
        TableError::Io(e)
    }
}
