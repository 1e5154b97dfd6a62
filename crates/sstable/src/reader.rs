use bloom::{BloomFilter, BloomParams};
use memtable::Record;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::format::{decode_index, decode_record, decode_records, truncated, Metadata, HEADER_BYTES};
use crate::{Result, Table, TableError};

impl Table {
    /// Opens an existing table file, loading its header, bloom filter, and
    /// index into memory.
    ///
    /// `params` must be the bloom params the table was created with.
    ///
    /// # Validation
    ///
    /// - The file size must equal the size implied by the header.
    /// - The bloom section must reconstruct under `params` and match
    ///   `bloom_filter_size`.
    /// - The index must be non-empty and strictly ascending.
    ///
    /// # Errors
    ///
    /// [`TableError::Decode`] or [`TableError::Bloom`] for malformed files,
    /// [`TableError::Io`] on read failure.
    pub fn open(path: &Path, params: BloomParams) -> Result<Self> {
        let file = File::open(path)?;
        let filesize = file.metadata()?.len();
        if filesize < HEADER_BYTES {
            return Err(TableError::Decode(format!(
                "file too small for header: {} bytes",
                filesize
            )));
        }

        let mut r = BufReader::new(file);
        let metadata = Metadata::read_from(&mut r)?;
        if metadata.file_size() != filesize {
            return Err(TableError::Decode(format!(
                "header describes {} bytes but file has {}",
                metadata.file_size(),
                filesize
            )));
        }

        let bloom = BloomFilter::read_from(&mut r, params.expected_items, params.false_positive_rate)?;
        if bloom.serialized_size() as u64 != metadata.bloom_filter_size {
            return Err(TableError::Decode(format!(
                "bloom section is {} bytes, header says {}",
                bloom.serialized_size(),
                metadata.bloom_filter_size
            )));
        }

        let mut index_bytes = vec![0u8; metadata.index_block_size as usize];
        r.read_exact(&mut index_bytes).map_err(truncated)?;
        let index = decode_index(&index_bytes)?;

        if index.is_empty() {
            return Err(TableError::Decode("table has no index entries".to_string()));
        }
        if index.windows(2).any(|w| w[0].key >= w[1].key) {
            return Err(TableError::Decode("index keys are not strictly ascending".to_string()));
        }
        if let Some(bad) = index.iter().find(|e| e.offset >= metadata.data_block_size) {
            return Err(TableError::Decode(format!(
                "index offset {} is past the data block ({} bytes)",
                bad.offset, metadata.data_block_size
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            index,
            bloom,
            metadata,
        })
    }

    /// Point lookup for a single key.
    ///
    /// Binary-searches the in-memory index; on a hit, opens the file, seeks
    /// to the record, and decodes exactly one record (which may be a
    /// tombstone). The bloom filter is **not** consulted here; callers check
    /// [`may_contain`](Table::may_contain) first to avoid the open.
    ///
    /// # Errors
    ///
    /// [`TableError::NotFound`] if the key is not indexed, [`TableError::Io`]
    /// on open/seek/read failure, [`TableError::Decode`] if the record at the
    /// offset is malformed or carries a different key.
    pub fn get(&self, key: &[u8]) -> Result<Record> {
        let pos = self
            .index
            .binary_search_by(|e| e.key.as_slice().cmp(key))
            .map_err(|_| TableError::NotFound)?;
        let offset = self.index[pos].offset;

        let mut f = BufReader::new(File::open(&self.path)?);
        f.seek(SeekFrom::Start(self.metadata.data_start() + offset))?;
        let record = decode_record(&mut f)?;

        if record.key != key {
            return Err(TableError::Decode(format!(
                "index pointed to mismatching key at offset {}",
                offset
            )));
        }

        Ok(record)
    }

    /// Reads and decodes the whole data block, ascending by key.
    ///
    /// Used by compaction.
    pub fn get_all_entries(&self) -> Result<Vec<Record>> {
        let buf = std::fs::read(&self.path)?;
        let start = self.metadata.data_start() as usize;
        let end = start + self.metadata.data_block_size as usize;

        let data = buf.get(start..end).ok_or_else(|| {
            TableError::Decode(format!(
                "file is {} bytes, data block ends at {}",
                buf.len(),
                end
            ))
        })?;

        let records = decode_records(data)?;
        if records.len() != self.index.len() {
            return Err(TableError::Decode(format!(
                "data block holds {} records, index has {}",
                records.len(),
                self.index.len()
            )));
        }
        Ok(records)
    }
}
