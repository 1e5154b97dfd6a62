use bloom::BloomParams;
use memtable::Record;
use std::fs::{rename, File, OpenOptions};
use std::io::{BufWriter, IntoInnerError, Write};
use std::path::Path;
use tracing::debug;

use crate::format::{encode_index, encode_record, encoded_len, IndexEntry, Metadata};
use crate::table::TMP_EXTENSION;
use crate::{Result, Table, TableError};

impl Table {
    /// Writes `records` as a new table file in `dir` and returns its handle.
    ///
    /// `records` must be ascending by key with no duplicates; both the
    /// memtable flush and the compaction merge produce exactly that. `seq`
    /// goes into the file name and must grow with every table the caller
    /// creates, since recovery orders tables by it.
    ///
    /// # Crash Safety
    ///
    /// Writes to `<name>.data.tmp`, calls `sync_all()`, then atomically
    /// renames and syncs the directory. If the process crashes mid-write the
    /// temp file is left behind and removed on the next open.
    ///
    /// # Errors
    ///
    /// [`TableError::Empty`] for an empty slice, [`TableError::Io`] on any
    /// write failure (the temp file is removed).
    pub fn create(
        records: &[Record],
        dir: &Path,
        level: u64,
        seq: u64,
        params: BloomParams,
    ) -> Result<Self> {
        if records.is_empty() {
            return Err(TableError::Empty);
        }

        let mut bloom = params.build();
        let mut index = Vec::with_capacity(records.len());
        let mut data = Vec::with_capacity(records.iter().map(encoded_len).sum());

        for record in records {
            bloom.insert(&record.key);
            index.push(IndexEntry {
                key: record.key.clone(),
                offset: data.len() as u64,
            });
            encode_record(&mut data, record)?;
        }

        let mut index_bytes = Vec::new();
        encode_index(&mut index_bytes, &index)?;
        let bloom_bytes = bloom.to_bytes()?;
        let metadata = Metadata {
            index_block_size: index_bytes.len() as u64,
            bloom_filter_size: bloom_bytes.len() as u64,
            data_block_size: data.len() as u64,
            level,
        };

        let path = dir.join(Table::file_name(level, seq));
        let tmp_path = path.with_extension(TMP_EXTENSION);

        let sections = [bloom_bytes.as_slice(), index_bytes.as_slice(), data.as_slice()];
        if let Err(e) = write_synced(&tmp_path, &metadata, &sections) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }
        if let Err(e) = rename(&tmp_path, &path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        // Fsync the parent directory so the rename itself is durable.
        if let Ok(dir) = File::open(dir) {
            let _ = dir.sync_all();
        }

        debug!(
            path = %path.display(),
            records = records.len(),
            bytes = metadata.file_size(),
            "wrote table"
        );

        Ok(Self {
            path,
            index,
            bloom,
            metadata,
        })
    }
}

fn write_synced(path: &Path, metadata: &Metadata, sections: &[&[u8]]) -> Result<()> {
    let raw_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    let mut file = BufWriter::new(raw_file);

    metadata.write_to(&mut file)?;
    for section in sections {
        file.write_all(section)?;
    }

    file.flush()?;
    file.into_inner()
        .map_err(IntoInnerError::into_error)?
        .sync_all()?;
    Ok(())
}
