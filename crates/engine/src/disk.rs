use config::EngineConfig;
use memtable::Record;
use parking_lot::RwLock;
use sstable::{BloomParams, Table};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use crate::level::Level;
use crate::{EngineError, Result};

/// Owns the leveled tables of one storage directory.
///
/// All level mutations (flush and compaction) run under the write lock, so
/// compactions are serialized. Lookups share the read lock.
///
/// Every table written gets the next value of `next_seq`; recovery seeds it
/// past the largest sequence number already on disk.
pub struct DiskManager {
    pub(crate) config: EngineConfig,
    pub(crate) params: BloomParams,
    pub(crate) next_seq: AtomicU64,
    pub(crate) levels: RwLock<Vec<Level>>,
}

impl DiskManager {
    /// A manager with a single empty level 0.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_levels(config, vec![Level::new()], 0)
    }

    pub(crate) fn with_levels(
        config: &EngineConfig,
        mut levels: Vec<Level>,
        next_seq: u64,
    ) -> Self {
        if levels.is_empty() {
            levels.push(Level::new());
        }
        Self {
            config: config.clone(),
            params: BloomParams::new(
                config.bloom_expected_items,
                config.bloom_false_positive_rate,
            ),
            next_seq: AtomicU64::new(next_seq),
            levels: RwLock::new(levels),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Writes `records` as a table at `level` under a fresh sequence number.
    pub(crate) fn create_table(&self, records: &[Record], level: u64) -> Result<Table> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        Ok(Table::create(records, self.dir(), level, seq, self.params)?)
    }

    /// Writes `records` as a new level-0 table, then compacts any level over
    /// its target.
    ///
    /// An empty slice is a no-op. If the table write fails the levels are
    /// unchanged. If a later compaction fails the new table is already
    /// published and the error is returned.
    pub fn flush(&self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut levels = self.levels.write();
        let table = self.create_table(records, 0)?;
        info!(
            path = %table.path().display(),
            records = records.len(),
            "flushed memtable to level 0"
        );
        levels[0].push(table);

        self.check_and_compact(&mut levels)
    }

    /// Finds the newest on-disk record for `key`, scanning level 0 first.
    ///
    /// The record may be a tombstone; the caller decides what that means.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] if no level holds the key.
    pub fn get(&self, key: &[u8]) -> Result<Record> {
        let levels = self.levels.read();
        for (i, level) in levels.iter().enumerate() {
            if let Some(record) = level.get(key)? {
                debug!(level = i, tombstone = record.tombstone, "disk hit");
                return Ok(record);
            }
        }
        Err(EngineError::NotFound)
    }

    /// Compacts level `i` into level `i + 1` regardless of its size, then
    /// lets any overfull level cascade.
    ///
    /// # Errors
    ///
    /// [`EngineError::Merge`] if level `i` does not exist or is empty.
    pub fn compact_level(&self, i: usize) -> Result<()> {
        let mut levels = self.levels.write();
        self.compact(&mut levels, i)?;
        self.check_and_compact(&mut levels)
    }

    /// Table-count target for level `i`.
    pub fn capacity(&self, i: usize) -> usize {
        self.config.level_capacity(i)
    }

    pub fn level_count(&self) -> usize {
        self.levels.read().len()
    }

    /// Number of tables per level, level 0 first.
    pub fn table_counts(&self) -> Vec<usize> {
        self.levels.read().iter().map(Level::len).collect()
    }
}

impl std::fmt::Debug for DiskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskManager")
            .field("dir", &self.config.data_dir)
            .field("level_ratio", &self.config.level_ratio)
            .field("l0_target", &self.config.l0_target)
            .field("next_seq", &self.next_seq.load(Ordering::Relaxed))
            .field("table_counts", &self.table_counts())
            .finish()
    }
}
