/// Write path: `put()`, `delete()`, `force_flush()`, and the internal
/// flush that hands a full memtable to the disk manager.
use memtable::{DeleteOutcome, Memtable, Record};
use tracing::{debug, info};

use crate::{Engine, EngineError, Result, MAX_KEY_SIZE, MAX_VALUE_SIZE};

impl Engine {
    /// Inserts or overwrites a record.
    ///
    /// A tombstone record is accepted and acts as a blind delete. If the
    /// memtable's size estimate reaches the threshold, it is flushed to a new
    /// level-0 table (and compaction runs) before this call returns.
    ///
    /// # Errors
    ///
    /// Validation errors for the key or value, and I/O errors from a
    /// triggered flush or compaction.
    pub fn put(&self, record: Record) -> Result<()> {
        Self::check_key(&record.key)?;
        if record.value.len() > MAX_VALUE_SIZE {
            return Err(EngineError::ValueTooLarge {
                size: record.value.len(),
                max: MAX_VALUE_SIZE,
            });
        }

        let mut mem = self.mem.write();
        mem.put(record);
        self.maybe_flush(&mut mem)
    }

    /// Deletes `key`.
    ///
    /// A live memtable record is overwritten by a tombstone. A key absent
    /// from the memtable is looked up on disk while the memtable write lock
    /// is still held; if it is live there, a tombstone is inserted so the
    /// delete is visible immediately.
    ///
    /// Deleting a key that is not live anywhere is a no-op, or
    /// [`EngineError::NotFound`] when `delete_missing_is_error` is set.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        Self::check_key(key)?;

        let mut mem = self.mem.write();
        let found = match mem.delete(key) {
            DeleteOutcome::Tombstoned => true,
            DeleteOutcome::AlreadyDeleted => false,
            DeleteOutcome::Absent => match self.disk.get(key) {
                Ok(record) if !record.tombstone => {
                    mem.put(Record::tombstone(key));
                    true
                }
                Ok(_) | Err(EngineError::NotFound) => false,
                Err(e) => return Err(e),
            },
        };

        if !found {
            debug!("delete of missing key");
            if self.config.delete_missing_is_error {
                return Err(EngineError::NotFound);
            }
            return Ok(());
        }

        self.maybe_flush(&mut mem)
    }

    /// Flushes the memtable to level 0 now, regardless of its size.
    ///
    /// No-op if the memtable is empty.
    pub fn force_flush(&self) -> Result<()> {
        let mut mem = self.mem.write();
        if mem.is_empty() {
            return Ok(());
        }
        self.flush(&mut mem)
    }

    /// Compacts `level` into the next one immediately.
    ///
    /// # Errors
    ///
    /// [`EngineError::Merge`] if the level is empty or does not exist.
    pub fn compact_level(&self, level: usize) -> Result<()> {
        self.disk.compact_level(level)
    }

    fn maybe_flush(&self, mem: &mut Memtable) -> Result<()> {
        if mem.approx_size() >= self.config.memtable_threshold {
            self.flush(mem)?;
        }
        Ok(())
    }

    /// Writes the memtable out and clears it. Caller holds the write lock.
    pub(crate) fn flush(&self, mem: &mut Memtable) -> Result<()> {
        let records = mem.get_all();
        let bytes = mem.approx_size();
        self.disk.flush(&records)?;
        mem.clear();
        info!(records = records.len(), bytes, "memtable flushed");
        Ok(())
    }
}
