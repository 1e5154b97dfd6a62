/// Read path: `get()`.
use memtable::Record;
use tracing::debug;

use crate::{Engine, EngineError, Result};

impl Engine {
    /// Looks up the live record for `key`.
    ///
    /// Checks the memtable first, then every level from 0 down. The first
    /// version found decides; a tombstone means the key is deleted.
    ///
    /// The memtable read lock is held across the disk lookup, so a
    /// concurrent flush cannot move the key out from under the search.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] if the key was never written or is deleted,
    /// [`EngineError::EmptyKey`] / [`EngineError::KeyTooLarge`] for invalid
    /// keys, and I/O or decode errors from the tables.
    pub fn get(&self, key: &[u8]) -> Result<Record> {
        Self::check_key(key)?;

        let mem = self.mem.read();
        if let Ok(record) = mem.get(key) {
            debug!(tombstone = record.tombstone, "memtable hit");
            return live(record.clone());
        }

        live(self.disk.get(key)?)
    }
}

fn live(record: Record) -> Result<Record> {
    if record.tombstone {
        Err(EngineError::NotFound)
    } else {
        Ok(record)
    }
}
