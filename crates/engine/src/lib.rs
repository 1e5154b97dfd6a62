//! # Engine - StrataKV Storage Engine
//!
//! The central orchestrator that ties together the [`memtable`], [`sstable`],
//! and [`bloom`] crates into a leveled LSM-tree key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                   ENGINE                      │
//! │                                               │
//! │ write.rs → Memtable insert                    │
//! │              |                                │
//! │              |  (size >= threshold?)          │
//! │              |            yes                 │
//! │              v                                │
//! │      DiskManager::flush() → new L0 table      │
//! │              |                                │
//! │              |  (level i over target?)        │
//! │              |            yes                 │
//! │              v                                │
//! │      compact(i) → merged table in L(i+1)      │
//! │                                               │
//! │ read.rs → Memtable → L0 → L1 → ... → Ln       │
//! │            (first match wins)                 │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module          | Purpose                                                 |
//! |-----------------|---------------------------------------------------------|
//! | `lib.rs`        | `Engine` struct, `open()`, accessors, `Debug`, `Drop`   |
//! | [`disk`]        | `DiskManager`: level list, flush, leveled lookups       |
//! | [`level`]       | `Level`: one tier of tables, overlap queries            |
//! | `compaction`    | `check_and_compact()` and the per-level merge           |
//! | `recovery`      | Directory scan, temp file cleanup                       |
//! | `write`         | `put()`, `delete()`, `force_flush()`                    |
//! | `read`          | `get()`                                                 |
//!
//! ## Levels
//!
//! ```text
//! ┌────────────────────────────┐  ← freshest, checked first
//! │ MEMTABLE                   │
//! ├────────────────────────────┤  ← from flushes (may overlap)
//! │ L0 tables                  │
//! ├────────────────────────────┤  ← from compaction (no overlap)
//! │ L1 .. Ln tables            │
//! └────────────────────────────┘
//! ```
//!
//! Level `i` holds at most `l0_target * level_ratio^i` tables before it is
//! compacted into level `i + 1`.
//!
//! ## Durability
//!
//! There is no write-ahead log: records still in the memtable are lost if
//! the process dies. Dropping the engine flushes them. Tables are written
//! atomically via temp file, fsync, and rename, and compaction deletes its
//! inputs only after the merged table is on disk.
mod compaction;
pub mod disk;
mod error;
pub mod level;
mod read;
mod recovery;
mod write;

pub use config::EngineConfig;
pub use disk::DiskManager;
pub use error::{EngineError, Result};
pub use level::Level;
pub use memtable::Record;

use memtable::Memtable;
use parking_lot::RwLock;
use sstable::BloomParams;
use tracing::{debug, warn};

/// Maximum allowed key size in bytes (64 KiB).
pub const MAX_KEY_SIZE: usize = sstable::MAX_KEY_BYTES as usize;
/// Maximum allowed value size in bytes (10 MiB).
pub const MAX_VALUE_SIZE: usize = sstable::MAX_VALUE_BYTES as usize;

/// The storage engine: one memtable in front of a [`DiskManager`].
///
/// `Engine` is `Send + Sync`; share it between threads with an `Arc`.
///
/// # Locking
///
/// The memtable sits behind a reader/writer lock and the level list behind a
/// second one inside the disk manager. Locks are always taken memtable
/// first. Writers hold the memtable write lock across any flush and
/// compaction they trigger, so readers never see a half-flushed state.
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) mem: RwLock<Memtable>,
    pub(crate) disk: DiskManager,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mem = self.mem.read();
        f.debug_struct("Engine")
            .field("data_dir", &self.config.data_dir)
            .field("memtable_threshold", &self.config.memtable_threshold)
            .field("memtable_size", &mem.approx_size())
            .field("memtable_entries", &mem.len())
            .field("level_ratio", &self.config.level_ratio)
            .field("l0_target", &self.config.l0_target)
            .field("table_counts", &self.disk.table_counts())
            .finish()
    }
}

impl Engine {
    /// Opens (or creates) a store in `config.data_dir`.
    ///
    /// # Recovery Steps
    ///
    /// 1. Validate the config.
    /// 2. Create the data directory if it does not exist.
    /// 3. Remove leftover `.data.tmp` files from interrupted writes.
    /// 4. Reopen every `L<level>_<seq>-<nanos>.data` table into its level,
    ///    ordered by `seq`, and continue numbering past the largest one.
    ///
    /// # Errors
    ///
    /// [`EngineError::Config`] for an invalid config; I/O or decode errors
    /// if the directory or a table cannot be read.
    pub fn open(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.data_dir)?;

        let params = BloomParams::new(
            config.bloom_expected_items,
            config.bloom_false_positive_rate,
        );
        let (levels, next_seq) = recovery::load_levels(&config.data_dir, params)?;
        let disk = DiskManager::with_levels(&config, levels, next_seq);
        debug!(
            dir = %config.data_dir.display(),
            tables = ?disk.table_counts(),
            next_seq,
            "engine opened"
        );

        Ok(Self {
            config,
            mem: RwLock::new(Memtable::new()),
            disk,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn disk(&self) -> &DiskManager {
        &self.disk
    }

    /// Number of records (tombstones included) in the memtable.
    pub fn memtable_len(&self) -> usize {
        self.mem.read().len()
    }

    /// Current memtable size estimate in bytes.
    pub fn memtable_size(&self) -> usize {
        self.mem.read().approx_size()
    }

    pub fn level_count(&self) -> usize {
        self.disk.level_count()
    }

    /// Tables per level, level 0 first.
    pub fn table_counts(&self) -> Vec<usize> {
        self.disk.table_counts()
    }

    pub(crate) fn check_key(key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(EngineError::EmptyKey);
        }
        if key.len() > MAX_KEY_SIZE {
            return Err(EngineError::KeyTooLarge {
                size: key.len(),
                max: MAX_KEY_SIZE,
            });
        }
        Ok(())
    }
}

impl Drop for Engine {
    /// Best-effort flush so a clean shutdown loses nothing.
    fn drop(&mut self) {
        let mem = self.mem.get_mut();
        if mem.is_empty() {
            return;
        }
        let records = mem.get_all();
        match self.disk.flush(&records) {
            Ok(()) => mem.clear(),
            Err(e) => warn!(error = %e, records = records.len(), "flush on drop failed"),
        }
    }
}

#[cfg(test)]
mod tests;
