use bloom::BloomFilter;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::format::{IndexEntry, Metadata};
use crate::Result;

/// Extension of a finished table file.
pub const TABLE_EXTENSION: &str = "data";
/// Extension of a table still being written.
pub const TMP_EXTENSION: &str = "data.tmp";

/// An immutable on-disk table.
///
/// The handle keeps the parsed index, bloom filter, and header in memory;
/// the file itself is opened only for the duration of a read.
pub struct Table {
    pub(crate) path: PathBuf,
    pub(crate) index: Vec<IndexEntry>,
    pub(crate) bloom: BloomFilter,
    pub(crate) metadata: Metadata,
}

impl Table {
    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Level recorded in the header.
    #[must_use]
    pub fn level(&self) -> u64 {
        self.metadata.level
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Number of records (one index entry per record).
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.index.iter().map(|e| e.key.as_slice())
    }

    /// Bloom filter check; `false` means the key is definitely absent.
    #[must_use]
    pub fn may_contain(&self, key: &[u8]) -> bool {
        self.bloom.may_contain(key)
    }

    /// First and last key in the table.
    #[must_use]
    pub fn boundaries(&self) -> (&[u8], &[u8]) {
        let min = self.index.first().map_or(&[][..], |e| e.key.as_slice());
        let max = self.index.last().map_or(&[][..], |e| e.key.as_slice());
        (min, max)
    }

    /// Whether `key` falls inside `[min, max]`.
    #[must_use]
    pub fn covers(&self, key: &[u8]) -> bool {
        let (min, max) = self.boundaries();
        !self.is_empty() && min <= key && key <= max
    }

    /// Whether `[min, max]` intersects the inclusive range `[start, end]`.
    #[must_use]
    pub fn overlaps(&self, start: &[u8], end: &[u8]) -> bool {
        let (min, max) = self.boundaries();
        !self.is_empty() && min <= end && start <= max
    }

    /// Deletes the backing file, consuming the handle.
    pub fn remove_file(self) -> Result<()> {
        std::fs::remove_file(&self.path)?;
        Ok(())
    }

    /// File name for a table at `level` with sequence number `seq`.
    ///
    /// `seq` alone orders tables; the creation time is informational.
    pub(crate) fn file_name(level: u64, seq: u64) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        format!("L{}_{:020}-{:020}.{}", level, seq, nanos, TABLE_EXTENSION)
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("path", &self.path)
            .field("level", &self.metadata.level)
            .field("records", &self.index.len())
            .finish()
    }
}

/// Splits a table file name `L<level>_<seq>-<nanos>.data` into
/// `(level, seq)`.
///
/// Returns `None` for anything else, including temp files.
#[must_use]
pub fn parse_table_file_name(name: &str) -> Option<(u64, u64)> {
    let stem = name.strip_suffix(".data")?.strip_prefix('L')?;
    let (level, rest) = stem.split_once('_')?;
    let (seq, nanos) = rest.split_once('-')?;
    if !is_digits(level) || !is_digits(seq) || !is_digits(nanos) {
        return None;
    }
    Some((level.parse().ok()?, seq.parse().ok()?))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
