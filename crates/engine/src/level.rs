use memtable::Record;
use sstable::{Table, TableError};
use tracing::debug;

use crate::Result;

/// One tier of tables, in insertion order (oldest first).
///
/// Level 0 tables come straight from flushes and may overlap each other.
/// Deeper levels are written only by compaction and stay non-overlapping.
#[derive(Debug, Default)]
pub struct Level {
    tables: Vec<Table>,
}

impl Level {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_tables(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Appends `table` as the newest table in the level.
    pub fn push(&mut self, table: Table) {
        self.tables.push(table);
    }

    /// Positions of tables whose `[min, max]` intersects `[start, end]`,
    /// ascending.
    pub fn overlapping(&self, start: &[u8], end: &[u8]) -> Vec<usize> {
        self.tables
            .iter()
            .enumerate()
            .filter(|(_, t)| t.overlaps(start, end))
            .map(|(i, _)| i)
            .collect()
    }

    /// Smallest and largest key over every table in the level.
    pub fn key_range(&self) -> Option<(Vec<u8>, Vec<u8>)> {
        key_range(self.tables.iter())
    }

    /// Removes the tables at `positions` from the level and hands them back
    /// in the same order. The backing files are left for the caller.
    pub fn remove(&mut self, positions: &[usize]) -> Vec<Table> {
        let mut removed = Vec::with_capacity(positions.len());
        let mut kept = Vec::with_capacity(self.tables.len());
        for (i, table) in std::mem::take(&mut self.tables).into_iter().enumerate() {
            if positions.contains(&i) {
                removed.push(table);
            } else {
                kept.push(table);
            }
        }
        self.tables = kept;
        removed
    }

    /// Empties the level, returning every table oldest first.
    pub fn take_all(&mut self) -> Vec<Table> {
        std::mem::take(&mut self.tables)
    }

    /// Looks `key` up in this level, newest table first.
    ///
    /// Tables whose boundaries exclude the key, or whose bloom filter rejects
    /// it, are never opened. The returned record may be a tombstone.
    pub fn get(&self, key: &[u8]) -> Result<Option<Record>> {
        for table in self.tables.iter().rev() {
            if !table.covers(key) || !table.may_contain(key) {
                continue;
            }
            match table.get(key) {
                Ok(record) => return Ok(Some(record)),
                Err(TableError::NotFound) => {
                    debug!(path = %table.path().display(), "bloom false positive");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }
}

/// Union of the `[min, max]` ranges of `tables`.
pub(crate) fn key_range<'a, I>(tables: I) -> Option<(Vec<u8>, Vec<u8>)>
where
    I: IntoIterator<Item = &'a Table>,
{
    tables
        .into_iter()
        .filter(|t| !t.is_empty())
        .map(Table::boundaries)
        .fold(None, |acc: Option<(&[u8], &[u8])>, (min, max)| match acc {
            None => Some((min, max)),
            Some((lo, hi)) => Some((lo.min(min), hi.max(max))),
        })
        .map(|(lo, hi)| (lo.to_vec(), hi.to_vec()))
}
