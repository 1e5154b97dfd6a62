//! # Memtable
//!
//! The in-memory ordered buffer of the most recent writes. Records live in
//! an [`AvlTree`] keyed by raw byte order, and the memtable keeps a running
//! size estimate (`key + value + RECORD_OVERHEAD` per record) that the engine
//! compares against its flush threshold.
//!
//! The memtable itself has no locking; the engine wraps it in a reader/writer
//! lock and performs flush-and-clear while holding the write side.
mod avl;
mod record;

pub use avl::{AvlTree, Iter};
pub use record::{Record, RECORD_OVERHEAD};

use thiserror::Error;

/// Why a memtable lookup produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemtableError {
    /// The memtable holds no records at all.
    #[error("memtable is empty")]
    Empty,
    /// The memtable holds records, but not this key.
    #[error("key not found in memtable")]
    NotFound,
}

/// What [`Memtable::delete`] did with the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// A live record was overwritten in place by a tombstone.
    Tombstoned,
    /// The key was already a tombstone; nothing changed.
    AlreadyDeleted,
    /// The key is not in the memtable. The caller decides whether a
    /// tombstone is needed to shadow durable storage.
    Absent,
}

#[derive(Debug, Default)]
pub struct Memtable {
    tree: AvlTree,
    approx_size: usize,
}

impl Memtable {
    pub fn new() -> Self {
        Self {
            tree: AvlTree::new(),
            approx_size: 0,
        }
    }

    /// Inserts or overwrites by key.
    pub fn put(&mut self, record: Record) {
        self.approx_size += record.size_estimate();
        if let Some(old) = self.tree.insert(record) {
            self.approx_size = self.approx_size.saturating_sub(old.size_estimate());
        }
    }

    /// Returns the stored record for `key`, which may be a tombstone.
    pub fn get(&self, key: &[u8]) -> Result<&Record, MemtableError> {
        if self.tree.is_empty() {
            return Err(MemtableError::Empty);
        }
        self.tree.get(key).ok_or(MemtableError::NotFound)
    }

    /// Logical delete of a key held in the memtable.
    ///
    /// A live record is overwritten by a tombstone carrying the same key.
    /// Keys absent from the memtable are left to the caller.
    pub fn delete(&mut self, key: &[u8]) -> DeleteOutcome {
        match self.tree.get(key) {
            None => DeleteOutcome::Absent,
            Some(r) if r.is_tombstone() => DeleteOutcome::AlreadyDeleted,
            Some(_) => {
                self.put(Record::tombstone(key));
                DeleteOutcome::Tombstoned
            }
        }
    }

    /// All records in ascending key order. Used for flush.
    #[must_use]
    pub fn get_all(&self) -> Vec<Record> {
        self.tree.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn approx_size(&self) -> usize {
        self.approx_size
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Drops every record and resets the size estimate.
    pub fn clear(&mut self) {
        self.tree.clear();
        self.approx_size = 0;
    }

    #[cfg(test)]
    pub(crate) fn tree(&self) -> &AvlTree {
        &self.tree
    }
}

#[cfg(test)]
mod tests;
