//! K-way merge over sorted record streams.
//!
//! Produces records in ascending key order. When the same key appears in
//! more than one stream, only the record from the **lowest stream index** is
//! emitted; callers order streams most-recent first so the newest version
//! wins.
//!
//! This is the core primitive for compaction: decode every input table,
//! merge, and write the result as one new table.

use memtable::Record;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// The current head of one stream, used for heap ordering.
struct HeapEntry {
    record: Record,
    /// Index into the `streams` vector; lower is more recent.
    source: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.record.key == other.record.key && self.source == other.source
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse both comparisons so the smallest
        // key pops first and, on a tie, the lowest source index.
        other
            .record
            .key
            .cmp(&self.record.key)
            .then_with(|| other.source.cmp(&self.source))
    }
}

/// Merges sorted streams into one sorted, duplicate-free stream.
///
/// Tombstones are yielded like any other record; see [`merge`] for the
/// variant that drops them.
pub struct MergeIterator {
    streams: Vec<std::vec::IntoIter<Record>>,
    heap: BinaryHeap<HeapEntry>,
}

impl MergeIterator {
    /// Each inner vector must be ascending by key with no duplicates.
    pub fn new(streams: Vec<Vec<Record>>) -> Self {
        let mut iters: Vec<_> = streams.into_iter().map(Vec::into_iter).collect();
        let mut heap = BinaryHeap::with_capacity(iters.len());

        for (source, iter) in iters.iter_mut().enumerate() {
            if let Some(record) = iter.next() {
                heap.push(HeapEntry { record, source });
            }
        }

        Self {
            streams: iters,
            heap,
        }
    }

    fn advance(&mut self, source: usize) {
        if let Some(record) = self.streams[source].next() {
            self.heap.push(HeapEntry { record, source });
        }
    }
}

impl Iterator for MergeIterator {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let top = self.heap.pop()?;
        self.advance(top.source);

        // Older versions of the same key sit directly below in the heap.
        while self
            .heap
            .peek()
            .is_some_and(|peek| peek.record.key == top.record.key)
        {
            if let Some(dup) = self.heap.pop() {
                self.advance(dup.source);
            }
        }

        Some(top.record)
    }
}

/// Merges `streams` (most recent first) and drops tombstones.
///
/// Only safe when no older data for these keys exists anywhere else.
#[must_use]
pub fn merge(streams: Vec<Vec<Record>>) -> Vec<Record> {
    MergeIterator::new(streams)
        .filter(|r| !r.tombstone)
        .collect()
}

/// Merges `streams` (most recent first), keeping winning tombstones so they
/// keep shadowing older data in deeper levels.
#[must_use]
pub fn merge_keep_tombstones(streams: Vec<Vec<Record>>) -> Vec<Record> {
    MergeIterator::new(streams).collect()
}
