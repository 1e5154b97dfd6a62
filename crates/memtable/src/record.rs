/// Fixed per-record bookkeeping charged to the memtable size estimate.
pub const RECORD_OVERHEAD: usize = 16;

/// A key/value pair, or a tombstone marking the key deleted.
///
/// Keys order by raw byte-lexicographic comparison. A tombstone's value is
/// meaningless and is kept empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub tombstone: bool,
}

impl Record {
    /// A live key/value record.
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            tombstone: false,
        }
    }

    /// A tombstone for `key`.
    pub fn tombstone(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: Vec::new(),
            tombstone: true,
        }
    }

    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.tombstone
    }

    /// Bytes this record contributes to the memtable size estimate.
    #[must_use]
    pub fn size_estimate(&self) -> usize {
        self.key.len() + self.value.len() + RECORD_OVERHEAD
    }
}
