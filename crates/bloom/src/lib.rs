//! # Bloom Filter
//!
//! A space-efficient probabilistic data structure for set membership testing.
//!
//! A bloom filter can tell you with certainty that a key is **not** in the set
//! (no false negatives), but may occasionally report that a key **is** in the
//! set when it isn't (false positives). The false positive rate depends on the
//! number of bits and hash functions used.
//!
//! ## Usage in StrataKV
//!
//! Each SSTable embeds a bloom filter built from its keys. During point lookups
//! the level scan checks the bloom filter first -- if it says "not present", the
//! table file is never opened.
//!
//! ## Sizing
//!
//! For `n` expected items and a target false positive rate `p`:
//!
//! ```text
//! m = ceil(-n * ln(p) / ln(2)^2)     bits
//! k = round((m / n) * ln(2))         hash functions
//! ```
//!
//! The serialized form stores only the bit bytes, so `n` and `p` must be
//! supplied again on [`BloomFilter::read_from`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use bloom::BloomFilter;
//!
//! let mut bf = BloomFilter::new(1000, 0.01);
//! bf.insert(b"hello");
//! assert!(bf.may_contain(b"hello"));
//! ```
mod bitvec;

pub use bitvec::BitVector;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use thiserror::Error;
use xxhash_rust::xxh64::xxh64;

/// Safety cap: a serialized bit vector should not exceed 128 MiB.
const MAX_BLOOM_BYTES: u64 = 128 * 1024 * 1024;

/// Errors produced by the bit vector and bloom filter.
#[derive(Debug, Error)]
pub enum BloomError {
    /// A bit index past the end of the vector.
    #[error("bit index {index} is beyond bounds {len}")]
    OutOfBounds { index: u64, len: u64 },

    /// Serialized bytes that do not match the expected shape.
    #[error("corrupt bloom filter: {0}")]
    Decode(String),

    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, BloomError>;

/// The `(n, p)` pair a filter is sized from.
///
/// Every table in a store is built and reconstructed with the same params,
/// because the on-disk bytes do not record them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomParams {
    pub expected_items: usize,
    pub false_positive_rate: f64,
}

impl BloomParams {
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        Self {
            expected_items,
            false_positive_rate,
        }
    }

    /// Returns `(num_bits, num_hashes)` for these params.
    ///
    /// # Panics
    ///
    /// Panics if `expected_items` is 0 or `false_positive_rate` is not in `(0, 1)`.
    #[must_use]
    pub fn dimensions(&self) -> (u64, u32) {
        assert!(self.expected_items > 0, "expected_items must be > 0");
        assert!(
            self.false_positive_rate > 0.0 && self.false_positive_rate < 1.0,
            "false_positive_rate must be in (0, 1)"
        );

        let n = self.expected_items as f64;
        let ln2 = std::f64::consts::LN_2;
        let m = (-n * self.false_positive_rate.ln() / ln2.powi(2)).ceil() as u64;
        let m = m.max(8);

        let k = ((m as f64 / n) * ln2).round() as u32;
        (m, k.max(1))
    }

    /// Builds an empty filter sized from these params.
    #[must_use]
    pub fn build(&self) -> BloomFilter {
        BloomFilter::new(self.expected_items, self.false_positive_rate)
    }
}

/// A bloom filter over a [`BitVector`] with `k` seeded hash functions.
///
/// Hash function `i` is 64-bit xxHash with seed `i`, reduced modulo the bit
/// count.
#[derive(Clone)]
pub struct BloomFilter {
    bits: BitVector,
    num_bits: u64,
    num_hashes: u32,
}

impl BloomFilter {
    /// Creates a new bloom filter sized for `expected_items` with the given
    /// target `false_positive_rate`.
    ///
    /// # Panics
    ///
    /// Panics if `expected_items` is 0 or `false_positive_rate` is not in `(0, 1)`.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        let (num_bits, num_hashes) =
            BloomParams::new(expected_items, false_positive_rate).dimensions();
        Self {
            bits: BitVector::new(num_bits),
            num_bits,
            num_hashes,
        }
    }

    /// Inserts a key into the bloom filter.
    pub fn insert(&mut self, key: &[u8]) {
        for seed in 0..self.num_hashes {
            let idx = self.bit_index(key, seed);
            self.bits.set_bit(idx);
        }
    }

    /// Returns `true` if the key **might** be in the set, `false` if it is
    /// **definitely not** in the set.
    #[must_use]
    pub fn may_contain(&self, key: &[u8]) -> bool {
        (0..self.num_hashes)
            .all(|seed| matches!(self.bits.is_set(self.bit_index(key, seed)), Ok(true)))
    }

    /// Returns the number of bits in the filter.
    #[must_use]
    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    /// Returns the number of hash functions.
    #[must_use]
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Returns the underlying bit vector.
    #[must_use]
    pub fn bits(&self) -> &BitVector {
        &self.bits
    }

    /// Returns the size of the serialized bloom filter in bytes.
    ///
    /// Layout: `byte_len(u64) + bits`.
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        8 + self.bits.as_bytes().len()
    }

    /// Serializes the bloom filter to a writer.
    ///
    /// Wire format (little-endian):
    /// ```text
    /// [byte_len: u64][bits: byte_len bytes]
    /// ```
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let bytes = self.bits.as_bytes();
        w.write_u64::<LittleEndian>(bytes.len() as u64)?;
        w.write_all(bytes)?;
        Ok(())
    }

    /// Serializes the bloom filter into a fresh buffer.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.serialized_size());
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Reconstructs a bloom filter from a reader.
    ///
    /// `expected_items` and `false_positive_rate` must be the values the
    /// filter was built with; the length prefix is checked against them.
    ///
    /// # Errors
    ///
    /// [`BloomError::Decode`] if the length prefix disagrees with the params or
    /// the bytes are truncated, [`BloomError::Io`] on other read failures.
    pub fn read_from<R: Read>(
        r: &mut R,
        expected_items: usize,
        false_positive_rate: f64,
    ) -> Result<Self> {
        let (num_bits, num_hashes) =
            BloomParams::new(expected_items, false_positive_rate).dimensions();

        let byte_len = r.read_u64::<LittleEndian>().map_err(truncated)?;
        if byte_len > MAX_BLOOM_BYTES {
            return Err(BloomError::Decode(format!(
                "bloom filter too large: {} bytes",
                byte_len
            )));
        }
        let expected = BitVector::byte_len_for(num_bits) as u64;
        if byte_len != expected {
            return Err(BloomError::Decode(format!(
                "length prefix {} does not match {} bytes expected for n={}, p={}",
                byte_len, expected, expected_items, false_positive_rate
            )));
        }

        let mut bytes = vec![0u8; byte_len as usize];
        r.read_exact(&mut bytes).map_err(truncated)?;

        Ok(Self {
            bits: BitVector::from_bytes(bytes, num_bits)?,
            num_bits,
            num_hashes,
        })
    }

    fn bit_index(&self, key: &[u8], seed: u32) -> u64 {
        xxh64(key, u64::from(seed)) % self.num_bits
    }
}

fn truncated(e: io::Error) -> BloomError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        BloomError::Decode("truncated bloom filter".to_string())
    } else {
        BloomError::Io(e)
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("num_bits", &self.num_bits)
            .field("num_hashes", &self.num_hashes)
            .field("bytes", &self.bits.as_bytes().len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
