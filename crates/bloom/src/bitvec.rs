//! Fixed-size bit array backing the [`BloomFilter`](crate::BloomFilter).

use crate::{BloomError, Result};

/// A fixed-length vector of bits stored LSB-first in a byte buffer.
///
/// Bit `i` lives in byte `i / 8` at position `i % 8`. The length is fixed at
/// construction; indexing past it returns [`BloomError::OutOfBounds`].
#[derive(Clone, PartialEq, Eq)]
pub struct BitVector {
    bytes: Vec<u8>,
    len: u64,
}

impl BitVector {
    /// Creates a zeroed bit vector holding `len` bits.
    pub fn new(len: u64) -> Self {
        Self {
            bytes: vec![0u8; Self::byte_len_for(len)],
            len,
        }
    }

    /// Wraps raw bytes as a bit vector of `len` bits.
    ///
    /// # Errors
    ///
    /// Returns [`BloomError::Decode`] if `bytes` is not exactly the number of
    /// bytes needed for `len` bits.
    pub fn from_bytes(bytes: Vec<u8>, len: u64) -> Result<Self> {
        let expected = Self::byte_len_for(len);
        if bytes.len() != expected {
            return Err(BloomError::Decode(format!(
                "bit vector of {} bits needs {} bytes, got {}",
                len,
                expected,
                bytes.len()
            )));
        }
        Ok(Self { bytes, len })
    }

    /// Number of bytes needed to hold `len` bits.
    #[must_use]
    pub fn byte_len_for(len: u64) -> usize {
        len.div_ceil(8) as usize
    }

    /// Sets bit `index` to 1.
    pub fn set(&mut self, index: u64) -> Result<()> {
        self.check(index)?;
        self.set_bit(index);
        Ok(())
    }

    /// Unchecked [`set`](Self::set) for callers that derive `index` modulo
    /// [`len`](Self::len).
    pub(crate) fn set_bit(&mut self, index: u64) {
        self.bytes[(index / 8) as usize] |= 1 << (index % 8);
    }

    /// Returns whether bit `index` is 1.
    pub fn is_set(&self, index: u64) -> Result<bool> {
        self.check(index)?;
        Ok((self.bytes[(index / 8) as usize] >> (index % 8)) & 1 == 1)
    }

    /// Number of addressable bits.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of bits currently set.
    #[must_use]
    pub fn count_ones(&self) -> u64 {
        self.bytes.iter().map(|b| u64::from(b.count_ones())).sum()
    }

    /// Raw backing bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn check(&self, index: u64) -> Result<()> {
        if index >= self.len {
            return Err(BloomError::OutOfBounds {
                index,
                len: self.len,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for BitVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitVector")
            .field("len", &self.len)
            .field("ones", &self.count_ones())
            .finish()
    }
}
