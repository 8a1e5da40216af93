//! Fixed-length packed bit vector backing a Bloom filter.
//!
//! Bit order is most-significant-bit first: bit `i` lives in byte `i / 8`
//! under mask `0x80 >> (i % 8)`. The serialized form is exactly the
//! `ceil(bit_count / 8)` storage bytes, padding bits in the last byte zero.

use crate::errors::{BloomError, Result};
use std::sync::atomic::{AtomicU8, Ordering};

#[inline]
pub fn byte_len(bit_count: u64) -> usize {
    bit_count.div_ceil(8) as usize
}

#[inline]
fn mask(index: u64) -> u8 {
    0x80u8 >> (index & 7)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitVector {
    bit_count: u64,
    bytes: Vec<u8>,
}

impl BitVector {
    /// All-zero vector of `bit_count` bits.
    pub fn new(bit_count: u64) -> Result<Self> {
        if bit_count == 0 {
            return Err(BloomError::InvalidSize);
        }
        Ok(Self { bit_count, bytes: vec![0u8; byte_len(bit_count)] })
    }

    /// Rebuild from serialized bytes; the length must be exactly `ceil(bit_count / 8)`.
    pub fn from_bytes(bytes: &[u8], bit_count: u64) -> Result<Self> {
        Self::from_vec(bytes.to_vec(), bit_count)
    }

    /// Same as [`BitVector::from_bytes`] without copying the buffer.
    pub fn from_vec(bytes: Vec<u8>, bit_count: u64) -> Result<Self> {
        if bit_count == 0 {
            return Err(BloomError::InvalidSize);
        }
        let expected = byte_len(bit_count);
        if bytes.len() != expected {
            return Err(BloomError::SizeMismatch {
                expected: expected as u64,
                actual: bytes.len() as u64,
            });
        }
        let mut v = Self { bit_count, bytes };
        v.clear_padding();
        Ok(v)
    }

    pub fn bit_count(&self) -> u64 {
        self.bit_count
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn get(&self, index: u64) -> Result<bool> {
        self.check(index)?;
        Ok(self.test(index))
    }

    /// Set bit `index` to 1. Idempotent.
    pub fn set(&mut self, index: u64) -> Result<()> {
        self.check(index)?;
        self.mark(index);
        Ok(())
    }

    pub fn count_set(&self) -> u64 {
        self.bytes.iter().map(|b| b.count_ones() as u64).sum()
    }

    /// Set bits in `[start, end)`; `end` is clamped to the vector length.
    pub fn count_range(&self, start: u64, end: u64) -> u64 {
        let end = end.min(self.bit_count);
        if start >= end {
            return 0;
        }
        let mut n = 0u64;
        let mut i = start;
        while i < end && i & 7 != 0 {
            n += self.test(i) as u64;
            i += 1;
        }
        while i + 8 <= end {
            n += self.bytes[(i >> 3) as usize].count_ones() as u64;
            i += 8;
        }
        while i < end {
            n += self.test(i) as u64;
            i += 1;
        }
        n
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    #[inline]
    fn check(&self, index: u64) -> Result<()> {
        if index >= self.bit_count {
            return Err(BloomError::IndexOutOfRange { index, bit_count: self.bit_count });
        }
        Ok(())
    }

    /// Lookup for indices already reduced modulo `bit_count`; panics otherwise.
    #[inline]
    pub(crate) fn test(&self, index: u64) -> bool {
        assert!(index < self.bit_count, "bit index {index} out of range for {} bits", self.bit_count);
        self.bytes[(index >> 3) as usize] & mask(index) != 0
    }

    #[inline]
    pub(crate) fn mark(&mut self, index: u64) {
        assert!(index < self.bit_count, "bit index {index} out of range for {} bits", self.bit_count);
        self.bytes[(index >> 3) as usize] |= mask(index);
    }

    fn clear_padding(&mut self) {
        let tail = (self.bit_count & 7) as u32;
        if tail != 0 {
            if let Some(last) = self.bytes.last_mut() {
                *last &= !(0xFFu8 >> tail);
            }
        }
    }
}

/// Shared bit storage for parallel builds. Sets are per-byte atomic ORs,
/// so concurrent writers never lose an update.
pub struct AtomicBitVector {
    bit_count: u64,
    bytes: Vec<AtomicU8>,
}

impl AtomicBitVector {
    pub fn new(bit_count: u64) -> Result<Self> {
        if bit_count == 0 {
            return Err(BloomError::InvalidSize);
        }
        let bytes = (0..byte_len(bit_count)).map(|_| AtomicU8::new(0)).collect();
        Ok(Self { bit_count, bytes })
    }

    #[inline]
    pub(crate) fn mark(&self, index: u64) {
        assert!(index < self.bit_count, "bit index {index} out of range for {} bits", self.bit_count);
        self.bytes[(index >> 3) as usize].fetch_or(mask(index), Ordering::Relaxed);
    }

    /// Freeze into an ordinary [`BitVector`].
    pub fn into_bit_vector(self) -> BitVector {
        let bytes = self.bytes.into_iter().map(AtomicU8::into_inner).collect();
        BitVector { bit_count: self.bit_count, bytes }
    }
}
