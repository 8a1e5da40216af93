//! Insert-then-freeze Bloom filter over raw byte-string elements.

use crate::bitvec::{AtomicBitVector, BitVector};
use crate::config::{expected_false_positive_rate, FilterConfig};
use crate::errors::{BloomError, Result};
use crate::hashing::HashIndexer;
use crate::persist::{crc32, read_if_exists, write_atomic, FilterMeta};
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct BloomFilter {
    config: FilterConfig,
    indexer: HashIndexer,
    bits: BitVector,
}

/// Why a persisted filter file was not used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    SizeMismatch { expected: u64, actual: u64 },
    ConfigMismatch,
    ChecksumMismatch { expected: u32, actual: u32 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected} bytes, found {actual}")
            }
            RejectReason::ConfigMismatch => write!(f, "sidecar describes a different configuration"),
            RejectReason::ChecksumMismatch { expected, actual } => {
                write!(f, "crc32 mismatch: expected {expected:08x}, found {actual:08x}")
            }
        }
    }
}

/// Where the filter returned by `load_or_build` came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Loaded,
    Built,
    Rebuilt(RejectReason),
}

enum Probe {
    Missing,
    Valid(BloomFilter),
    Rejected(RejectReason),
}

/// Set-bit count of one contiguous index range.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub start: u64,
    pub end: u64,
    pub set: u64,
    /// Share of all set bits that fall in this range.
    pub fraction: f64,
}

impl BloomFilter {
    /// Empty filter.
    pub fn new(config: FilterConfig) -> Result<Self> {
        let indexer = HashIndexer::new(&config)?;
        let bits = BitVector::new(config.bit_count())?;
        Ok(Self { config, indexer, bits })
    }

    pub fn build<I, E>(config: FilterConfig, corpus: I) -> Result<Self>
    where
        I: IntoIterator<Item = E>,
        E: AsRef<[u8]>,
    {
        let mut filter = Self::new(config)?;
        for element in corpus {
            filter.insert(element.as_ref());
        }
        Ok(filter)
    }

    /// Same bits as [`BloomFilter::build`], hashing elements across the rayon pool.
    pub fn build_parallel<E>(config: FilterConfig, corpus: &[E]) -> Result<Self>
    where
        E: AsRef<[u8]> + Sync,
    {
        let indexer = HashIndexer::new(&config)?;
        let shared = AtomicBitVector::new(config.bit_count())?;
        corpus.par_iter().for_each(|element| {
            for i in indexer.indices(element.as_ref()) {
                shared.mark(i);
            }
        });
        Ok(Self { config, indexer, bits: shared.into_bit_vector() })
    }

    /// Rebuild from a serialized bit vector. Fails with `SizeMismatch`
    /// unless `bytes` is exactly `ceil(M / 8)` long.
    pub fn from_bytes(config: FilterConfig, bytes: Vec<u8>) -> Result<Self> {
        let indexer = HashIndexer::new(&config)?;
        let bits = BitVector::from_vec(bytes, config.bit_count())?;
        Ok(Self { config, indexer, bits })
    }

    pub fn insert(&mut self, element: &[u8]) {
        for i in self.indexer.indices(element) {
            self.bits.mark(i);
        }
    }

    /// `false` means definitely never inserted; `true` may be a false positive.
    pub fn may_contain(&self, element: &[u8]) -> bool {
        self.indexer.indices(element).all(|i| self.bits.test(i))
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn indexer(&self) -> &HashIndexer {
        &self.indexer
    }

    pub fn bits(&self) -> &BitVector {
        &self.bits
    }

    pub fn bit_count(&self) -> u64 {
        self.bits.bit_count()
    }

    pub fn hash_count(&self) -> usize {
        self.indexer.hash_count()
    }

    pub fn count_set(&self) -> u64 {
        self.bits.count_set()
    }

    pub fn fill_ratio(&self) -> f64 {
        self.count_set() as f64 / self.bit_count() as f64
    }

    /// Textbook false-positive estimate for `elements` insertions.
    pub fn estimated_false_positive_rate(&self, elements: u64) -> f64 {
        expected_false_positive_rate(self.bit_count(), self.hash_count(), elements)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits.to_bytes()
    }

    /// Split the vector into `buckets` equal ranges (the last one takes the
    /// remainder) and count set bits in each.
    pub fn distribution(&self, buckets: usize) -> Vec<Bucket> {
        let n = buckets.max(1) as u64;
        let m = self.bit_count();
        let width = m / n;
        let total = self.count_set();
        (0..n)
            .map(|i| {
                let start = i * width;
                let end = if i + 1 == n { m } else { start + width };
                let set = self.bits.count_range(start, end);
                let fraction = if total == 0 { 0.0 } else { set as f64 / total as f64 };
                Bucket { start, end, set, fraction }
            })
            .collect()
    }

    /// Write the bits file and its sidecar. `elements` is recorded in the
    /// sidecar when known; `None` leaves it unset.
    pub fn save(&self, path: &Path, elements: Option<u64>) -> Result<()> {
        let bytes = self.bits.as_bytes();
        write_atomic(path, bytes)?;
        FilterMeta::new(&self.config, bytes, elements)?.save_atomic(path)?;
        info!(path = %path.display(), bytes = bytes.len(), "filter persisted");
        Ok(())
    }

    /// Load a persisted filter, rejecting a file of the wrong length.
    pub fn load(config: FilterConfig, path: &Path) -> Result<Self> {
        match Self::probe(config, path)? {
            Probe::Valid(filter) => Ok(filter),
            Probe::Missing => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
            .into()),
            Probe::Rejected(RejectReason::SizeMismatch { expected, actual }) => {
                Err(BloomError::SizeMismatch { expected, actual })
            }
            Probe::Rejected(reason) => {
                Err(io::Error::new(io::ErrorKind::InvalidData, reason.to_string()).into())
            }
        }
    }

    /// Use the file at `path` if it is valid for `config`; otherwise build
    /// from `corpus` and persist. The corpus is only opened when building.
    pub fn load_or_build<F, I, E>(config: FilterConfig, path: &Path, corpus: F) -> Result<(Self, Origin)>
    where
        F: FnOnce() -> Result<I>,
        I: IntoIterator<Item = E>,
        E: AsRef<[u8]>,
    {
        Self::resolve(config, path, |config| {
            let mut filter = Self::new(config)?;
            let mut elements = 0u64;
            for element in corpus()? {
                filter.insert(element.as_ref());
                elements += 1;
            }
            Ok((filter, elements))
        })
    }

    /// [`BloomFilter::load_or_build`] with a parallel build. `corpus` is
    /// only called, and the word list only materialized, when building.
    pub fn load_or_build_parallel<F, E>(
        config: FilterConfig,
        path: &Path,
        corpus: F,
    ) -> Result<(Self, Origin)>
    where
        F: FnOnce() -> Result<Vec<E>>,
        E: AsRef<[u8]> + Sync,
    {
        Self::resolve(config, path, |config| {
            let words = corpus()?;
            Ok((Self::build_parallel(config, &words)?, words.len() as u64))
        })
    }

    fn resolve<B>(config: FilterConfig, path: &Path, build: B) -> Result<(Self, Origin)>
    where
        B: FnOnce(FilterConfig) -> Result<(Self, u64)>,
    {
        let origin = match Self::probe(config.clone(), path)? {
            Probe::Valid(filter) => {
                info!(path = %path.display(), set = filter.count_set(), "filter loaded");
                return Ok((filter, Origin::Loaded));
            }
            Probe::Missing => Origin::Built,
            Probe::Rejected(reason) => {
                warn!(path = %path.display(), %reason, "persisted filter rejected, rebuilding");
                Origin::Rebuilt(reason)
            }
        };
        let (filter, elements) = build(config)?;
        info!(elements, set = filter.count_set(), bits = filter.bit_count(), "filter built");
        filter.save(path, Some(elements))?;
        Ok((filter, origin))
    }

    fn probe(config: FilterConfig, path: &Path) -> Result<Probe> {
        let expected = config.byte_len();
        let actual = match fs::metadata(path) {
            Ok(md) => md.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Probe::Missing),
            Err(e) => return Err(e.into()),
        };
        if actual != expected {
            return Ok(Probe::Rejected(RejectReason::SizeMismatch { expected, actual }));
        }
        let Some(bytes) = read_if_exists(path)? else {
            return Ok(Probe::Missing);
        };
        let sum = crc32(&bytes);
        match FilterMeta::load(path) {
            Ok(Some(meta)) => {
                if !meta.matches(&config) {
                    return Ok(Probe::Rejected(RejectReason::ConfigMismatch));
                }
                if meta.crc32 != sum {
                    return Ok(Probe::Rejected(RejectReason::ChecksumMismatch {
                        expected: meta.crc32,
                        actual: sum,
                    }));
                }
            }
            Ok(None) => debug!(path = %path.display(), "no sidecar, trusting length check"),
            Err(e) => warn!(path = %path.display(), error = %e, "unreadable sidecar ignored"),
        }
        match Self::from_bytes(config, bytes) {
            Ok(filter) => Ok(Probe::Valid(filter)),
            Err(BloomError::SizeMismatch { expected, actual }) => {
                Ok(Probe::Rejected(RejectReason::SizeMismatch { expected, actual }))
            }
            Err(e) => Err(e),
        }
    }
}
