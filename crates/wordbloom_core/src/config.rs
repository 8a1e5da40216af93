//! Filter configuration and the preset false-positive targets.

use crate::consts::{FILE_EXT, FILE_PREFIX};
use crate::errors::{BloomError, Result};
use crate::hashing::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;
use std::fmt;

/// Bit count (M) plus the ordered hash algorithms (K of them).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    bit_count: u64,
    algorithms: Vec<HashAlgorithm>,
}

impl FilterConfig {
    pub fn new(bit_count: u64, algorithms: Vec<HashAlgorithm>) -> Result<Self> {
        let cfg = Self { bit_count, algorithms };
        cfg.validate()?;
        Ok(cfg)
    }

    /// M bits with the first `k` algorithms of [`HashAlgorithm::ORDERED`].
    pub fn with_hash_count(bit_count: u64, k: usize) -> Result<Self> {
        Self::new(bit_count, HashAlgorithm::first(k)?)
    }

    pub fn from_names<S: AsRef<str>>(bit_count: u64, names: &[S]) -> Result<Self> {
        let algorithms = names
            .iter()
            .map(|n| n.as_ref().parse::<HashAlgorithm>())
            .collect::<Result<Vec<_>>>()?;
        Self::new(bit_count, algorithms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bit_count == 0 {
            return Err(BloomError::InvalidConfiguration("bit count must be at least 1".into()));
        }
        if self.algorithms.is_empty() {
            return Err(BloomError::InvalidConfiguration(
                "at least one hash algorithm is required".into(),
            ));
        }
        Ok(())
    }

    pub fn bit_count(&self) -> u64 {
        self.bit_count
    }

    pub fn hash_count(&self) -> usize {
        self.algorithms.len()
    }

    pub fn algorithms(&self) -> &[HashAlgorithm] {
        &self.algorithms
    }

    /// Size of the persisted bit vector in bytes.
    pub fn byte_len(&self) -> u64 {
        self.bit_count.div_ceil(8)
    }

    /// `bitarray_{K}_{M}.bin`
    pub fn file_name(&self) -> String {
        format!("{FILE_PREFIX}_{}_{}.{FILE_EXT}", self.hash_count(), self.bit_count)
    }
}

impl fmt::Display for FilterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.algorithms.iter().map(|a| a.name()).collect();
        write!(f, "m={} k={} [{}]", self.bit_count, self.hash_count(), names.join(","))
    }
}

/// Target false-positive rates the filter files are usually built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    FivePercent,
    OnePercent,
    HalfPercent,
    TenthPercent,
}

impl Preset {
    pub const ALL: [Preset; 4] =
        [Preset::FivePercent, Preset::OnePercent, Preset::HalfPercent, Preset::TenthPercent];

    pub fn false_positive_rate(&self) -> f64 {
        match self {
            Preset::FivePercent => 0.05,
            Preset::OnePercent => 0.01,
            Preset::HalfPercent => 0.005,
            Preset::TenthPercent => 0.001,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Preset::FivePercent => "fp_five_percent",
            Preset::OnePercent => "fp_one_percent",
            Preset::HalfPercent => "fp_half_percent",
            Preset::TenthPercent => "fp_tenth_percent",
        }
    }

    /// (M, K) of the published filter files, sized for [`crate::consts::CORPUS_ELEMENTS`].
    pub fn reference_size(&self) -> (u64, usize) {
        match self {
            Preset::FivePercent => (89_440_449, 4),
            Preset::OnePercent => (137_491_831, 7),
            Preset::HalfPercent => (158_186_414, 8),
            Preset::TenthPercent => (206_237_746, 10),
        }
    }

    /// Configuration matching the published `bitarray_{K}_{M}.bin` files.
    pub fn reference(&self) -> Result<FilterConfig> {
        let (bits, k) = self.reference_size();
        FilterConfig::with_hash_count(bits, k)
    }

    /// Configuration for `elements` insertions at this preset's rate,
    /// sized by formula. Use [`Preset::reference`] to interoperate with
    /// existing filter files.
    pub fn config(&self, elements: u64) -> Result<FilterConfig> {
        let p = self.false_positive_rate();
        FilterConfig::with_hash_count(optimal_bit_count(elements, p), optimal_hash_count(p))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// k = round(-log2 p), at least 1.
pub fn optimal_hash_count(p: f64) -> usize {
    (-p.log2()).round().max(1.0) as usize
}

/// m = ceil(-log2(p) * n / ln 2), using the unrounded k.
pub fn optimal_bit_count(elements: u64, p: f64) -> u64 {
    ((-p.log2()) * elements as f64 / LN_2).ceil().max(1.0) as u64
}

/// (1 - e^(-kn/m))^k
pub fn expected_false_positive_rate(bit_count: u64, hash_count: usize, elements: u64) -> f64 {
    if bit_count == 0 {
        return 1.0;
    }
    let k = hash_count as f64;
    let exponent = -k * elements as f64 / bit_count as f64;
    (1.0 - exponent.exp()).powi(hash_count as i32)
}
