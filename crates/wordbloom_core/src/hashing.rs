//! Digest algorithms and the element → bit-index mapping.
//!
//! Every index is the algorithm's digest read as a big-endian unsigned
//! integer, reduced modulo the filter's bit count. There is no seed or
//! salt, so indices are stable across runs and across processes.

use crate::config::FilterConfig;
use crate::consts::XOF_OUTPUT_LEN;
use crate::errors::{BloomError, Result};
use blake2::{Blake2b512, Blake2s256};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha512};
use sha3::{Sha3_224, Sha3_256, Sha3_512, Shake128, Shake256};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "md5")]
    Md5,
    #[serde(rename = "sha1")]
    Sha1,
    #[serde(rename = "sha224")]
    Sha224,
    #[serde(rename = "sha256")]
    Sha256,
    #[serde(rename = "sha512")]
    Sha512,
    #[serde(rename = "sha3_224")]
    Sha3_224,
    #[serde(rename = "sha3_256")]
    Sha3_256,
    #[serde(rename = "sha3_512")]
    Sha3_512,
    #[serde(rename = "blake2s")]
    Blake2s,
    #[serde(rename = "blake2b")]
    Blake2b,
    #[serde(rename = "blake3")]
    Blake3,
    #[serde(rename = "shake_128")]
    Shake128,
    #[serde(rename = "shake_256")]
    Shake256,
}

impl HashAlgorithm {
    /// Selection order used when only a hash count is given. The first ten
    /// reproduce the reference filter files; the rest extend it.
    pub const ORDERED: [HashAlgorithm; 13] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha3_224,
        HashAlgorithm::Blake2s,
        HashAlgorithm::Sha3_512,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha3_256,
        HashAlgorithm::Blake2b,
        HashAlgorithm::Shake256,
        HashAlgorithm::Shake128,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha512,
        HashAlgorithm::Blake3,
    ];

    /// The first `k` algorithms of [`HashAlgorithm::ORDERED`].
    pub fn first(k: usize) -> Result<Vec<HashAlgorithm>> {
        if k == 0 || k > Self::ORDERED.len() {
            return Err(BloomError::InvalidConfiguration(format!(
                "hash count must be between 1 and {}, got {k}",
                Self::ORDERED.len()
            )));
        }
        Ok(Self::ORDERED[..k].to_vec())
    }

    /// Digest length in bytes. SHAKE variants are pinned to a fixed length.
    pub fn output_len(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha224 | HashAlgorithm::Sha3_224 => 28,
            HashAlgorithm::Sha256 | HashAlgorithm::Sha3_256 => 32,
            HashAlgorithm::Sha512 | HashAlgorithm::Sha3_512 => 64,
            HashAlgorithm::Blake2s | HashAlgorithm::Blake3 => 32,
            HashAlgorithm::Blake2b => 64,
            HashAlgorithm::Shake128 | HashAlgorithm::Shake256 => XOF_OUTPUT_LEN,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Sha3_224 => "sha3_224",
            HashAlgorithm::Sha3_256 => "sha3_256",
            HashAlgorithm::Sha3_512 => "sha3_512",
            HashAlgorithm::Blake2s => "blake2s",
            HashAlgorithm::Blake2b => "blake2b",
            HashAlgorithm::Blake3 => "blake3",
            HashAlgorithm::Shake128 => "shake_128",
            HashAlgorithm::Shake256 => "shake_256",
        }
    }

    /// Full digest of `data`, `output_len()` bytes long.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Md5 => md5::compute(data).0.to_vec(),
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha224 => Sha224::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
            HashAlgorithm::Sha3_224 => Sha3_224::digest(data).to_vec(),
            HashAlgorithm::Sha3_256 => Sha3_256::digest(data).to_vec(),
            HashAlgorithm::Sha3_512 => Sha3_512::digest(data).to_vec(),
            HashAlgorithm::Blake2s => Blake2s256::digest(data).to_vec(),
            HashAlgorithm::Blake2b => Blake2b512::digest(data).to_vec(),
            HashAlgorithm::Blake3 => blake3::hash(data).as_bytes().to_vec(),
            HashAlgorithm::Shake128 => xof::<Shake128>(data).to_vec(),
            HashAlgorithm::Shake256 => xof::<Shake256>(data).to_vec(),
        }
    }

    /// Bit index of `data` in a vector of `bit_count` bits. `bit_count`
    /// must be at least 1; [`HashIndexer`] guarantees it.
    #[inline]
    pub(crate) fn index(&self, data: &[u8], bit_count: u64) -> u64 {
        match self {
            HashAlgorithm::Md5 => reduce_be(&md5::compute(data).0, bit_count),
            HashAlgorithm::Sha1 => reduce_be(&Sha1::digest(data), bit_count),
            HashAlgorithm::Sha224 => reduce_be(&Sha224::digest(data), bit_count),
            HashAlgorithm::Sha256 => reduce_be(&Sha256::digest(data), bit_count),
            HashAlgorithm::Sha512 => reduce_be(&Sha512::digest(data), bit_count),
            HashAlgorithm::Sha3_224 => reduce_be(&Sha3_224::digest(data), bit_count),
            HashAlgorithm::Sha3_256 => reduce_be(&Sha3_256::digest(data), bit_count),
            HashAlgorithm::Sha3_512 => reduce_be(&Sha3_512::digest(data), bit_count),
            HashAlgorithm::Blake2s => reduce_be(&Blake2s256::digest(data), bit_count),
            HashAlgorithm::Blake2b => reduce_be(&Blake2b512::digest(data), bit_count),
            HashAlgorithm::Blake3 => reduce_be(blake3::hash(data).as_bytes(), bit_count),
            HashAlgorithm::Shake128 => reduce_be(&xof::<Shake128>(data), bit_count),
            HashAlgorithm::Shake256 => reduce_be(&xof::<Shake256>(data), bit_count),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = BloomError;

    /// Accepts hashlib-style names, case-insensitive, `-` or `_` separated
    /// (`sha3_256`, `SHA3-256`, `shake128`).
    fn from_str(s: &str) -> Result<Self> {
        let want = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        Self::ORDERED
            .iter()
            .copied()
            .find(|a| a.name().replace('_', "") == want)
            .ok_or_else(|| BloomError::InvalidConfiguration(format!("unknown hash algorithm: {s}")))
    }
}

fn xof<H>(data: &[u8]) -> [u8; XOF_OUTPUT_LEN]
where
    H: Default + sha3::digest::Update + sha3::digest::ExtendableOutput,
{
    use sha3::digest::XofReader;
    let mut h = H::default();
    sha3::digest::Update::update(&mut h, data);
    let mut out = [0u8; XOF_OUTPUT_LEN];
    h.finalize_xof().read(&mut out);
    out
}

/// `digest` read as a big-endian unsigned integer, modulo `m` (`m >= 1`).
#[inline]
pub(crate) fn reduce_be(digest: &[u8], m: u64) -> u64 {
    let m = m as u128;
    digest.iter().fold(0u128, |acc, &b| ((acc << 8) | b as u128) % m) as u64
}

/// Maps elements to their K bit positions for one filter configuration.
#[derive(Clone, Debug)]
pub struct HashIndexer {
    bit_count: u64,
    algorithms: Vec<HashAlgorithm>,
}

impl HashIndexer {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { bit_count: config.bit_count(), algorithms: config.algorithms().to_vec() })
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

    /// Indices in algorithm order, computed lazily.
    #[inline]
    pub fn indices<'a>(&'a self, element: &'a [u8]) -> impl Iterator<Item = u64> + 'a {
        self.algorithms.iter().map(move |a| a.index(element, self.bit_count))
    }

    pub fn compute_indices(&self, element: &[u8]) -> Vec<u64> {
        self.indices(element).collect()
    }
}
