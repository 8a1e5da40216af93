//! On-disk filter files.
//!
//! Bits file (`bitarray_{K}_{M}.bin`): exactly the packed bit bytes, no
//! header. Its only validity check on load is the byte length.
//!
//! Sidecar (`bitarray_{K}_{M}.json`, optional): M, the algorithm names,
//! inserted element count, crc32 of the bits, creation time. When present
//! it must agree with the requested configuration and the bits.

use crate::config::FilterConfig;
use crate::consts::META_EXT;
use crate::errors::Result;
use crate::hashing::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

#[cfg(unix)]
fn fsync_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    let f = fs::OpenOptions::new().read(true).custom_flags(libc::O_DIRECTORY).open(dir)?;
    f.sync_all()
}
#[cfg(not(unix))]
fn fsync_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Write `bytes` to `path` through a temp file in the same directory.
/// The temp file is removed if anything fails before the rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::Builder::new().prefix(".wordbloom_").tempfile_in(dir)?;
    tmp.as_file_mut().write_all(bytes)?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path)?;
    let _ = fsync_dir(path);
    Ok(())
}

/// Contents of `path`, or `None` if it does not exist.
pub fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(b) => Ok(Some(b)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterMeta {
    pub bit_count: u64,
    pub algorithms: Vec<HashAlgorithm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<u64>,
    pub crc32: u32,
    pub created_at: String,
}

impl FilterMeta {
    pub fn new(config: &FilterConfig, bits: &[u8], elements: Option<u64>) -> Result<Self> {
        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("timestamp: {e}")))?;
        Ok(Self {
            bit_count: config.bit_count(),
            algorithms: config.algorithms().to_vec(),
            elements,
            crc32: crc32(bits),
            created_at,
        })
    }

    /// Sidecar location for a bits file.
    pub fn path_for(bits_path: &Path) -> PathBuf {
        bits_path.with_extension(META_EXT)
    }

    pub fn load(bits_path: &Path) -> Result<Option<Self>> {
        match read_if_exists(&Self::path_for(bits_path))? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn save_atomic(&self, bits_path: &Path) -> Result<()> {
        let body = serde_json::to_vec_pretty(self)?;
        write_atomic(&Self::path_for(bits_path), &body)
    }

    pub fn matches(&self, config: &FilterConfig) -> bool {
        self.bit_count == config.bit_count() && self.algorithms == config.algorithms()
    }
}
