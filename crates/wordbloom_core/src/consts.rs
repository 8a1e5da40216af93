// crates/wordbloom_core/src/consts.rs

/// Line count of the reference password corpus the presets were sized for.
pub const CORPUS_ELEMENTS: u64 = 14_344_392;

/// Pinned digest length for extendable-output (SHAKE) algorithms.
pub const XOF_OUTPUT_LEN: usize = 16;

/// Number of contiguous ranges in the bit distribution report.
pub const DISTRIBUTION_BUCKETS: usize = 20;

pub const FILE_PREFIX: &str = "bitarray";
pub const FILE_EXT: &str = "bin";
pub const META_EXT: &str = "json";

/// Newline delimiter for corpus and test word files.
pub const WORD_DELIM: u8 = b'\n';
