pub mod consts;
pub mod errors;
pub mod bitvec;
pub mod hashing;
pub mod config;
pub mod corpus;
pub mod persist;
pub mod filter;
pub mod eval;

pub use bitvec::BitVector;
pub use config::{FilterConfig, Preset};
pub use corpus::WordList;
pub use errors::{BloomError, Result};
pub use eval::{evaluate, Classification, Counts};
pub use filter::{BloomFilter, Bucket, Origin, RejectReason};
pub use hashing::{HashAlgorithm, HashIndexer};
