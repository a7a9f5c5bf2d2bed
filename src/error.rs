//! Error types for the distributed Bloom filter.

use thiserror::Error;

/// Errors that can occur when building, mutating, or decoding a filter.
#[derive(Debug, Error)]
pub enum DbfError {
    #[error("expected element count must be greater than zero")]
    ZeroElements,

    #[error("false positive rate {fpr} is outside the open interval (0, 1)")]
    InvalidFpr { fpr: f64 },

    #[error("hash chain must contain at least one digest")]
    ZeroHashFunctions,

    #[error("hash chain length {k} exceeds the maximum of {max}")]
    ChainTooLong { k: usize, max: usize },

    #[error("estimated filter size exceeds cap: {size} > {max} bits")]
    FilterTooLarge { size: usize, max: usize },

    #[error("index {index} is out of range for a filter of {size} bits")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("truncated envelope: needed {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("hash chain mismatch: ours {ours}, theirs {theirs}")]
    SeedMismatch { ours: String, theirs: String },
}
