//! Element-to-index mapping.
//!
//! Each element is digested once; the digest is XOR-combined with every
//! chain entry and the leading 8 bytes of each combined digest, read as
//! a big-endian integer, are reduced modulo m. Only the first 8 bytes
//! are consulted, which caps addressing at 64 bits of filter size.

use super::hash_chain::{combine, digest, Digest, HashChain};

/// Map an element to its k bit indices in `[0, m)`.
///
/// Deterministic: identical `(element, chain, m)` always yields the same
/// ordered index sequence, which is what lets two peers agree on bit
/// positions without exchanging elements.
///
/// `m` must be non-zero; filters guarantee that at construction.
pub fn indices_for(element: &[u8], chain: &HashChain, m: usize) -> Vec<usize> {
    let element_digest = digest(element);
    chain
        .entries()
        .iter()
        .map(|entry| index_of(&combine(entry, &element_digest), m))
        .collect()
}

/// Reduce a digest to a bit index below `m`.
fn index_of(d: &Digest, m: usize) -> usize {
    let mut lead = [0u8; 8];
    lead.copy_from_slice(&d[..8]);
    (u64::from_be_bytes(lead) % m as u64) as usize
}
