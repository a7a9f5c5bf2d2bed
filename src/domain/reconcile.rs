//! Reconciliation: deciding what to send a peer.
//!
//! `compare` looks at two bit arrays and reports whether one is a
//! subset of the other, which advises the direction of a sync round.
//! `sync_missing` filters a candidate list down to the elements a
//! peer's filter does not claim to hold.

use serde::{Deserialize, Serialize};

use super::dist_bf::{BitArray, DistBloomFilter};

/// Result of a bit-array comparability analysis.
///
/// Advisory input to choosing a sync direction, not a membership test.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    /// True iff one array's set bits are a subset of the other's
    /// (including equality).
    pub comparable: bool,
    /// Bits set in the first array but not the second.
    pub only_in_a: usize,
    /// Bits set in the second array but not the first.
    pub only_in_b: usize,
}

/// Compare two bit arrays coordinate-wise.
///
/// Arrays of unequal length are compared with missing positions read
/// as unset. A single linear pass computes both difference counts.
pub fn compare(a: &BitArray, b: &BitArray) -> Comparison {
    let mut only_in_a = 0;
    let mut only_in_b = 0;
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).map_or(false, |bit| *bit);
        let y = b.get(i).map_or(false, |bit| *bit);
        only_in_a += usize::from(x && !y);
        only_in_b += usize::from(y && !x);
    }
    Comparison {
        comparable: only_in_a == 0 || only_in_b == 0,
        only_in_a,
        only_in_b,
    }
}

/// Filter `candidates` down to the elements the peer's filter does not
/// claim to hold, i.e. the elements worth sending.
///
/// Uses the caller's own chain against the foreign bit array, so both
/// parties must have agreed on the round seed. Because the underlying
/// test never false-negatives but may false-positive, this can omit an
/// element the peer genuinely lacks, but never selects an element the
/// peer provably holds.
pub fn sync_missing<'a>(
    dbf: &DistBloomFilter,
    candidates: &'a [Vec<u8>],
    foreign: &BitArray,
) -> Vec<&'a [u8]> {
    let missing: Vec<&[u8]> = candidates
        .iter()
        .map(Vec::as_slice)
        .filter(|elem| !dbf.verify_against(elem, foreign))
        .collect();
    tracing::debug!(
        candidates = candidates.len(),
        missing = missing.len(),
        "filtered candidates against peer filter"
    );
    missing
}
