//! Seeded hash chain: k pseudo-independent digests from one seed.
//!
//! A single SHA-512/256 primitive is reused k times with a varying
//! one-byte suffix, standing in for k independent hash functions. The
//! XOR combiner then mixes each chain entry with a per-element digest
//! (the double-hashing trick with one underlying hash).
//!
//! Two peers that derive their chains from the same round nonce map
//! every element to the same bit positions; under different nonces the
//! positions are uncorrelated, which is what stops cross-round filter
//! correlation.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha512_256};

use crate::error::DbfError;

/// Digest length in bytes (SHA-512/256).
pub const DIGEST_LEN: usize = 32;

/// A 256-bit digest.
pub type Digest = [u8; DIGEST_LEN];

/// Chain entries are indexed by a single suffix byte.
pub const MAX_CHAIN_LEN: usize = 256;

/// One-shot SHA-512/256 digest.
pub fn digest(data: &[u8]) -> Digest {
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&Sha512_256::digest(data));
    out
}

/// Bytewise XOR of two digests.
///
/// Commutative, associative, and self-inverse: combining twice with the
/// same digest restores the original, and `combine(a, a)` is all zeros.
pub fn combine(a: &Digest, b: &Digest) -> Digest {
    let mut out = [0u8; DIGEST_LEN];
    for (o, (x, y)) in out.iter_mut().zip(a.iter().zip(b.iter())) {
        *o = x ^ y;
    }
    out
}

/// Ordered sequence of k digests derived from a seed.
///
/// Entry `i` is `digest(seed || [i])`. Immutable once derived.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashChain {
    digests: Vec<Digest>,
}

impl HashChain {
    /// Derive a chain of `k` digests from a seed.
    ///
    /// Rejects `k == 0` and `k > 256` (the suffix is one byte).
    pub fn derive(seed: &[u8], k: usize) -> Result<Self, DbfError> {
        Self::check_len(k)?;
        let mut digests = Vec::with_capacity(k);
        let mut buf = Vec::with_capacity(seed.len() + 1);
        for i in 0..k {
            buf.clear();
            buf.extend_from_slice(seed);
            buf.push(i as u8);
            digests.push(digest(&buf));
        }
        Ok(Self { digests })
    }

    /// Rebuild a chain from raw digests, e.g. out of a decoded envelope.
    pub fn from_digests(digests: Vec<Digest>) -> Result<Self, DbfError> {
        Self::check_len(digests.len())?;
        Ok(Self { digests })
    }

    fn check_len(k: usize) -> Result<(), DbfError> {
        if k == 0 {
            return Err(DbfError::ZeroHashFunctions);
        }
        if k > MAX_CHAIN_LEN {
            return Err(DbfError::ChainTooLong {
                k,
                max: MAX_CHAIN_LEN,
            });
        }
        Ok(())
    }

    /// Number of digests in the chain (k).
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// A derived chain is never empty.
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    /// The chain entries in derivation order.
    pub fn entries(&self) -> &[Digest] {
        &self.digests
    }

    /// Digest over the concatenated chain entries.
    ///
    /// Two peers can exchange fingerprints to confirm they derived their
    /// chains from the same round nonce before trusting any cross-peer
    /// membership answers.
    pub fn fingerprint(&self) -> Digest {
        let mut hasher = Sha512_256::new();
        for entry in &self.digests {
            hasher.update(entry);
        }
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&hasher.finalize());
        out
    }

    /// Hex-encoded fingerprint, for logs and error reports.
    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.fingerprint())
    }
}

impl fmt::Debug for HashChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashChain")
            .field("len", &self.digests.len())
            .field("fingerprint", &self.fingerprint_hex())
            .finish()
    }
}
