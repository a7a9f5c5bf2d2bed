//! # distbf
//!
//! Distributed Bloom filter (DBF): a compact probabilistic
//! set-membership structure that lets two peers work out which elements
//! one is missing relative to the other, without exchanging element
//! lists.
//!
//! What sets it apart from a plain Bloom filter is the seeded hash
//! chain: the k index functions are derived from a caller-supplied
//! seed (a per-round nonce), so the same element maps to different bit
//! positions under different seeds. A peer cannot correlate filters
//! across synchronization rounds or recover element identities from
//! bit patterns alone.
//!
//! ## Layout
//!
//! - `domain::parameters` — fpr-driven sizing (m, k)
//! - `domain::hash_chain` — seed-derived digest chain and XOR combiner
//! - `domain::mapper` — element to k bit indices
//! - `domain::dist_bf` — the filter: add, verify, proofs, raw indices
//! - `domain::reconcile` — comparability analysis and candidate filtering
//! - `domain::codec` — big-endian wire envelope
//! - `domain::config` — validated per-round build configuration
//!
//! ## Usage
//!
//! ```
//! use distbf::{sync_missing, DistBloomFilter};
//!
//! let nonce = b"round-7-nonce";
//!
//! // The sender builds, fills, and ships its filter.
//! let mut sender = DistBloomFilter::new(100, 0.01, nonce)?;
//! sender.add(b"block-0xa1");
//! let envelope = sender.to_bytes();
//!
//! // The receiver, holding the same nonce, decides what to send back.
//! let peer = DistBloomFilter::from_bytes(&envelope)?;
//! let receiver = DistBloomFilter::new(100, 0.01, nonce)?;
//! receiver.ensure_same_chain(peer.chain())?;
//!
//! let candidates = vec![b"block-0xa1".to_vec(), b"block-0xb2".to_vec()];
//! let missing = sync_missing(&receiver, &candidates, peer.bits());
//! assert_eq!(missing, vec![b"block-0xb2".as_slice()]);
//! # Ok::<(), distbf::DbfError>(())
//! ```
//!
//! ## Guarantees
//!
//! - No false negatives: an inserted element always verifies.
//! - False positives bounded by the configured rate; reconciliation may
//!   under-select, never over-select.
//! - Identical `(n, fpr, seed)` and insertion sequence produce
//!   bit-identical filters on both peers.
//!
//! Transport, nonce negotiation, and scheduling of filter exchange are
//! the caller's concern; every operation here is synchronous and
//! in-memory.

pub mod domain;
pub mod error;

pub use domain::{
    analytic_fpr, combine, compare, decode, digest, encode, estimate_for_peers,
    estimate_parameters, indices_for, sync_missing, BitArray, Comparison, DbfConfig,
    DbfConfigBuilder, DbfParams, Digest, DistBloomFilter, HashChain, Proof, DIGEST_LEN,
    MAX_CHAIN_LEN,
};
pub use error::DbfError;
