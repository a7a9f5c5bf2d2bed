//! Domain layer: the pure distributed-Bloom-filter core.
//!
//! No I/O, no async. Everything here is deterministic given its
//! arguments, which is what cross-peer agreement rests on.

pub mod codec;
pub mod config;
pub mod dist_bf;
pub mod hash_chain;
pub mod mapper;
pub mod parameters;
pub mod reconcile;

pub use codec::{decode, encode};
pub use config::{DbfConfig, DbfConfigBuilder};
pub use dist_bf::{BitArray, DistBloomFilter, Proof};
pub use hash_chain::{combine, digest, Digest, HashChain, DIGEST_LEN, MAX_CHAIN_LEN};
pub use mapper::indices_for;
pub use parameters::{analytic_fpr, estimate_for_peers, estimate_parameters, DbfParams};
pub use reconcile::{compare, sync_missing, Comparison};
