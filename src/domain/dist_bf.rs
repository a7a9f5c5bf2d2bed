//! Core distributed Bloom filter.
//!
//! A `DistBloomFilter` owns a bit array of m bits, the sizing pair
//! (m, k), and the hash chain derived from the round seed. The bit array
//! is the only mutable state: `add` and `set_indices` set bits, nothing
//! ever clears them. One instance is not safe for concurrent mutation
//! and reads; distinct instances are fully independent.

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use super::codec;
use super::hash_chain::HashChain;
use super::mapper::indices_for;
use super::parameters::estimate_parameters;
use crate::error::DbfError;

/// Growable bit array backing a filter, LSB-first within each byte.
pub type BitArray = BitVec<u8, Lsb0>;

/// Serde support for the bit array (raw bytes plus bit length).
mod bitvec_serde {
    use bitvec::prelude::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bits: &BitVec<u8, Lsb0>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes: Vec<u8> = bits.as_raw_slice().to_vec();
        (bytes, bits.len()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BitVec<u8, Lsb0>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (bytes, len): (Vec<u8>, usize) = Deserialize::deserialize(deserializer)?;
        let mut bits = BitVec::<u8, Lsb0>::from_vec(bytes);
        bits.truncate(len);
        Ok(bits)
    }
}

/// Succinct membership evidence.
///
/// For a member, `indices` holds all k tested positions and `member` is
/// true: a verifier can re-check each position against the bit array.
/// For a non-member, `indices` holds the single position that disproved
/// membership, which is a smaller piece of evidence than the whole
/// array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    /// Positions tested, in mapping order.
    pub indices: Vec<usize>,
    /// Whether all k positions were set.
    pub member: bool,
}

/// Distributed Bloom filter: a Bloom filter whose index functions are
/// derived from a caller-supplied seed.
///
/// Standard one-sided error applies: never a false negative for an
/// inserted element, false positives bounded by the configured rate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DistBloomFilter {
    /// Bit array of m bits, the only mutable state
    #[serde(with = "bitvec_serde")]
    bits: BitArray,
    /// Size in bits (m)
    m: usize,
    /// Number of hash functions (k)
    k: usize,
    /// Seed-derived hash chain, immutable once constructed
    chain: HashChain,
}

impl DistBloomFilter {
    /// Build a filter sized for `expected_elements` at `target_fpr`,
    /// with a hash chain derived from `seed`.
    ///
    /// Construction is atomic: any validation failure yields an error
    /// and no partially initialized filter.
    pub fn new(expected_elements: usize, target_fpr: f64, seed: &[u8]) -> Result<Self, DbfError> {
        let params = estimate_parameters(expected_elements, target_fpr)?;
        let chain = HashChain::derive(seed, params.hash_count)?;
        tracing::debug!(
            m = params.size_bits,
            k = params.hash_count,
            expected_fpr = params.expected_fpr,
            "built distributed bloom filter"
        );
        Self::from_parts(
            params.size_bits,
            params.hash_count,
            chain,
            bitvec![u8, Lsb0; 0; params.size_bits],
        )
    }

    /// Assemble a filter from already validated pieces, e.g. a decoded
    /// envelope. Enforces `m > 0`, `chain.len() == k`, `bits.len() == m`.
    pub fn from_parts(
        m: usize,
        k: usize,
        chain: HashChain,
        bits: BitArray,
    ) -> Result<Self, DbfError> {
        if m == 0 {
            return Err(DbfError::MalformedEnvelope(
                "bit-array size must be non-zero".to_string(),
            ));
        }
        if chain.len() != k {
            return Err(DbfError::MalformedEnvelope(format!(
                "hash chain has {} entries, expected k={}",
                chain.len(),
                k
            )));
        }
        if bits.len() != m {
            return Err(DbfError::MalformedEnvelope(format!(
                "bit array has {} bits, expected m={}",
                bits.len(),
                m
            )));
        }
        Ok(Self { bits, m, k, chain })
    }

    /// Insert an element: set all k mapped bits.
    ///
    /// Idempotent; re-adding an element sets already-set bits.
    pub fn add(&mut self, element: &[u8]) {
        for index in indices_for(element, &self.chain, self.m) {
            self.bits.set(index, true);
        }
    }

    /// Test membership against this filter's own bit array.
    ///
    /// Never a false negative for an inserted element.
    pub fn verify_element(&self, element: &[u8]) -> bool {
        indices_for(element, &self.chain, self.m)
            .iter()
            .all(|&index| self.bits[index])
    }

    /// Test membership against a foreign bit array, using this
    /// instance's own chain.
    ///
    /// This is the cross-peer primitive: the caller, holding the chain
    /// the peer used, asks whether the peer's array claims the element.
    /// It is only meaningful when both parties derived their chains
    /// from the same round seed; use [`ensure_same_chain`] to check
    /// that precondition when the peer's chain is available.
    ///
    /// Positions beyond the foreign array's length read as unset.
    ///
    /// [`ensure_same_chain`]: Self::ensure_same_chain
    pub fn verify_against(&self, element: &[u8], foreign: &BitArray) -> bool {
        indices_for(element, &self.chain, self.m)
            .iter()
            .all(|&index| foreign.get(index).map_or(false, |bit| *bit))
    }

    /// Check the seed-agreement precondition for cross-peer tests.
    ///
    /// Errors with the two chain fingerprints when the chains differ;
    /// a mismatch makes cross-peer answers meaningless, not merely
    /// less accurate.
    pub fn ensure_same_chain(&self, other: &HashChain) -> Result<(), DbfError> {
        if &self.chain == other {
            return Ok(());
        }
        Err(DbfError::SeedMismatch {
            ours: self.chain.fingerprint_hex(),
            theirs: other.fingerprint_hex(),
        })
    }

    /// Produce membership evidence for an element.
    ///
    /// Stops at the first unset position for a non-member.
    pub fn proof(&self, element: &[u8]) -> Proof {
        let mut indices = Vec::with_capacity(self.k);
        for index in indices_for(element, &self.chain, self.m) {
            if !self.bits[index] {
                return Proof {
                    indices: vec![index],
                    member: false,
                };
            }
            indices.push(index);
        }
        Proof {
            indices,
            member: true,
        }
    }

    /// Set bits at raw indices, bypassing element hashing.
    ///
    /// Used when bits arrive from a peer rather than from insertion.
    /// Atomic: every index is validated against m before any bit is
    /// set, so a failed call leaves the filter unchanged.
    pub fn set_indices(&mut self, indices: &[usize]) -> Result<(), DbfError> {
        for &index in indices {
            if index >= self.m {
                return Err(DbfError::IndexOutOfRange {
                    index,
                    size: self.m,
                });
            }
        }
        for &index in indices {
            self.bits.set(index, true);
        }
        Ok(())
    }

    /// Positions of every set bit, in ascending order.
    pub fn set_bit_indices(&self) -> Vec<usize> {
        self.bits.iter_ones().collect()
    }

    /// Preview the indices an element would map to, without testing.
    pub fn element_indices(&self, element: &[u8]) -> Vec<usize> {
        indices_for(element, &self.chain, self.m)
    }

    /// Preview an element's mapping under a different seed.
    ///
    /// Derives a throwaway chain of the same length; the instance's own
    /// chain is untouched. This serves callers that negotiate a fresh
    /// nonce per operation instead of per filter.
    pub fn indices_with_seed(&self, element: &[u8], seed: &[u8]) -> Result<Vec<usize>, DbfError> {
        let chain = HashChain::derive(seed, self.k)?;
        Ok(indices_for(element, &chain, self.m))
    }

    /// Size of the bit array in bits (m).
    pub fn size_bits(&self) -> usize {
        self.m
    }

    /// Number of hash functions (k).
    pub fn hash_count(&self) -> usize {
        self.k
    }

    /// The filter's bit array.
    pub fn bits(&self) -> &BitArray {
        &self.bits
    }

    /// The filter's hash chain.
    pub fn chain(&self) -> &HashChain {
        &self.chain
    }

    /// Serialize to the portable wire envelope.
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(self)
    }

    /// Reconstruct a filter from the wire envelope.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DbfError> {
        codec::decode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &[u8] = b"12345678901234567890123456789011";

    #[test]
    fn test_new_filter_is_empty() {
        let dbf = DistBloomFilter::new(10, 0.1, SEED).expect("valid parameters");
        assert!(dbf.size_bits() > 0);
        assert!(dbf.hash_count() > 0);
        assert_eq!(dbf.chain().len(), dbf.hash_count());
        assert!(dbf.set_bit_indices().is_empty(), "no bits set initially");
    }

    #[test]
    fn test_add_then_verify() {
        let mut dbf = DistBloomFilter::new(10, 0.1, SEED).expect("valid parameters");
        dbf.add(b"message");

        assert!(
            dbf.verify_element(b"message"),
            "no false negatives for inserted elements"
        );

        let indices = dbf.element_indices(b"message");
        assert_eq!(indices.len(), dbf.hash_count());
        for idx in &indices {
            assert!(*idx < dbf.size_bits());
        }
    }

    #[test]
    fn test_no_false_negatives_bulk() {
        let mut dbf = DistBloomFilter::new(500, 0.01, b"bulk-round-nonce").unwrap();
        let elements: Vec<String> = (0..500).map(|i| format!("element_{:04}", i)).collect();

        for elem in &elements {
            dbf.add(elem.as_bytes());
        }
        for elem in &elements {
            assert!(
                dbf.verify_element(elem.as_bytes()),
                "false negative for {}",
                elem
            );
        }
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut dbf = DistBloomFilter::new(10, 0.1, SEED).unwrap();
        dbf.add(b"message");
        let before = dbf.set_bit_indices();
        dbf.add(b"message");
        assert_eq!(dbf.set_bit_indices(), before, "re-adding changes no bits");
    }

    #[test]
    fn test_same_seed_same_elements_identical_bits() {
        let mut a = DistBloomFilter::new(50, 0.05, b"shared-nonce").unwrap();
        let mut b = DistBloomFilter::new(50, 0.05, b"shared-nonce").unwrap();

        for i in 0..50 {
            let elem = format!("item-{}", i);
            a.add(elem.as_bytes());
            b.add(elem.as_bytes());
        }

        assert_eq!(a.bits(), b.bits(), "identical builds must be bit-identical");
        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn test_different_seed_different_bits() {
        let mut a = DistBloomFilter::new(50, 0.05, b"round-1").unwrap();
        let mut b = DistBloomFilter::new(50, 0.05, b"round-2").unwrap();

        for i in 0..50 {
            let elem = format!("item-{}", i);
            a.add(elem.as_bytes());
            b.add(elem.as_bytes());
        }

        assert_ne!(a.bits(), b.bits(), "seeds must decorrelate bit patterns");
    }

    #[test]
    fn test_verify_against_foreign_bits() {
        let mut sender = DistBloomFilter::new(20, 0.05, b"round-nonce").unwrap();
        sender.add(b"shared-element");

        // Receiver holds the same seed, its own empty filter.
        let receiver = DistBloomFilter::new(20, 0.05, b"round-nonce").unwrap();

        assert!(
            receiver.verify_against(b"shared-element", sender.bits()),
            "receiver must see the sender's insertion through the foreign array"
        );
        assert!(!receiver.verify_element(b"shared-element"));
    }

    #[test]
    fn test_ensure_same_chain() {
        let a = DistBloomFilter::new(10, 0.1, b"round-1").unwrap();
        let b = DistBloomFilter::new(10, 0.1, b"round-1").unwrap();
        let c = DistBloomFilter::new(10, 0.1, b"round-2").unwrap();

        assert!(a.ensure_same_chain(b.chain()).is_ok());
        let err = a.ensure_same_chain(c.chain()).unwrap_err();
        assert!(matches!(err, DbfError::SeedMismatch { .. }));
    }

    #[test]
    fn test_proof_for_member_and_non_member() {
        let mut dbf = DistBloomFilter::new(10, 0.1, SEED).unwrap();
        dbf.add(b"present");

        let proof = dbf.proof(b"present");
        assert!(proof.member);
        assert_eq!(proof.indices.len(), dbf.hash_count());
        assert_eq!(proof.indices, dbf.element_indices(b"present"));

        let disproof = dbf.proof(b"never-inserted");
        assert!(!disproof.member);
        assert_eq!(
            disproof.indices.len(),
            1,
            "a single unset position disproves membership"
        );
        assert!(disproof.indices[0] < dbf.size_bits());
    }

    #[test]
    fn test_set_indices_roundtrip() {
        let source = {
            let mut dbf = DistBloomFilter::new(10, 0.1, SEED).unwrap();
            dbf.add(b"message");
            dbf
        };

        let mut rebuilt = DistBloomFilter::new(10, 0.1, SEED).unwrap();
        rebuilt
            .set_indices(&source.set_bit_indices())
            .expect("indices from a same-sized filter are in range");

        assert_eq!(rebuilt.bits(), source.bits());
        assert!(rebuilt.verify_element(b"message"));
    }

    #[test]
    fn test_set_indices_out_of_range_is_atomic() {
        let mut dbf = DistBloomFilter::new(10, 0.1, SEED).unwrap();
        let m = dbf.size_bits();

        let err = dbf.set_indices(&[0, 1, m]).unwrap_err();
        assert!(matches!(err, DbfError::IndexOutOfRange { index, size } if index == m && size == m));
        assert!(
            dbf.set_bit_indices().is_empty(),
            "a failed call must leave the filter unchanged"
        );
    }

    #[test]
    fn test_indices_with_seed_differs_from_own_chain() {
        let dbf = DistBloomFilter::new(100, 0.01, b"round-1").unwrap();
        let own = dbf.element_indices(b"element");
        let other = dbf.indices_with_seed(b"element", b"round-2").unwrap();

        assert_eq!(other.len(), dbf.hash_count());
        assert_ne!(own, other, "a different seed must remap the element");
    }

    #[test]
    fn test_false_positive_rate_bounded() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let target_fpr = 0.01;
        let n = 200;
        let mut dbf = DistBloomFilter::new(n, target_fpr, b"fpr-round-nonce").unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..n {
            let elem: [u8; 16] = rng.gen();
            dbf.add(&elem);
        }

        let mut false_positives = 0;
        let probes = 20_000;
        for _ in 0..probes {
            let elem: [u8; 24] = rng.gen();
            if dbf.verify_element(&elem) {
                false_positives += 1;
            }
        }

        let actual = false_positives as f64 / probes as f64;
        assert!(
            actual <= target_fpr * 1.5,
            "observed fpr {} exceeds 1.5x target {}",
            actual,
            target_fpr
        );
    }

    #[test]
    fn test_serde_snapshot_roundtrip() {
        let mut dbf = DistBloomFilter::new(10, 0.1, SEED).unwrap();
        dbf.add(b"message");

        let json = serde_json::to_string(&dbf).expect("serialize");
        let restored: DistBloomFilter = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(restored.bits(), dbf.bits());
        assert_eq!(restored.chain(), dbf.chain());
        assert!(restored.verify_element(b"message"));
    }
}
