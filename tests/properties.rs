//! Property tests for the filter's one-sided error and wire envelope.

use distbf::{digest, DistBloomFilter};
use proptest::collection::vec;
use proptest::prelude::*;

proptest! {
    /// Every inserted element verifies, whatever the elements and
    /// whatever valid sizing the round picked.
    #[test]
    fn no_false_negatives(
        elements in vec(vec(any::<u8>(), 0..64), 1..40),
        n in 1usize..200,
        fpr in 0.001f64..0.5,
        seed in vec(any::<u8>(), 1..48),
    ) {
        let mut dbf = DistBloomFilter::new(n, fpr, &seed).expect("valid parameters");
        for elem in &elements {
            dbf.add(elem);
        }
        for elem in &elements {
            prop_assert!(dbf.verify_element(elem), "false negative for {:?}", elem);
        }
    }

    /// The wire envelope reconstructs a field-equal filter.
    #[test]
    fn envelope_roundtrip(
        elements in vec(vec(any::<u8>(), 0..32), 1..20),
        seed in vec(any::<u8>(), 1..48),
    ) {
        let mut dbf = DistBloomFilter::new(64, 0.02, &seed).expect("valid parameters");
        for elem in &elements {
            dbf.add(elem);
        }

        let decoded = DistBloomFilter::from_bytes(&dbf.to_bytes()).expect("own envelope decodes");
        prop_assert_eq!(decoded.size_bits(), dbf.size_bits());
        prop_assert_eq!(decoded.hash_count(), dbf.hash_count());
        prop_assert_eq!(decoded.chain(), dbf.chain());
        prop_assert_eq!(decoded.bits(), dbf.bits());
    }

    /// XOR combiner algebra holds for arbitrary digests.
    #[test]
    fn combiner_is_self_inverse(a in vec(any::<u8>(), 0..64), b in vec(any::<u8>(), 0..64)) {
        let da = digest(&a);
        let db = digest(&b);
        prop_assert_eq!(distbf::combine(&distbf::combine(&da, &db), &db), da);
        prop_assert_eq!(distbf::combine(&da, &da), [0u8; 32]);
    }
}
