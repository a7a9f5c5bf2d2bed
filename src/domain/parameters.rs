//! Optimal Bloom filter parameter estimation.
//!
//! Formulas:
//! - m = ceil(-n*ln(fpr) / ln(2)^2)  -- bits
//! - k = ceil(ln(2) * m / n)         -- hash functions
//!
//! Both use ceiling rounding. Downstream membership tests inherit their
//! false-positive rate from this sizing, so the rounding rule is part of
//! the contract, not an implementation detail.

use std::f64::consts::LN_2;

use crate::error::DbfError;

/// Sizing parameters for a distributed Bloom filter.
#[derive(Clone, Debug, PartialEq)]
pub struct DbfParams {
    /// Number of bits in the filter (m)
    pub size_bits: usize,
    /// Number of hash functions (k)
    pub hash_count: usize,
    /// Analytic false positive rate at full load with these parameters
    pub expected_fpr: f64,
}

/// Estimate filter parameters for an expected element count and target
/// false positive rate.
///
/// Fails when `n == 0` (the k formula divides by n) or when `fpr` falls
/// outside the open interval (0, 1). For all accepted inputs the result
/// satisfies `size_bits >= 1` and `hash_count >= 1`.
pub fn estimate_parameters(n: usize, fpr: f64) -> Result<DbfParams, DbfError> {
    if n == 0 {
        return Err(DbfError::ZeroElements);
    }
    if !(fpr > 0.0 && fpr < 1.0) {
        return Err(DbfError::InvalidFpr { fpr });
    }

    let nf = n as f64;
    let m = (-nf * fpr.ln() / (LN_2 * LN_2)).ceil() as usize;
    let k = (LN_2 * m as f64 / nf).ceil() as usize;

    Ok(DbfParams {
        size_bits: m,
        hash_count: k,
        expected_fpr: analytic_fpr(m, n, k),
    })
}

/// Estimate parameters for a filter shared between two peers.
///
/// A synchronization round sizes one filter for both parties, so the
/// filter must hold the larger of the two element counts without blowing
/// past the target false positive rate.
pub fn estimate_for_peers(n_local: usize, n_remote: usize, fpr: f64) -> Result<DbfParams, DbfError> {
    estimate_parameters(n_local.max(n_remote), fpr)
}

/// Analytic false positive rate for given parameters.
///
/// Formula: FPR = (1 - e^(-kn/m))^k
pub fn analytic_fpr(m: usize, n: usize, k: usize) -> f64 {
    if m == 0 {
        return 1.0;
    }
    let exponent = -(k as f64) * (n as f64) / (m as f64);
    (1.0 - exponent.exp()).powi(k as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_matches_recorded_vectors() {
        // Fixed fpr 0.1; ceiling rounding in both formulas.
        let params = estimate_parameters(101, 0.1).expect("valid input");
        assert_eq!(params.size_bits, 485, "m for n=101");
        assert_eq!(params.hash_count, 4, "k for n=101");

        let params = estimate_parameters(100, 0.1).expect("valid input");
        assert_eq!(params.size_bits, 480, "m for n=100");
        assert_eq!(params.hash_count, 4, "k for n=100");
    }

    #[test]
    fn test_estimate_for_peers_takes_larger_count() {
        let params = estimate_for_peers(100, 101, 0.1).expect("valid input");
        assert_eq!((params.size_bits, params.hash_count), (485, 4));

        let params = estimate_for_peers(100, 99, 0.1).expect("valid input");
        assert_eq!((params.size_bits, params.hash_count), (480, 4));
    }

    #[test]
    fn test_zero_elements_rejected() {
        let result = estimate_parameters(0, 0.1);
        assert!(matches!(result, Err(DbfError::ZeroElements)));
    }

    #[test]
    fn test_fpr_bounds_rejected() {
        for fpr in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let result = estimate_parameters(100, fpr);
            assert!(
                matches!(result, Err(DbfError::InvalidFpr { .. })),
                "fpr {} should be rejected",
                fpr
            );
        }
    }

    #[test]
    fn test_minimum_viable_sizing() {
        // Even a single element with a loose rate yields a usable filter.
        let params = estimate_parameters(1, 0.99).expect("valid input");
        assert!(params.size_bits >= 1, "m must be at least 1");
        assert!(params.hash_count >= 1, "k must be at least 1");
    }

    #[test]
    fn test_lower_fpr_needs_more_bits() {
        let loose = estimate_parameters(100, 0.1).unwrap();
        let tight = estimate_parameters(100, 0.01).unwrap();
        assert!(tight.size_bits > loose.size_bits);
    }

    #[test]
    fn test_expected_fpr_near_target() {
        let params = estimate_parameters(1000, 0.05).unwrap();
        assert!(
            params.expected_fpr <= 0.05 * 1.1,
            "analytic fpr {} drifted from target",
            params.expected_fpr
        );
    }
}
