//! Filter configuration and validation.
//!
//! A host embeds `DbfConfig` in its own configuration and builds one
//! filter per synchronization round from it, supplying the round nonce
//! at build time. Validation is total: a config that builds a filter
//! has already passed every argument check.

use serde::{Deserialize, Serialize};

use super::dist_bf::DistBloomFilter;
use super::parameters::estimate_parameters;
use crate::error::DbfError;

/// Configuration for building per-round filters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DbfConfig {
    /// Target false positive rate, strictly inside (0, 1)
    pub target_fpr: f64,
    /// Expected number of elements per round
    pub expected_elements: usize,
    /// Cap on the estimated filter size in bits
    pub max_size_bits: usize,
}

impl Default for DbfConfig {
    fn default() -> Self {
        Self {
            target_fpr: 0.1,
            expected_elements: 128,
            max_size_bits: 1 << 20, // 128 KiB of filter
        }
    }
}

impl DbfConfig {
    /// Create a configuration, validating all fields.
    pub fn new(
        target_fpr: f64,
        expected_elements: usize,
        max_size_bits: usize,
    ) -> Result<Self, DbfError> {
        let config = Self {
            target_fpr,
            expected_elements,
            max_size_bits,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate every field.
    pub fn validate(&self) -> Result<(), DbfError> {
        if !(self.target_fpr > 0.0 && self.target_fpr < 1.0) {
            return Err(DbfError::InvalidFpr {
                fpr: self.target_fpr,
            });
        }
        if self.expected_elements == 0 {
            return Err(DbfError::ZeroElements);
        }
        let params = estimate_parameters(self.expected_elements, self.target_fpr)?;
        if params.size_bits > self.max_size_bits {
            return Err(DbfError::FilterTooLarge {
                size: params.size_bits,
                max: self.max_size_bits,
            });
        }
        Ok(())
    }

    /// Build a filter for one round, seeded with the round nonce.
    pub fn build_filter(&self, seed: &[u8]) -> Result<DistBloomFilter, DbfError> {
        self.validate()?;
        DistBloomFilter::new(self.expected_elements, self.target_fpr, seed)
    }
}

/// Builder for `DbfConfig` with deferred validation.
#[derive(Default)]
pub struct DbfConfigBuilder {
    target_fpr: Option<f64>,
    expected_elements: Option<usize>,
    max_size_bits: Option<usize>,
}

impl DbfConfigBuilder {
    /// Create a builder seeded with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target false positive rate.
    pub fn target_fpr(mut self, fpr: f64) -> Self {
        self.target_fpr = Some(fpr);
        self
    }

    /// Set the expected element count per round.
    pub fn expected_elements(mut self, n: usize) -> Self {
        self.expected_elements = Some(n);
        self
    }

    /// Set the cap on estimated filter size in bits.
    pub fn max_size_bits(mut self, bits: usize) -> Self {
        self.max_size_bits = Some(bits);
        self
    }

    /// Build the config, validating all fields.
    pub fn build(self) -> Result<DbfConfig, DbfError> {
        let defaults = DbfConfig::default();
        let config = DbfConfig {
            target_fpr: self.target_fpr.unwrap_or(defaults.target_fpr),
            expected_elements: self.expected_elements.unwrap_or(defaults.expected_elements),
            max_size_bits: self.max_size_bits.unwrap_or(defaults.max_size_bits),
        };
        config.validate()?;
        Ok(config)
    }
}
