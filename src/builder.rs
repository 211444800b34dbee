//! Builder for [`SetAssociativeCache`].
//!
//! Collects the geometry and policy, validates them together, and builds the
//! cache. Drivers that think in bytes rather than lines can start from
//! [`CacheBuilder::from_geometry`].
//!
//! ## Example
//!
//! ```rust
//! use setcache::builder::CacheBuilder;
//! use setcache::Policy;
//!
//! // 32 KiB, 64-byte blocks, 4-way => 512 lines in 128 sets
//! let cache = CacheBuilder::from_geometry(32 * 1024, 64)
//!     .unwrap()
//!     .associativity(4)
//!     .policy(Policy::Random)
//!     .seed(7)
//!     .build()
//!     .unwrap();
//! assert_eq!(cache.num_lines(), 512);
//! assert_eq!(cache.num_sets(), 128);
//! ```

use crate::cache::{DEFAULT_SEED, SetAssociativeCache, validate_geometry};
use crate::error::ConfigError;
use crate::policy::Policy;

/// Configuration for a [`SetAssociativeCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheBuilder {
    num_lines: usize,
    associativity: usize,
    policy: Policy,
    seed: u64,
}

impl CacheBuilder {
    /// Starts a direct-mapped LRU configuration of `num_lines` lines.
    pub fn new(num_lines: usize) -> Self {
        Self {
            num_lines,
            associativity: 1,
            policy: Policy::default(),
            seed: DEFAULT_SEED,
        }
    }

    /// Derives the line count from a cache size and block size, both in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if either size is zero or the block size does
    /// not divide the cache size.
    pub fn from_geometry(cache_bytes: usize, block_bytes: usize) -> Result<Self, ConfigError> {
        if block_bytes == 0 {
            return Err(ConfigError::new("block_bytes must be > 0"));
        }
        if cache_bytes == 0 {
            return Err(ConfigError::new("cache_bytes must be > 0"));
        }
        if cache_bytes % block_bytes != 0 {
            return Err(ConfigError::new(format!(
                "cache_bytes ({cache_bytes}) must be a multiple of block_bytes ({block_bytes})"
            )));
        }
        Ok(Self::new(cache_bytes / block_bytes))
    }

    /// Ways per set.
    pub fn associativity(mut self, associativity: usize) -> Self {
        self.associativity = associativity;
        self
    }

    /// Shorthand for `associativity(num_lines)`: one set holding every line.
    pub fn fully_associative(mut self) -> Self {
        self.associativity = self.num_lines;
        self
    }

    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Seed for `Random` victim draws. Ignored under `Lru`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks the configuration without building, returning the set count.
    pub fn validate(&self) -> Result<usize, ConfigError> {
        validate_geometry(self.num_lines, self.associativity)
    }

    /// Builds the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] unless `num_lines` is a positive multiple of a
    /// positive associativity.
    pub fn build(self) -> Result<SetAssociativeCache, ConfigError> {
        SetAssociativeCache::with_seed(self.num_lines, self.associativity, self.policy, self.seed)
    }
}
