//! Error types for the setcache library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when the cache geometry is invalid (zero lines,
//!   zero associativity, line count not a multiple of associativity).
//! - [`AccessError`]: Returned when an operation addresses a set that does not
//!   exist, hands back an eviction candidate drawn from another set, or asks a
//!   `Random` set to fill without the candidate it was checked against.
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (`check_invariants` methods).
//! - [`ParseStateError`] / [`ParsePolicyError`]: Returned when a driver parses
//!   a coherence-state mnemonic or a policy name it does not recognize.
//!
//! ## Example Usage
//!
//! ```
//! use setcache::error::ConfigError;
//! use setcache::{Policy, SetAssociativeCache};
//!
//! let cache: Result<SetAssociativeCache, ConfigError> =
//!     SetAssociativeCache::new(8, 2, Policy::Lru);
//! assert!(cache.is_ok());
//!
//! // 6 lines cannot be split into 4-way sets
//! let bad = SetAssociativeCache::new(6, 4, Policy::Lru);
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`SetAssociativeCache::new`](crate::SetAssociativeCache::new)
/// and [`CacheBuilder::build`](crate::builder::CacheBuilder::build). Carries a
/// human-readable description of which parameter failed validation.
///
/// # Example
///
/// ```
/// use setcache::{Policy, SetAssociativeCache};
///
/// let err = SetAssociativeCache::new(0, 2, Policy::Lru).unwrap_err();
/// assert!(err.to_string().contains("num_lines"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// AccessError
// ---------------------------------------------------------------------------

/// Error returned when an operation cannot address the requested set.
///
/// Both variants are caller bugs: the core never recovers from them on its own
/// and leaves the cache untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// The set index is outside `[0, num_sets)`.
    SetOutOfRange { set: usize, num_sets: usize },
    /// An eviction candidate selected in one set was passed to an insert
    /// targeting another.
    CandidateSetMismatch { candidate_set: usize, set: usize },
    /// A `Random` set was asked to fill a new tag without an explicit
    /// candidate. A fresh draw could evict a line other than the one checked
    /// for writeback.
    CandidateRequired { set: usize },
    /// The set produced no victim. Sets always hold at least one way, so this
    /// only surfaces if the set's internal structure is broken.
    NoVictim { set: usize },
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::SetOutOfRange { set, num_sets } => {
                write!(f, "set index {set} out of range (num_sets = {num_sets})")
            },
            AccessError::CandidateSetMismatch { candidate_set, set } => write!(
                f,
                "eviction candidate belongs to set {candidate_set}, not set {set}"
            ),
            AccessError::CandidateRequired { set } => write!(
                f,
                "set {set} uses random replacement; fill it with the checked eviction candidate"
            ),
            AccessError::NoVictim { set } => write!(f, "set {set} has no way to evict"),
        }
    }
}

impl std::error::Error for AccessError {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by [`CacheSet::check_invariants`](crate::set::CacheSet::check_invariants)
/// and [`SetAssociativeCache::check_invariants`](crate::SetAssociativeCache::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Error returned when a coherence-state mnemonic is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStateError(String);

impl ParseStateError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self(input.into())
    }

    /// Returns the rejected input.
    pub fn input(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParseStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown coherence state `{}`", self.0)
    }
}

impl std::error::Error for ParseStateError {}

/// Error returned when a replacement policy name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePolicyError(String);

impl ParsePolicyError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self(input.into())
    }

    /// Returns the rejected input.
    pub fn input(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParsePolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown replacement policy `{}`", self.0)
    }
}

impl std::error::Error for ParsePolicyError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
