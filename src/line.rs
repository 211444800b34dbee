//! Cache line data model: tags and MOESI coherence states.
//!
//! The store never interprets states beyond one question: is the line dirty?
//! `Modified` and `Owned` lines hold data newer than memory and must be
//! written back before their slot is reused; everything else can be dropped.
//!
//! ## Example
//!
//! ```
//! use setcache::{CacheLine, CoherenceState};
//!
//! let line = CacheLine::new(0x2a, CoherenceState::Owned);
//! assert!(line.needs_writeback());
//!
//! let state: CoherenceState = "S".parse().unwrap();
//! assert_eq!(state, CoherenceState::Shared);
//! assert_eq!(state.to_string(), "S");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::ParseStateError;

/// Address remainder identifying a line within its set.
pub type Tag = u64;

/// Protocol-level status of a cache line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoherenceState {
    #[default]
    Invalid,
    Modified,
    Owned,
    Exclusive,
    Shared,
}

impl CoherenceState {
    /// Every state, in MOESI order.
    pub const ALL: [CoherenceState; 5] = [
        CoherenceState::Modified,
        CoherenceState::Owned,
        CoherenceState::Exclusive,
        CoherenceState::Shared,
        CoherenceState::Invalid,
    ];

    /// Returns `true` for states whose data must be written back on eviction.
    #[inline]
    pub fn is_dirty(self) -> bool {
        matches!(self, CoherenceState::Modified | CoherenceState::Owned)
    }

    /// Returns `true` for any state other than `Invalid`.
    #[inline]
    pub fn is_valid(self) -> bool {
        self != CoherenceState::Invalid
    }

    /// Single-letter protocol mnemonic.
    pub fn mnemonic(self) -> char {
        match self {
            CoherenceState::Invalid => 'I',
            CoherenceState::Modified => 'M',
            CoherenceState::Owned => 'O',
            CoherenceState::Exclusive => 'E',
            CoherenceState::Shared => 'S',
        }
    }
}

impl fmt::Display for CoherenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

impl TryFrom<char> for CoherenceState {
    type Error = ParseStateError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'I' => Ok(CoherenceState::Invalid),
            'M' => Ok(CoherenceState::Modified),
            'O' => Ok(CoherenceState::Owned),
            'E' => Ok(CoherenceState::Exclusive),
            'S' => Ok(CoherenceState::Shared),
            _ => Err(ParseStateError::new(c.to_string())),
        }
    }
}

impl FromStr for CoherenceState {
    type Err = ParseStateError;

    /// Accepts the single-letter mnemonic or the full state name, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return CoherenceState::try_from(c);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "invalid" => Ok(CoherenceState::Invalid),
            "modified" => Ok(CoherenceState::Modified),
            "owned" => Ok(CoherenceState::Owned),
            "exclusive" => Ok(CoherenceState::Exclusive),
            "shared" => Ok(CoherenceState::Shared),
            _ => Err(ParseStateError::new(s)),
        }
    }
}

/// One resident line: its tag and current coherence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheLine {
    pub tag: Tag,
    pub state: CoherenceState,
}

impl CacheLine {
    #[inline]
    pub fn new(tag: Tag, state: CoherenceState) -> Self {
        Self { tag, state }
    }

    /// Placeholder line the cache is pre-filled with.
    #[inline]
    pub fn invalid(tag: Tag) -> Self {
        Self::new(tag, CoherenceState::Invalid)
    }

    /// Returns `true` if evicting this line requires a writeback.
    #[inline]
    pub fn needs_writeback(&self) -> bool {
        self.state.is_dirty()
    }
}
