//! Replacement policies for choosing which way of a set to evict.
//!
//! A policy is picked once, at construction, as a closed [`Policy`] value.
//! Each set then owns a [`Replacer`], which dispatches statically to the
//! concrete strategy behind the [`ReplacementPolicy`] seam.
//!
//! | Policy   | On hit            | Victim                         |
//! |----------|-------------------|--------------------------------|
//! | `Lru`    | promote to MRU    | LRU tail                       |
//! | `Random` | nothing           | uniform draw over all ways     |
//!
//! Both policies place a freshly filled line at the MRU position.

pub mod lru;
pub mod random;

use std::fmt;
use std::str::FromStr;

use crate::ds::{RecencyList, WayId};
use crate::error::ParsePolicyError;

pub use lru::LruReplacement;
pub use random::RandomReplacement;

/// Replacement policy selected at construction time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Strict least-recently-used.
    #[default]
    Lru,
    /// Uniformly random victim among the set's ways.
    Random,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Lru => f.write_str("lru"),
            Policy::Random => f.write_str("random"),
        }
    }
}

impl FromStr for Policy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" | "l" => Ok(Policy::Lru),
            "random" | "rand" | "r" => Ok(Policy::Random),
            _ => Err(ParsePolicyError::new(s)),
        }
    }
}

/// Strategy seam between a set's recency list and its eviction choice.
pub trait ReplacementPolicy {
    /// The configuration variant this strategy implements.
    fn kind(&self) -> Policy;

    /// Records a hit on `way`.
    fn on_hit<T>(&mut self, order: &mut RecencyList<T>, way: WayId);

    /// Records that `way` was just refilled with a new line.
    fn on_fill<T>(&mut self, order: &mut RecencyList<T>, way: WayId) {
        order.move_to_front(way);
    }

    /// Chooses the way to evict next. `None` only for an empty list.
    fn select_victim<T>(&mut self, order: &RecencyList<T>) -> Option<WayId>;
}

/// Per-set replacement state, fixed for the cache's lifetime.
#[derive(Debug, Clone)]
pub enum Replacer {
    Lru(LruReplacement),
    Random(RandomReplacement),
}

impl Replacer {
    /// Builds the strategy for `policy`; `seed` only matters for `Random`.
    pub fn new(policy: Policy, seed: u64) -> Self {
        match policy {
            Policy::Lru => Replacer::Lru(LruReplacement),
            Policy::Random => Replacer::Random(RandomReplacement::with_seed(seed)),
        }
    }
}

impl ReplacementPolicy for Replacer {
    #[inline]
    fn kind(&self) -> Policy {
        match self {
            Replacer::Lru(lru) => lru.kind(),
            Replacer::Random(random) => random.kind(),
        }
    }

    #[inline]
    fn on_hit<T>(&mut self, order: &mut RecencyList<T>, way: WayId) {
        match self {
            Replacer::Lru(lru) => lru.on_hit(order, way),
            Replacer::Random(random) => random.on_hit(order, way),
        }
    }

    #[inline]
    fn on_fill<T>(&mut self, order: &mut RecencyList<T>, way: WayId) {
        match self {
            Replacer::Lru(lru) => lru.on_fill(order, way),
            Replacer::Random(random) => random.on_fill(order, way),
        }
    }

    #[inline]
    fn select_victim<T>(&mut self, order: &RecencyList<T>) -> Option<WayId> {
        match self {
            Replacer::Lru(lru) => lru.select_victim(order),
            Replacer::Random(random) => random.select_victim(order),
        }
    }
}
