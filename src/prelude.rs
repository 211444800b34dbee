pub use crate::builder::CacheBuilder;
pub use crate::cache::{DEFAULT_SEED, EvictionCandidate, SetAssociativeCache};
#[cfg(feature = "concurrency")]
pub use crate::concurrent::ConcurrentSetCache;
pub use crate::ds::{RecencyList, WayId};
pub use crate::error::{AccessError, ConfigError, InvariantError};
pub use crate::line::{CacheLine, CoherenceState, Tag};
pub use crate::policy::{
    LruReplacement, Policy, RandomReplacement, ReplacementPolicy, Replacer,
};
pub use crate::set::CacheSet;
