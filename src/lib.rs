//! setcache: a set-associative cache line store for coherence simulators.
//!
//! Tracks, per set, a fixed number of lines with their coherence state and
//! chooses eviction victims by strict LRU or uniformly at random, reporting
//! whether a victim needs a writeback. Address decoding, bus messages and
//! statistics belong to the caller.
//!
//! ## Example
//!
//! ```
//! use setcache::{CoherenceState, Policy, SetAssociativeCache};
//!
//! let mut cache = SetAssociativeCache::new(8, 2, Policy::Lru).unwrap();
//! let (set, tag) = (3, 0x7f);
//!
//! if cache.find_state(set, tag).unwrap() == CoherenceState::Invalid {
//!     let (victim, dirty) = cache.check_writeback(set).unwrap();
//!     if dirty {
//!         // flush victim.tag to memory here
//!     }
//!     cache
//!         .insert_line_evicting(victim, tag, CoherenceState::Exclusive)
//!         .unwrap();
//! }
//! assert_eq!(cache.find_state(set, tag).unwrap(), CoherenceState::Exclusive);
//! ```

pub mod builder;
pub mod cache;
#[cfg(feature = "concurrency")]
pub mod concurrent;
pub mod ds;
pub mod error;
pub mod line;
pub mod policy;
pub mod prelude;
pub mod set;

pub use cache::{EvictionCandidate, SetAssociativeCache};
pub use line::{CacheLine, CoherenceState, Tag};
pub use policy::Policy;
