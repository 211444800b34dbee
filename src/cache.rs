//! Set-associative cache line store.
//!
//! [`SetAssociativeCache`] owns `num_lines / associativity` independent
//! [`CacheSet`]s. Callers decode addresses themselves and address every
//! operation with an already-computed `(set, tag)` pair; the store only keeps
//! lines, their coherence states and the replacement order.
//!
//! ## Access cycle
//!
//! ```text
//!   find_state(set, tag)
//!        │
//!        ├── hit  ─► update_lru(set, tag) ─► change_state(...) as the protocol says
//!        │
//!        └── miss ─► check_writeback(set) ─► (candidate, dirty?)
//!                         │                       │
//!                         │                       └── dirty: caller writes back
//!                         ▼
//!                    insert_line_evicting(candidate, tag, state)
//! ```
//!
//! The candidate is a plain value. Under `Random` it is the only way to make
//! the line that was checked for writeback the line that is evicted, and
//! [`insert_line`](SetAssociativeCache::insert_line) refuses to fill a new tag
//! without one. Under `Lru` the victim is always the current tail, so both
//! forms evict the same line.
//!
//! ## Example Usage
//!
//! ```
//! use setcache::{CoherenceState, Policy, SetAssociativeCache};
//!
//! let mut cache = SetAssociativeCache::new(4, 2, Policy::Lru).unwrap();
//! cache.change_state(0, 0, CoherenceState::Shared).unwrap();
//! assert_eq!(cache.find_state(0, 0).unwrap(), CoherenceState::Shared);
//!
//! let (candidate, dirty) = cache.check_writeback(0).unwrap();
//! assert_eq!(candidate.tag, 1);
//! assert!(!dirty);
//!
//! let evicted = cache
//!     .insert_line_evicting(candidate, 7, CoherenceState::Modified)
//!     .unwrap();
//! assert_eq!(evicted.map(|line| line.tag), Some(1));
//! assert_eq!(cache.recency_order(0).unwrap(), vec![7, 0]);
//! ```
//!
//! ## Thread Safety
//!
//! `SetAssociativeCache` is `Send` but provides no internal locking; every
//! call takes `&mut self`. With the `concurrency` feature,
//! [`ConcurrentSetCache`](crate::concurrent::ConcurrentSetCache) puts one lock
//! around each set.

use crate::ds::WayId;
use crate::error::{AccessError, ConfigError, InvariantError};
use crate::line::{CacheLine, CoherenceState, Tag};
use crate::policy::{Policy, Replacer};
use crate::set::CacheSet;

/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// The line a fill of `set` would displace, as chosen by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionCandidate {
    /// Set the candidate was selected in.
    pub set: usize,
    /// Way currently holding the candidate.
    pub way: WayId,
    pub tag: Tag,
    /// State of the candidate at selection time.
    pub state: CoherenceState,
}

impl EvictionCandidate {
    /// Returns `true` if the candidate must be written back before eviction.
    #[inline]
    pub fn needs_writeback(&self) -> bool {
        self.state.is_dirty()
    }

    /// The candidate as a line.
    #[inline]
    pub fn line(&self) -> CacheLine {
        CacheLine::new(self.tag, self.state)
    }
}

/// Fixed geometry cache of coherence-tracked lines.
#[derive(Debug, Clone)]
pub struct SetAssociativeCache {
    sets: Vec<CacheSet>,
    num_lines: usize,
    associativity: usize,
    policy: Policy,
}

/// Validates the geometry shared by every constructor.
pub(crate) fn validate_geometry(
    num_lines: usize,
    associativity: usize,
) -> Result<usize, ConfigError> {
    if associativity == 0 {
        return Err(ConfigError::new("associativity must be > 0"));
    }
    if num_lines == 0 {
        return Err(ConfigError::new("num_lines must be > 0"));
    }
    if num_lines % associativity != 0 {
        return Err(ConfigError::new(format!(
            "num_lines ({num_lines}) must be a multiple of associativity ({associativity})"
        )));
    }
    Ok(num_lines / associativity)
}

/// Per-set RNG seed, so sets draw independent streams.
pub(crate) fn set_seed(seed: u64, set: usize) -> u64 {
    seed ^ (set as u64).wrapping_add(1).wrapping_mul(DEFAULT_SEED)
}

impl SetAssociativeCache {
    /// Creates a cache of `num_lines` lines split into `associativity`-way
    /// sets, every way holding an `Invalid` placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] unless `num_lines` is a positive multiple of a
    /// positive `associativity`.
    ///
    /// # Example
    ///
    /// ```
    /// use setcache::{Policy, SetAssociativeCache};
    ///
    /// let cache = SetAssociativeCache::new(1024, 4, Policy::Random).unwrap();
    /// assert_eq!(cache.num_sets(), 256);
    /// ```
    pub fn new(
        num_lines: usize,
        associativity: usize,
        policy: Policy,
    ) -> Result<Self, ConfigError> {
        Self::with_seed(num_lines, associativity, policy, DEFAULT_SEED)
    }

    /// Like [`new`](Self::new), seeding the `Random` policy with `seed`.
    pub fn with_seed(
        num_lines: usize,
        associativity: usize,
        policy: Policy,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let num_sets = validate_geometry(num_lines, associativity)?;
        let sets = (0..num_sets)
            .map(|set| {
                CacheSet::new(associativity, Replacer::new(policy, set_seed(seed, set)))
            })
            .collect();

        log::debug!(
            "set-associative cache: {num_lines} lines, {num_sets} sets x {associativity} ways, \
             policy {policy}"
        );

        Ok(Self {
            sets,
            num_lines,
            associativity,
            policy,
        })
    }

    #[inline]
    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }

    #[inline]
    pub fn num_lines(&self) -> usize {
        self.num_lines
    }

    #[inline]
    pub fn associativity(&self) -> usize {
        self.associativity
    }

    #[inline]
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Returns set `set`, if it exists.
    #[inline]
    pub fn set(&self, set: usize) -> Option<&CacheSet> {
        self.sets.get(set)
    }

    /// Iterates all sets in index order.
    pub fn sets(&self) -> impl Iterator<Item = &CacheSet> {
        self.sets.iter()
    }

    /// State of `tag` in `set`; `Invalid` when the tag is not resident.
    ///
    /// Never mutates the cache.
    pub fn find_state(&self, set: usize, tag: Tag) -> Result<CoherenceState, AccessError> {
        Ok(self.set_ref(set)?.find_state(tag))
    }

    /// State of `tag` in `set`, or `None` when the tag is not resident.
    pub fn lookup(
        &self,
        set: usize,
        tag: Tag,
    ) -> Result<Option<CoherenceState>, AccessError> {
        Ok(self.set_ref(set)?.lookup(tag))
    }

    pub fn contains(&self, set: usize, tag: Tag) -> Result<bool, AccessError> {
        Ok(self.set_ref(set)?.contains(tag))
    }

    /// Overwrites the state of a resident line. Absent tags are left alone
    /// and reported as `Ok(false)`; this never inserts.
    pub fn change_state(
        &mut self,
        set: usize,
        tag: Tag,
        state: CoherenceState,
    ) -> Result<bool, AccessError> {
        Ok(self.set_mut(set)?.change_state(tag, state))
    }

    /// Records a hit: under LRU `tag` becomes most recently used. A no-op
    /// under Random, and for tags that are not resident (`Ok(false)`).
    pub fn update_lru(&mut self, set: usize, tag: Tag) -> Result<bool, AccessError> {
        Ok(self.set_mut(set)?.touch(tag))
    }

    /// Picks the line the next fill of `set` should displace.
    ///
    /// Lines are left untouched. Under Random this draws once; pass the
    /// result to [`insert_line_evicting`](Self::insert_line_evicting) so the
    /// same line is evicted.
    pub fn select_eviction_candidate(
        &mut self,
        set: usize,
    ) -> Result<EvictionCandidate, AccessError> {
        let (way, line) = self
            .set_mut(set)?
            .select_victim()
            .ok_or(AccessError::NoVictim { set })?;
        Ok(EvictionCandidate {
            set,
            way,
            tag: line.tag,
            state: line.state,
        })
    }

    /// Picks the eviction candidate and reports whether it is dirty
    /// (`Modified` or `Owned`).
    pub fn check_writeback(
        &mut self,
        set: usize,
    ) -> Result<(EvictionCandidate, bool), AccessError> {
        let candidate = self.select_eviction_candidate(set)?;
        let dirty = candidate.needs_writeback();
        if dirty {
            log::trace!(
                "set {set}: candidate tag {:#x} is {} and needs writeback",
                candidate.tag,
                candidate.state
            );
        }
        Ok((candidate, dirty))
    }

    /// Fills `tag` into `set`, evicting the current LRU tail, and makes it
    /// most recently used.
    ///
    /// Returns the evicted line, or `None` when `tag` was already resident and
    /// was only refreshed.
    ///
    /// # Errors
    ///
    /// [`AccessError::CandidateRequired`] when `set` uses Random replacement
    /// and `tag` is not resident: the victim must come from
    /// [`check_writeback`](Self::check_writeback) and go through
    /// [`insert_line_evicting`](Self::insert_line_evicting), so no second draw
    /// happens between the check and the fill.
    pub fn insert_line(
        &mut self,
        set: usize,
        tag: Tag,
        state: CoherenceState,
    ) -> Result<Option<CacheLine>, AccessError> {
        let cache_set = self.set_mut(set)?;
        if cache_set.policy() == Policy::Random && !cache_set.contains(tag) {
            return Err(AccessError::CandidateRequired { set });
        }
        Ok(cache_set.insert(tag, state))
    }

    /// Fills `tag` into `candidate.set`, evicting the candidate, and makes the
    /// new line most recently used.
    ///
    /// Under Random the candidate's way is reclaimed even if the line in it
    /// changed since the check. Under LRU the current tail is evicted, which
    /// differs from the candidate only if the set was touched in between.
    ///
    /// # Errors
    ///
    /// [`AccessError::SetOutOfRange`] if the candidate's set does not exist.
    pub fn insert_line_evicting(
        &mut self,
        candidate: EvictionCandidate,
        tag: Tag,
        state: CoherenceState,
    ) -> Result<Option<CacheLine>, AccessError> {
        let set = self.set_mut(candidate.set)?;
        Ok(set.insert_at(candidate.way, candidate.tag, tag, state))
    }

    /// Like [`insert_line_evicting`](Self::insert_line_evicting), but
    /// checks that `candidate` was selected in `set`.
    pub fn insert_line_in(
        &mut self,
        set: usize,
        candidate: EvictionCandidate,
        tag: Tag,
        state: CoherenceState,
    ) -> Result<Option<CacheLine>, AccessError> {
        if candidate.set != set {
            return Err(AccessError::CandidateSetMismatch {
                candidate_set: candidate.set,
                set,
            });
        }
        self.insert_line_evicting(candidate, tag, state)
    }

    /// Resident tags of `set`, most recently used first.
    pub fn recency_order(&self, set: usize) -> Result<Vec<Tag>, AccessError> {
        Ok(self.set_ref(set)?.recency_order())
    }

    /// Resident lines of `set`, most recently used first.
    pub fn resident_lines(&self, set: usize) -> Result<Vec<CacheLine>, AccessError> {
        Ok(self.set_ref(set)?.lines().copied().collect())
    }

    /// Checks every set; the error names the first broken set.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        for (idx, set) in self.sets.iter().enumerate() {
            if set.len() != self.associativity {
                return Err(InvariantError::new(format!(
                    "set {idx} holds {} lines, expected {}",
                    set.len(),
                    self.associativity
                )));
            }
            set.check_invariants()
                .map_err(|err| InvariantError::new(format!("set {idx}: {}", err.message())))?;
        }
        Ok(())
    }

    /// Consumes the cache, returning its sets.
    pub fn into_sets(self) -> Vec<CacheSet> {
        self.sets
    }

    #[cfg(feature = "concurrency")]
    pub(crate) fn from_parts(
        sets: Vec<CacheSet>,
        num_lines: usize,
        associativity: usize,
        policy: Policy,
    ) -> Self {
        Self {
            sets,
            num_lines,
            associativity,
            policy,
        }
    }

    #[inline]
    fn set_ref(&self, set: usize) -> Result<&CacheSet, AccessError> {
        let num_sets = self.sets.len();
        self.sets
            .get(set)
            .ok_or(AccessError::SetOutOfRange { set, num_sets })
    }

    #[inline]
    fn set_mut(&mut self, set: usize) -> Result<&mut CacheSet, AccessError> {
        let num_sets = self.sets.len();
        self.sets
            .get_mut(set)
            .ok_or(AccessError::SetOutOfRange { set, num_sets })
    }
}
