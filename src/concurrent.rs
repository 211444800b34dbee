//! Per-set locking wrapper around [`SetAssociativeCache`].
//!
//! ```text
//!   ConcurrentSetCache
//!   ┌─────────────────────────────────────────────┐
//!   │  set 0: RwLock<CacheSet>                    │ ◄── core A
//!   │  set 1: RwLock<CacheSet>                    │ ◄── core B
//!   │  ...                                        │
//!   │  set n: RwLock<CacheSet>                    │
//!   └─────────────────────────────────────────────┘
//! ```
//!
//! Every call locks exactly one set, so accesses to different sets never
//! contend and every call on one set is serialized. Lookups take a read lock;
//! anything that can move a line or draw a random victim takes a write lock.
//!
//! A check-then-insert cycle spans two calls. Use [`ConcurrentSetCache::with_set`]
//! when another thread must not fill the same set in between.

use parking_lot::RwLock;

use crate::cache::{EvictionCandidate, SetAssociativeCache};
use crate::error::{AccessError, ConfigError};
use crate::line::{CacheLine, CoherenceState, Tag};
use crate::policy::Policy;
use crate::set::CacheSet;

/// Thread-safe set-associative cache with one `parking_lot::RwLock` per set.
#[derive(Debug)]
pub struct ConcurrentSetCache {
    sets: Box<[RwLock<CacheSet>]>,
    num_lines: usize,
    associativity: usize,
    policy: Policy,
}

impl ConcurrentSetCache {
    /// See [`SetAssociativeCache::new`].
    pub fn new(
        num_lines: usize,
        associativity: usize,
        policy: Policy,
    ) -> Result<Self, ConfigError> {
        SetAssociativeCache::new(num_lines, associativity, policy).map(Self::from)
    }

    /// See [`SetAssociativeCache::with_seed`].
    pub fn with_seed(
        num_lines: usize,
        associativity: usize,
        policy: Policy,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        SetAssociativeCache::with_seed(num_lines, associativity, policy, seed).map(Self::from)
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

    pub fn find_state(&self, set: usize, tag: Tag) -> Result<CoherenceState, AccessError> {
        Ok(self.lock(set)?.read().find_state(tag))
    }

    pub fn lookup(
        &self,
        set: usize,
        tag: Tag,
    ) -> Result<Option<CoherenceState>, AccessError> {
        Ok(self.lock(set)?.read().lookup(tag))
    }

    pub fn contains(&self, set: usize, tag: Tag) -> Result<bool, AccessError> {
        Ok(self.lock(set)?.read().contains(tag))
    }

    pub fn change_state(
        &self,
        set: usize,
        tag: Tag,
        state: CoherenceState,
    ) -> Result<bool, AccessError> {
        Ok(self.lock(set)?.write().change_state(tag, state))
    }

    pub fn update_lru(&self, set: usize, tag: Tag) -> Result<bool, AccessError> {
        Ok(self.lock(set)?.write().touch(tag))
    }

    /// Write-locks the set: under Random selection consumes a draw.
    pub fn select_eviction_candidate(
        &self,
        set: usize,
    ) -> Result<EvictionCandidate, AccessError> {
        let (way, line) = self
            .lock(set)?
            .write()
            .select_victim()
            .ok_or(AccessError::NoVictim { set })?;
        Ok(EvictionCandidate {
            set,
            way,
            tag: line.tag,
            state: line.state,
        })
    }

    pub fn check_writeback(
        &self,
        set: usize,
    ) -> Result<(EvictionCandidate, bool), AccessError> {
        let candidate = self.select_eviction_candidate(set)?;
        Ok((candidate, candidate.needs_writeback()))
    }

    /// See [`SetAssociativeCache::insert_line`]; Random sets reject new tags
    /// with [`AccessError::CandidateRequired`].
    pub fn insert_line(
        &self,
        set: usize,
        tag: Tag,
        state: CoherenceState,
    ) -> Result<Option<CacheLine>, AccessError> {
        let mut guard = self.lock(set)?.write();
        if guard.policy() == Policy::Random && !guard.contains(tag) {
            return Err(AccessError::CandidateRequired { set });
        }
        Ok(guard.insert(tag, state))
    }

    pub fn insert_line_evicting(
        &self,
        candidate: EvictionCandidate,
        tag: Tag,
        state: CoherenceState,
    ) -> Result<Option<CacheLine>, AccessError> {
        let mut guard = self.lock(candidate.set)?.write();
        Ok(guard.insert_at(candidate.way, candidate.tag, tag, state))
    }

    /// See [`SetAssociativeCache::insert_line_in`].
    pub fn insert_line_in(
        &self,
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

    pub fn recency_order(&self, set: usize) -> Result<Vec<Tag>, AccessError> {
        Ok(self.lock(set)?.read().recency_order())
    }

    pub fn resident_lines(&self, set: usize) -> Result<Vec<CacheLine>, AccessError> {
        Ok(self.lock(set)?.read().lines().copied().collect())
    }

    /// Runs `f` with set `set` locked for writing.
    pub fn with_set<R>(
        &self,
        set: usize,
        f: impl FnOnce(&mut CacheSet) -> R,
    ) -> Result<R, AccessError> {
        let mut guard = self.lock(set)?.write();
        Ok(f(&mut *guard))
    }

    /// Unwraps the locks, returning a single-threaded cache.
    pub fn into_inner(self) -> SetAssociativeCache {
        let sets = self
            .sets
            .into_vec()
            .into_iter()
            .map(RwLock::into_inner)
            .collect();
        SetAssociativeCache::from_parts(sets, self.num_lines, self.associativity, self.policy)
    }

    fn lock(&self, set: usize) -> Result<&RwLock<CacheSet>, AccessError> {
        self.sets.get(set).ok_or(AccessError::SetOutOfRange {
            set,
            num_sets: self.sets.len(),
        })
    }
}

impl From<SetAssociativeCache> for ConcurrentSetCache {
    fn from(cache: SetAssociativeCache) -> Self {
        let num_lines = cache.num_lines();
        let associativity = cache.associativity();
        let policy = cache.policy();
        let sets = cache.into_sets().into_iter().map(RwLock::new).collect();
        Self {
            sets,
            num_lines,
            associativity,
            policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::CoherenceState::*;

    #[test]
    fn is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConcurrentSetCache>();
    }

    #[test]
    fn mirrors_single_threaded_cycle() {
        let cache = ConcurrentSetCache::new(4, 2, Policy::Lru).unwrap();
        assert!(cache.change_state(0, 0, Shared).unwrap());
        let (candidate, dirty) = cache.check_writeback(0).unwrap();
        assert_eq!(candidate.tag, 1);
        assert!(!dirty);
        let evicted = cache.insert_line_evicting(candidate, 7, Modified).unwrap();
        assert_eq!(evicted, Some(CacheLine::invalid(1)));
        assert_eq!(cache.find_state(0, 7).unwrap(), Modified);
        assert_eq!(cache.lookup(0, 1).unwrap(), None);
    }

    #[test]
    fn out_of_range_set() {
        let cache = ConcurrentSetCache::new(4, 2, Policy::Random).unwrap();
        assert_eq!(
            cache.update_lru(5, 0),
            Err(AccessError::SetOutOfRange { set: 5, num_sets: 2 })
        );
    }

    #[test]
    fn with_set_runs_atomic_cycle() {
        let cache = ConcurrentSetCache::new(8, 4, Policy::Random).unwrap();
        let (checked, evicted) = cache
            .with_set(1, |set| {
                let (way, line) = set.select_victim().unwrap();
                (line, set.insert_at(way, line.tag, 500, Exclusive))
            })
            .unwrap();
        assert_eq!(evicted, Some(checked));
        assert_eq!(cache.find_state(1, 500).unwrap(), Exclusive);
    }

    #[test]
    fn random_fill_requires_candidate() {
        let cache = ConcurrentSetCache::with_seed(8, 8, Policy::Random, 12).unwrap();
        let (candidate, _) = cache.check_writeback(0).unwrap();
        assert_eq!(
            cache.insert_line(0, 40, Shared),
            Err(AccessError::CandidateRequired { set: 0 })
        );
        assert!(!cache.contains(0, 40).unwrap());
        let evicted = cache.insert_line_evicting(candidate, 40, Shared).unwrap();
        assert_eq!(evicted, Some(candidate.line()));
        assert!(cache.contains(0, 40).unwrap());
    }

    #[test]
    fn same_seed_same_candidates_as_single_threaded() {
        let concurrent = ConcurrentSetCache::with_seed(16, 4, Policy::Random, 77).unwrap();
        let mut plain = SetAssociativeCache::with_seed(16, 4, Policy::Random, 77).unwrap();
        for set in [0, 3, 1, 3, 2, 0] {
            assert_eq!(
                concurrent.select_eviction_candidate(set).unwrap(),
                plain.select_eviction_candidate(set).unwrap()
            );
        }
    }

    #[test]
    fn insert_line_in_checks_candidate_set() {
        let cache = ConcurrentSetCache::new(8, 4, Policy::Lru).unwrap();
        let candidate = cache.select_eviction_candidate(0).unwrap();
        assert_eq!(
            cache.insert_line_in(1, candidate, 9, Shared),
            Err(AccessError::CandidateSetMismatch {
                candidate_set: 0,
                set: 1
            })
        );
        assert_eq!(
            cache.insert_line_in(0, candidate, 9, Shared).unwrap(),
            Some(CacheLine::invalid(3))
        );
        assert_eq!(cache.recency_order(0).unwrap(), vec![9, 0, 1, 2]);
        assert_eq!(cache.resident_lines(1).unwrap()[0], CacheLine::invalid(0));
    }

    #[test]
    fn into_inner_keeps_contents() {
        let cache = ConcurrentSetCache::new(4, 2, Policy::Lru).unwrap();
        cache.insert_line(1, 9, Owned).unwrap();
        let inner = cache.into_inner();
        assert_eq!(inner.recency_order(1).unwrap(), vec![9, 0]);
        assert!(inner.check_invariants().is_ok());
    }
}
