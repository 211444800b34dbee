//! One cache set: a fixed number of ways, a tag index, and a replacement
//! strategy.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                            CacheSet                              │
//!   │                                                                  │
//!   │   index: FxHashMap<Tag, WayId>         ways: RecencyList<Line>   │
//!   │   ┌───────┬───────┐                                              │
//!   │   │  Tag  │ WayId │     head ─► [way 2: tag 7 M] (MRU)           │
//!   │   ├───────┼───────┤               ◄──►                           │
//!   │   │   7   │ way 2 │────►      [way 0: tag 0 S]                   │
//!   │   │   0   │ way 0 │────►        ◄──►                             │
//!   │   │   1   │ way 1 │────►      [way 1: tag 1 I] ◄─ tail (LRU)     │
//!   │   └───────┴───────┘                                              │
//!   │                                                                  │
//!   │   replacer: Replacer (Lru | Random), picks the next victim way   │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The index maps a tag straight to the way holding its line, so lookups,
//! state changes and promotions never scan. The state lives in the way's
//! node; there is exactly one copy of every line.
//!
//! ## Occupancy
//!
//! A set is created full of `Invalid` placeholder lines tagged
//! `0..associativity`, tag 0 most recently used. From then on every fill
//! rewrites one way in place, so `len() == associativity()` always holds.

use rustc_hash::FxHashMap;

use crate::ds::{RecencyList, WayId};
use crate::error::InvariantError;
use crate::line::{CacheLine, CoherenceState, Tag};
use crate::policy::{Policy, ReplacementPolicy, Replacer};

/// A fixed-capacity group of lines competing for the same ways.
#[derive(Debug, Clone)]
pub struct CacheSet {
    ways: RecencyList<CacheLine>,
    index: FxHashMap<Tag, WayId>,
    replacer: Replacer,
}

impl CacheSet {
    /// Creates a set of `associativity` placeholder lines.
    ///
    /// Placeholders are `Invalid` and tagged `0..associativity`, ordered so
    /// tag 0 is MRU and tag `associativity - 1` is the first LRU victim.
    pub fn new(associativity: usize, replacer: Replacer) -> Self {
        let mut ways = RecencyList::with_capacity(associativity);
        let mut index =
            FxHashMap::with_capacity_and_hasher(associativity, Default::default());
        for tag in 0..associativity as Tag {
            let way = ways.push_back(CacheLine::invalid(tag));
            index.insert(tag, way);
        }
        Self {
            ways,
            index,
            replacer,
        }
    }

    /// Number of ways.
    #[inline]
    pub fn associativity(&self) -> usize {
        self.ways.len()
    }

    /// Number of resident lines; equal to [`associativity`](Self::associativity).
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Replacement policy this set was built with.
    #[inline]
    pub fn policy(&self) -> Policy {
        self.replacer.kind()
    }

    /// Returns the stored state for `tag`, or `Invalid` when it is not
    /// resident.
    #[inline]
    pub fn find_state(&self, tag: Tag) -> CoherenceState {
        self.lookup(tag).unwrap_or_default()
    }

    /// Returns the stored state for `tag`, or `None` when it is not resident.
    ///
    /// Unlike [`find_state`](Self::find_state) this tells a resident
    /// `Invalid` line apart from an absent one.
    #[inline]
    pub fn lookup(&self, tag: Tag) -> Option<CoherenceState> {
        self.line(tag).map(|line| line.state)
    }

    /// Returns the resident line for `tag`.
    pub fn line(&self, tag: Tag) -> Option<&CacheLine> {
        let way = *self.index.get(&tag)?;
        self.ways.get(way)
    }

    #[inline]
    pub fn contains(&self, tag: Tag) -> bool {
        self.index.contains_key(&tag)
    }

    /// Overwrites the state of a resident line. Returns `false`, changing
    /// nothing, when `tag` is not resident.
    pub fn change_state(&mut self, tag: Tag, state: CoherenceState) -> bool {
        let Some(&way) = self.index.get(&tag) else {
            return false;
        };
        match self.ways.get_mut(way) {
            Some(line) => {
                line.state = state;
                true
            },
            None => false,
        }
    }

    /// Records a hit on `tag`. Under LRU the line becomes MRU; under Random
    /// nothing moves. Returns `false` when `tag` is not resident.
    pub fn touch(&mut self, tag: Tag) -> bool {
        let Some(&way) = self.index.get(&tag) else {
            return false;
        };
        self.replacer.on_hit(&mut self.ways, way);
        true
    }

    /// Chooses the next victim. Under Random this consumes one draw.
    pub fn select_victim(&mut self) -> Option<(WayId, CacheLine)> {
        let way = self.replacer.select_victim(&self.ways)?;
        let line = *self.ways.get(way)?;
        Some((way, line))
    }

    /// Selects a victim and fills `tag` into it in one step.
    ///
    /// Returns the evicted line, or `None` if `tag` was already resident (in
    /// which case its state is overwritten and it becomes MRU instead). Under
    /// Random the victim is a new draw, unrelated to any earlier
    /// [`select_victim`](Self::select_victim); fill a checked victim with
    /// [`insert_at`](Self::insert_at) instead.
    pub fn insert(&mut self, tag: Tag, state: CoherenceState) -> Option<CacheLine> {
        if let Some(previous) = self.refresh(tag, state) {
            log::debug!("fill of resident tag {tag:#x} refreshed it (was {previous})");
            return None;
        }
        let (way, line) = self.select_victim()?;
        self.replace(way, line.tag, CacheLine::new(tag, state))
    }

    /// Fills `tag` into the victim a previous
    /// [`select_victim`](Self::select_victim) returned as `(victim, expected_tag)`.
    ///
    /// Under LRU the current tail is evicted, whatever `victim` says; it is
    /// the candidate unless the set was touched since the check. Under Random
    /// `victim` itself is reclaimed, even if it no longer holds
    /// `expected_tag`, so no second draw happens. Returns `None` if `tag` was
    /// already resident, as [`insert`](Self::insert) does.
    pub fn insert_at(
        &mut self,
        victim: WayId,
        expected_tag: Tag,
        tag: Tag,
        state: CoherenceState,
    ) -> Option<CacheLine> {
        if let Some(previous) = self.refresh(tag, state) {
            log::debug!("fill of resident tag {tag:#x} refreshed it (was {previous})");
            return None;
        }
        let way = match self.replacer.kind() {
            Policy::Lru => self.ways.back_id()?,
            Policy::Random if self.ways.contains(victim) => victim,
            Policy::Random => {
                log::warn!(
                    "victim way {} outside set of {} ways, selecting afresh",
                    victim.index(),
                    self.ways.len()
                );
                return self.insert(tag, state);
            },
        };
        self.replace(way, expected_tag, CacheLine::new(tag, state))
    }

    /// Iterates resident lines from MRU to LRU.
    pub fn lines(&self) -> impl Iterator<Item = &CacheLine> {
        self.ways.iter()
    }

    /// Resident tags from MRU to LRU.
    pub fn recency_order(&self) -> Vec<Tag> {
        self.ways.iter().map(|line| line.tag).collect()
    }

    /// Verifies index/recency consistency and full occupancy.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let ways = self.ways.len();
        if self.index.len() != ways {
            return Err(InvariantError::new(format!(
                "index holds {} tags but set has {} ways",
                self.index.len(),
                ways
            )));
        }
        let linked = self.ways.iter().count();
        if linked != ways {
            return Err(InvariantError::new(format!(
                "recency order links {linked} of {ways} ways"
            )));
        }
        for (&tag, &way) in &self.index {
            match self.ways.get(way) {
                Some(line) if line.tag == tag => {},
                Some(line) => {
                    return Err(InvariantError::new(format!(
                        "tag {tag:#x} indexed to way {} holding tag {:#x}",
                        way.index(),
                        line.tag
                    )));
                },
                None => {
                    return Err(InvariantError::new(format!(
                        "tag {tag:#x} indexed to missing way {}",
                        way.index()
                    )));
                },
            }
        }
        Ok(())
    }

    fn refresh(&mut self, tag: Tag, state: CoherenceState) -> Option<CoherenceState> {
        let way = *self.index.get(&tag)?;
        let line = self.ways.get_mut(way)?;
        let previous = std::mem::replace(&mut line.state, state);
        self.replacer.on_fill(&mut self.ways, way);
        Some(previous)
    }

    /// Rewrites `way` with `incoming` and promotes it. The slot is reclaimed
    /// even when the index no longer agrees about who lives there.
    fn replace(
        &mut self,
        way: WayId,
        expected_tag: Tag,
        incoming: CacheLine,
    ) -> Option<CacheLine> {
        let slot = self.ways.get_mut(way)?;
        let evicted = std::mem::replace(slot, incoming);

        if evicted.tag != expected_tag {
            log::warn!(
                "stale eviction candidate: evicting way {} with tag {:#x}, expected {:#x}",
                way.index(),
                evicted.tag,
                expected_tag
            );
        }
        match self.index.get(&evicted.tag) {
            Some(&indexed) if indexed == way => {
                self.index.remove(&evicted.tag);
            },
            _ => log::warn!(
                "evicted tag {:#x} was not indexed to way {}, reclaiming slot only",
                evicted.tag,
                way.index()
            ),
        }
        self.index.insert(incoming.tag, way);
        self.replacer.on_fill(&mut self.ways, way);

        log::trace!(
            "evicted tag {:#x} ({}) from way {} for tag {:#x} ({})",
            evicted.tag,
            evicted.state,
            way.index(),
            incoming.tag,
            incoming.state
        );

        #[cfg(debug_assertions)]
        self.ways.debug_validate_invariants();
        debug_assert!(self.check_invariants().is_ok());

        Some(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::CoherenceState::*;

    fn lru_set(associativity: usize) -> CacheSet {
        CacheSet::new(associativity, Replacer::new(Policy::Lru, 0))
    }

    fn random_set(associativity: usize, seed: u64) -> CacheSet {
        CacheSet::new(associativity, Replacer::new(Policy::Random, seed))
    }

    // ==============================================
    // Construction
    // ==============================================

    mod construction {
        use super::*;

        #[test]
        fn starts_full_of_invalid_placeholders() {
            let set = lru_set(4);
            assert_eq!(set.len(), 4);
            assert_eq!(set.associativity(), 4);
            for tag in 0..4 {
                assert_eq!(set.lookup(tag), Some(Invalid));
            }
            assert!(set.check_invariants().is_ok());
        }

        #[test]
        fn tag_zero_is_mru() {
            let set = lru_set(4);
            assert_eq!(set.recency_order(), vec![0, 1, 2, 3]);
        }

        #[test]
        fn reports_policy() {
            assert_eq!(lru_set(2).policy(), Policy::Lru);
            assert_eq!(random_set(2, 1).policy(), Policy::Random);
        }
    }

    // ==============================================
    // Lookup and State Mutation
    // ==============================================

    mod lookup_and_state {
        use super::*;

        #[test]
        fn find_state_conflates_absent_and_invalid() {
            let set = lru_set(2);
            assert_eq!(set.find_state(1), Invalid);
            assert_eq!(set.find_state(99), Invalid);
            assert_eq!(set.lookup(1), Some(Invalid));
            assert_eq!(set.lookup(99), None);
        }

        #[test]
        fn change_state_updates_resident_line() {
            let mut set = lru_set(2);
            assert!(set.change_state(0, Shared));
            assert_eq!(set.find_state(0), Shared);
        }

        #[test]
        fn change_state_on_absent_tag_is_noop() {
            let mut set = lru_set(2);
            assert!(!set.change_state(42, Modified));
            assert!(!set.contains(42));
            assert_eq!(set.len(), 2);
        }

        #[test]
        fn change_state_does_not_touch_recency() {
            let mut set = lru_set(3);
            set.change_state(2, Modified);
            assert_eq!(set.recency_order(), vec![0, 1, 2]);
        }
    }

    // ==============================================
    // Recency
    // ==============================================

    mod recency {
        use super::*;

        #[test]
        fn touch_promotes_under_lru() {
            let mut set = lru_set(3);
            assert!(set.touch(2));
            assert_eq!(set.recency_order(), vec![2, 0, 1]);
        }

        #[test]
        fn touch_unknown_tag_is_noop() {
            let mut set = lru_set(3);
            assert!(!set.touch(77));
            assert_eq!(set.recency_order(), vec![0, 1, 2]);
        }

        #[test]
        fn touch_is_ignored_under_random() {
            let mut set = random_set(3, 4);
            assert!(set.touch(2));
            assert_eq!(set.recency_order(), vec![0, 1, 2]);
        }
    }

    // ==============================================
    // Eviction and Fill
    // ==============================================

    mod eviction {
        use super::*;

        #[test]
        fn lru_victim_is_tail() {
            let mut set = lru_set(2);
            let (_, line) = set.select_victim().unwrap();
            assert_eq!(line, CacheLine::invalid(1));
        }

        #[test]
        fn insert_evicts_tail_and_becomes_mru() {
            let mut set = lru_set(2);
            set.change_state(0, Shared);
            let evicted = set.insert(7, Modified);
            assert_eq!(evicted, Some(CacheLine::invalid(1)));
            assert_eq!(set.recency_order(), vec![7, 0]);
            assert_eq!(set.find_state(7), Modified);
            assert!(!set.contains(1));
            assert!(set.check_invariants().is_ok());
        }

        #[test]
        fn insert_at_uses_given_way() {
            let mut set = random_set(4, 11);
            let (way, line) = set.select_victim().unwrap();
            let evicted = set.insert_at(way, line.tag, 100, Exclusive).unwrap();
            assert_eq!(evicted, line);
            assert!(!set.contains(line.tag));
            assert_eq!(set.recency_order()[0], 100);
            assert_eq!(set.len(), 4);
        }

        #[test]
        fn lru_insert_at_after_hit_on_candidate_evicts_current_tail() {
            let mut set = lru_set(4);
            let (way, line) = set.select_victim().unwrap();
            assert_eq!(line.tag, 3);
            assert!(set.touch(3));
            assert_eq!(set.recency_order(), vec![3, 0, 1, 2]);

            let evicted = set.insert_at(way, line.tag, 9, Shared).unwrap();
            assert_eq!(evicted, CacheLine::invalid(2));
            assert_eq!(set.recency_order(), vec![9, 3, 0, 1]);
            assert!(set.check_invariants().is_ok());
        }

        #[test]
        fn lru_insert_at_after_other_fill_evicts_current_tail() {
            let mut set = lru_set(2);
            let (way, line) = set.select_victim().unwrap();
            // another fill takes the candidate's way first
            set.insert_at(way, line.tag, 50, Shared);
            assert_eq!(set.recency_order(), vec![50, 0]);
            let evicted = set.insert_at(way, line.tag, 60, Owned).unwrap();
            assert_eq!(evicted, CacheLine::invalid(0));
            assert_eq!(set.recency_order(), vec![60, 50]);
            assert!(set.check_invariants().is_ok());
        }

        #[test]
        fn random_insert_at_with_stale_candidate_reclaims_its_way() {
            let mut set = random_set(4, 21);
            let (way, line) = set.select_victim().unwrap();
            // another fill lands in the same way first
            set.insert_at(way, line.tag, 50, Shared);
            let evicted = set.insert_at(way, line.tag, 60, Owned).unwrap();
            assert_eq!(evicted, CacheLine::new(50, Shared));
            assert_eq!(set.line(60), Some(&CacheLine::new(60, Owned)));
            assert_eq!(set.recency_order()[0], 60);
            assert_eq!(set.len(), 4);
            assert!(set.check_invariants().is_ok());
        }

        #[test]
        fn random_insert_at_after_hit_keeps_checked_line_as_victim() {
            let mut set = random_set(4, 8);
            let (way, line) = set.select_victim().unwrap();
            set.touch(line.tag);
            set.change_state(line.tag, Modified);
            let evicted = set.insert_at(way, line.tag, 70, Shared).unwrap();
            assert_eq!(evicted, CacheLine::new(line.tag, Modified));
        }

        #[test]
        fn lru_insert_at_ignores_foreign_way() {
            let mut set = lru_set(2);
            let evicted = set.insert_at(WayId(9), 0, 5, Shared);
            assert_eq!(evicted, Some(CacheLine::invalid(1)));
            assert_eq!(set.recency_order(), vec![5, 0]);
        }

        #[test]
        fn random_insert_at_with_foreign_way_still_evicts_one_line() {
            let mut set = random_set(2, 3);
            let evicted = set.insert_at(WayId(9), 0, 5, Shared).unwrap();
            assert!(!set.contains(evicted.tag));
            assert_eq!(set.recency_order()[0], 5);
            assert_eq!(set.len(), 2);
        }

        #[test]
        fn inserting_resident_tag_refreshes_without_eviction() {
            let mut set = lru_set(3);
            let evicted = set.insert(2, Exclusive);
            assert_eq!(evicted, None);
            assert_eq!(set.recency_order(), vec![2, 0, 1]);
            assert_eq!(set.find_state(2), Exclusive);
            assert_eq!(set.len(), 3);
        }

        #[test]
        fn direct_mapped_set_always_evicts_its_only_line() {
            let mut set = lru_set(1);
            assert_eq!(set.insert(5, Shared), Some(CacheLine::invalid(0)));
            assert_eq!(
                set.insert(6, Modified),
                Some(CacheLine::new(5, Shared))
            );
            assert_eq!(set.recency_order(), vec![6]);
        }

        #[test]
        fn occupancy_is_constant_across_many_fills() {
            let mut set = random_set(8, 2);
            for tag in 100..1100 {
                set.insert(tag, Shared);
                assert_eq!(set.len(), 8);
            }
            assert!(set.check_invariants().is_ok());
        }
    }
}
