//! Random replacement.
//!
//! Victims are drawn uniformly over the set's ways, one fresh draw per
//! selection. Hits are not tracked. Because a draw is not repeatable, the
//! caller that checked a candidate must hand that same candidate to the insert
//! (see [`SetAssociativeCache::insert_line_evicting`](crate::SetAssociativeCache::insert_line_evicting)).
//!
//! ## Random Eviction (O(1))
//!
//! ```text
//!   ways: [w0, w1, w2, w3]     (slot order, not recency order)
//!
//!   1. i = rng.random_range(0..4)
//!   2. victim = w_i
//!   3. caller checks victim for writeback
//!   4. insert rewrites w_i in place and moves it to MRU
//! ```
//!
//! ## Implementation Notes
//!
//! - Uses `rand::rngs::SmallRng`, seeded per set for reproducible runs
//! - No access pattern tracking = zero metadata overhead on hits

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::ds::{RecencyList, WayId};
use crate::policy::{Policy, ReplacementPolicy};

/// Random strategy with its own RNG stream.
#[derive(Debug, Clone)]
pub struct RandomReplacement {
    rng: SmallRng,
}

impl RandomReplacement {
    /// Creates a strategy whose draws are fully determined by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl ReplacementPolicy for RandomReplacement {
    #[inline]
    fn kind(&self) -> Policy {
        Policy::Random
    }

    #[inline]
    fn on_hit<T>(&mut self, _order: &mut RecencyList<T>, _way: WayId) {}

    #[inline]
    fn select_victim<T>(&mut self, order: &RecencyList<T>) -> Option<WayId> {
        if order.is_empty() {
            return None;
        }
        let slot = self.rng.random_range(0..order.len());
        order.id_at(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(n: u64) -> RecencyList<u64> {
        let mut list = RecencyList::with_capacity(n as usize);
        for tag in 0..n {
            list.push_back(tag);
        }
        list
    }

    #[test]
    fn same_seed_same_draws() {
        let list = order(8);
        let mut a = RandomReplacement::with_seed(42);
        let mut b = RandomReplacement::with_seed(42);
        for _ in 0..100 {
            assert_eq!(a.select_victim(&list), b.select_victim(&list));
        }
    }

    #[test]
    fn victims_stay_in_range() {
        let list = order(4);
        let mut random = RandomReplacement::with_seed(1);
        for _ in 0..1000 {
            let victim = random.select_victim(&list).unwrap();
            assert!(victim.index() < 4);
        }
    }

    #[test]
    fn every_way_is_eventually_chosen() {
        let list = order(4);
        let mut random = RandomReplacement::with_seed(9);
        let mut hits = [0usize; 4];
        for _ in 0..4000 {
            hits[random.select_victim(&list).unwrap().index()] += 1;
        }
        // expected 1000 per way, std dev ~27
        for count in hits {
            assert!(count > 700 && count < 1300, "skewed draw: {hits:?}");
        }
    }

    #[test]
    fn hit_does_not_reorder() {
        let mut list = order(3);
        let mut random = RandomReplacement::with_seed(3);
        let tail = list.back_id().unwrap();
        random.on_hit(&mut list, tail);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn single_way_always_selected() {
        let list = order(1);
        let mut random = RandomReplacement::with_seed(5);
        for _ in 0..10 {
            assert_eq!(random.select_victim(&list), list.id_at(0));
        }
    }

    #[test]
    fn empty_order_has_no_victim() {
        let list: RecencyList<u64> = RecencyList::new();
        assert_eq!(RandomReplacement::with_seed(0).select_victim(&list), None);
    }
}
