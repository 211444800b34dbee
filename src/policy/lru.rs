//! Strict least-recently-used replacement.
//!
//! ```text
//!   HIT on B
//!     head ──► [A] ◄──► [B] ◄──► [C] ◄── tail
//!     move_to_front(B): O(1) through the way handle
//!     head ──► [B] ◄──► [A] ◄──► [C] ◄── tail
//!
//!   FILL with D (victim = tail C)
//!     slot of C rewritten to D, then move_to_front
//!     head ──► [D] ◄──► [B] ◄──► [A] ◄── tail
//! ```
//!
//! Victim selection is deterministic, so a candidate computed by
//! `check_writeback` is always the one a later insert would pick again.

use crate::ds::{RecencyList, WayId};
use crate::policy::{Policy, ReplacementPolicy};

/// LRU strategy. Stateless: all recency lives in the set's list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LruReplacement;

impl ReplacementPolicy for LruReplacement {
    #[inline]
    fn kind(&self) -> Policy {
        Policy::Lru
    }

    #[inline]
    fn on_hit<T>(&mut self, order: &mut RecencyList<T>, way: WayId) {
        order.move_to_front(way);
    }

    #[inline]
    fn select_victim<T>(&mut self, order: &RecencyList<T>) -> Option<WayId> {
        order.back_id()
    }
}
