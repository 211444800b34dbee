//! Fixed-slot recency list for the ways of one cache set.
//!
//! Stores one node per way in a dense arena and links them by [`WayId`],
//! giving every resident line a stable handle and O(1) promotion without
//! pointer chasing. Nodes are never freed: an eviction rewrites the victim
//! node in place and moves it to the head, so the number of slots is fixed
//! once the set has been populated.
//!
//! ## Architecture
//!
//! ```text
//!   nodes (Vec<Node<T>>), indexed by WayId
//!   ┌───────┬────────────────────────────────────────────────┐
//!   │ WayId │ Node { value, prev, next }                     │
//!   ├───────┼────────────────────────────────────────────────┤
//!   │ way 0 │ { value: tag 0, prev: None, next: Some(way 1) } │
//!   │ way 1 │ { value: tag 1, prev: Some(way 0), next: way 2 }│
//!   │ way 2 │ { value: tag 2, prev: Some(way 1), next: None } │
//!   └───────┴────────────────────────────────────────────────┘
//!
//!   head (MRU) ─► [way 0] ◄──► [way 1] ◄──► [way 2] ◄── tail (LRU)
//! ```
//!
//! ## Operations
//! - `move_to_front(id)`: unlink, then relink at the head
//! - `back_id()`: current LRU tail
//! - `id_at(slot)`: handle for a raw slot index (uniform victim draws)
//!
//! ## Performance
//! - `push_front` / `push_back`: O(1)
//! - `move_to_front`: O(1)
//! - `iter`: O(n)
//!
//! `debug_validate_invariants()` is available in debug/test builds.

/// Stable handle of one way (slot) inside a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WayId(pub(crate) usize);

impl WayId {
    /// Returns the raw slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node<T> {
    value: T,
    prev: Option<WayId>,
    next: Option<WayId>,
}

/// Recency-ordered list of ways, most recently used at the head.
#[derive(Debug, Clone)]
pub struct RecencyList<T> {
    nodes: Vec<Node<T>>,
    head: Option<WayId>,
    tail: Option<WayId>,
}

impl<T> RecencyList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            head: None,
            tail: None,
        }
    }

    /// Creates an empty list with room for `capacity` ways.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    /// Returns the number of ways in the list.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the list holds no ways.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if `id` names a way of this list.
    pub fn contains(&self, id: WayId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Returns the MRU way.
    pub fn front_id(&self) -> Option<WayId> {
        self.head
    }

    /// Returns the LRU way.
    pub fn back_id(&self) -> Option<WayId> {
        self.tail
    }

    /// Returns the value stored in the MRU way.
    pub fn front(&self) -> Option<&T> {
        self.head.and_then(|id| self.get(id))
    }

    /// Returns the value stored in the LRU way.
    pub fn back(&self) -> Option<&T> {
        self.tail.and_then(|id| self.get(id))
    }

    /// Returns the handle for raw slot `slot`, independent of recency.
    pub fn id_at(&self, slot: usize) -> Option<WayId> {
        (slot < self.nodes.len()).then_some(WayId(slot))
    }

    /// Returns the value for a way, if present.
    pub fn get(&self, id: WayId) -> Option<&T> {
        self.nodes.get(id.0).map(|node| &node.value)
    }

    /// Returns a mutable reference to a way's value, if present.
    pub fn get_mut(&mut self, id: WayId) -> Option<&mut T> {
        self.nodes.get_mut(id.0).map(|node| &mut node.value)
    }

    /// Adds a new way at the head and returns its handle.
    pub fn push_front(&mut self, value: T) -> WayId {
        let id = WayId(self.nodes.len());
        self.nodes.push(Node {
            value,
            prev: None,
            next: None,
        });
        self.link_front(id);
        id
    }

    /// Adds a new way at the tail and returns its handle.
    pub fn push_back(&mut self, value: T) -> WayId {
        let id = WayId(self.nodes.len());
        self.nodes.push(Node {
            value,
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => self.nodes[tail.0].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Moves an existing way to the head; returns `false` if `id` is unknown.
    pub fn move_to_front(&mut self, id: WayId) -> bool {
        if !self.contains(id) {
            return false;
        }
        if self.head != Some(id) {
            self.unlink(id);
            self.link_front(id);
        }
        true
    }

    /// Returns an iterator over values from MRU to LRU.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.iter_entries().map(|(_, value)| value)
    }

    /// Returns an iterator over way handles from MRU to LRU.
    pub fn iter_ids(&self) -> impl Iterator<Item = WayId> + '_ {
        self.iter_entries().map(|(id, _)| id)
    }

    /// Returns an iterator over `(WayId, &T)` from MRU to LRU.
    pub fn iter_entries(&self) -> RecencyIter<'_, T> {
        RecencyIter {
            list: self,
            current: self.head,
        }
    }

    // Slots are never freed, so every `WayId` handed out stays in bounds and
    // the link fields below can be indexed directly.

    fn unlink(&mut self, id: WayId) {
        let (prev, next) = (self.nodes[id.0].prev, self.nodes[id.0].next);
        match prev {
            Some(p) => self.nodes[p.0].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n.0].prev = prev,
            None => self.tail = prev,
        }
    }

    fn link_front(&mut self, id: WayId) {
        let node = &mut self.nodes[id.0];
        node.prev = None;
        node.next = self.head;
        match self.head {
            Some(head) => self.nodes[head.0].prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    /// Panics unless the forward and backward walks are mirror images that
    /// visit every slot exactly once.
    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let forward: Vec<WayId> = self.iter_ids().take(self.len() + 1).collect();

        let mut backward = Vec::with_capacity(self.len());
        let mut current = self.tail;
        while let Some(id) = current {
            assert!(backward.len() <= self.len(), "backward walk loops");
            backward.push(id);
            current = self.nodes[id.0].prev;
        }
        backward.reverse();

        assert_eq!(forward.len(), self.len(), "forward walk misses or repeats ways");
        assert_eq!(forward, backward, "prev links disagree with next links");

        let mut seen = vec![false; self.len()];
        for id in forward {
            assert!(!std::mem::replace(&mut seen[id.0], true), "way {} linked twice", id.0);
        }
    }
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over `(WayId, &T)` pairs from MRU to LRU.
pub struct RecencyIter<'a, T> {
    list: &'a RecencyList<T>,
    current: Option<WayId>,
}

impl<'a, T> Iterator for RecencyIter<'a, T> {
    type Item = (WayId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.nodes.get(id.0)?;
        self.current = node.next;
        Some((id, &node.value))
    }
}
