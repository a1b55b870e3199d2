//! Recency list threaded through an arena of slots
//!
//! Entries live in a `Vec` of slots and link to each other by slot index,
//! with [`NONE`] as the end marker. Vacant slots form a free list and are
//! reused before the arena grows, so indices handed out stay stable for
//! as long as the entry lives. Push, touch and remove are all O(1).

use crate::error::{GlyphCacheError, Result};

/// Index of a slot in the arena
pub type SlotIndex = u32;

/// Sentinel for "no slot"
pub const NONE: SlotIndex = SlotIndex::MAX;

struct Node<T> {
    value: T,
    prev: SlotIndex,
    next: SlotIndex,
}

enum Slot<T> {
    Occupied(Node<T>),
    Vacant { next_free: SlotIndex },
}

/// Doubly linked recency list, most recent at the head
pub struct LruList<T> {
    slots: Vec<Slot<T>>,
    free_head: SlotIndex,
    head: SlotIndex,
    tail: SlotIndex,
    len: usize,
}

impl<T> LruList<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: NONE,
            head: NONE,
            tail: NONE,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slots allocated, including vacant ones
    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[cfg(test)]
    pub fn head(&self) -> Option<SlotIndex> {
        (self.head != NONE).then_some(self.head)
    }

    pub fn tail(&self) -> Option<SlotIndex> {
        (self.tail != NONE).then_some(self.tail)
    }

    fn node(&self, idx: SlotIndex) -> Option<&Node<T>> {
        match self.slots.get(idx as usize) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    fn node_mut(&mut self, idx: SlotIndex) -> Option<&mut Node<T>> {
        match self.slots.get_mut(idx as usize) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    pub fn get(&self, idx: SlotIndex) -> Option<&T> {
        self.node(idx).map(|node| &node.value)
    }

    /// The next more-recent entry
    #[cfg(test)]
    pub fn prev_of(&self, idx: SlotIndex) -> Option<SlotIndex> {
        self.node(idx)
            .map(|node| node.prev)
            .filter(|prev| *prev != NONE)
    }

    /// Stores `value` and links it at the head
    ///
    /// Fails with `OutOfMemory` before anything is linked if the arena
    /// cannot grow.
    pub fn try_push_front(&mut self, value: T) -> Result<SlotIndex> {
        let idx = if self.free_head != NONE {
            let idx = self.free_head;
            let next_free = match self.slots[idx as usize] {
                Slot::Vacant { next_free } => next_free,
                Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
            };
            self.free_head = next_free;
            self.slots[idx as usize] = Slot::Occupied(Node {
                value,
                prev: NONE,
                next: NONE,
            });
            idx
        } else {
            if self.slots.len() >= NONE as usize {
                return Err(GlyphCacheError::OutOfMemory("LRU slot index space"));
            }
            self.slots
                .try_reserve(1)
                .map_err(|_| GlyphCacheError::OutOfMemory("LRU slot"))?;
            self.slots.push(Slot::Occupied(Node {
                value,
                prev: NONE,
                next: NONE,
            }));
            (self.slots.len() - 1) as SlotIndex
        };
        self.link_front(idx);
        self.len += 1;
        Ok(idx)
    }

    /// Moves an entry to the head; a no-op when it is already there
    pub fn touch(&mut self, idx: SlotIndex) -> bool {
        if self.node(idx).is_none() {
            return false;
        }
        if self.head != idx {
            self.unlink(idx);
            self.link_front(idx);
        }
        true
    }

    /// Unlinks an entry and frees its slot
    pub fn remove(&mut self, idx: SlotIndex) -> Option<T> {
        self.node(idx)?;
        self.unlink(idx);
        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        let slot = std::mem::replace(&mut self.slots[idx as usize], vacant);
        self.free_head = idx;
        self.len -= 1;
        match slot {
            Slot::Occupied(node) => Some(node.value),
            Slot::Vacant { .. } => None,
        }
    }

    /// Removes the least recently used entry
    pub fn pop_back(&mut self) -> Option<(SlotIndex, T)> {
        let tail = self.tail()?;
        self.remove(tail).map(|value| (tail, value))
    }

    /// Walks from most to least recently used
    pub fn iter(&self) -> LruIter<'_, T> {
        LruIter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    fn link_front(&mut self, idx: SlotIndex) {
        let old_head = self.head;
        if let Some(node) = self.node_mut(idx) {
            node.prev = NONE;
            node.next = old_head;
        }
        if let Some(head) = self.node_mut(old_head) {
            head.prev = idx;
        } else {
            self.tail = idx;
        }
        self.head = idx;
    }

    fn unlink(&mut self, idx: SlotIndex) {
        let (prev, next) = match self.node(idx) {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match self.node_mut(prev) {
            Some(node) => node.next = next,
            None => self.head = next,
        }
        match self.node_mut(next) {
            Some(node) => node.prev = prev,
            None => self.tail = prev,
        }
        if let Some(node) = self.node_mut(idx) {
            node.prev = NONE;
            node.next = NONE;
        }
    }
}

impl<T> Default for LruList<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct LruIter<'a, T> {
    list: &'a LruList<T>,
    cursor: SlotIndex,
    remaining: usize,
}

impl<'a, T> Iterator for LruIter<'a, T> {
    type Item = (SlotIndex, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.node(self.cursor)?;
        let item = (self.cursor, &node.value);
        self.cursor = node.next;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
