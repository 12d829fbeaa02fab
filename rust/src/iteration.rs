//! Iterator implementations for BPlusTreeIndex.
//!
//! All traversal runs over the doubly-linked leaf list. Each iterator caches
//! a reference to its current leaf so the arena is only consulted when it
//! steps to a neighbour.

use std::iter::FusedIterator;
use std::ops::Bound;

use crate::types::{BPlusTreeIndex, Item, LeafNode, NodeId};

// ============================================================================
// ITERATOR STRUCTS
// ============================================================================

/// Forward iterator over items, following `next` links.
pub struct ItemIterator<'a, K, V> {
    tree: &'a BPlusTreeIndex<K, V>,
    current_leaf_ref: Option<&'a LeafNode<K, V>>,
    current_leaf_index: usize,
    end_bound: Bound<K>,
}

/// Backward iterator over items, following `prev` links.
pub struct RevItemIterator<'a, K, V> {
    tree: &'a BPlusTreeIndex<K, V>,
    current_leaf_ref: Option<&'a LeafNode<K, V>>,
    /// Items before this position in the current leaf are still pending.
    current_leaf_position: usize,
    start_bound: Bound<K>,
}

/// Iterator over keys in the B+ tree.
pub struct KeyIterator<'a, K, V> {
    items: ItemIterator<'a, K, V>,
}

/// Iterator over values in the B+ tree.
pub struct ValueIterator<'a, K, V> {
    items: ItemIterator<'a, K, V>,
}

// ============================================================================
// BPLUSTREE ITERATOR METHODS
// ============================================================================

impl<K: Ord + Clone, V> BPlusTreeIndex<K, V> {
    /// Returns an iterator over all items in key order, duplicates oldest first.
    pub fn items(&self) -> ItemIterator<'_, K, V> {
        ItemIterator::new(self, self.first_leaf_id(), 0, Bound::Unbounded)
    }

    /// Returns an iterator over all items in reverse key order.
    pub fn items_rev(&self) -> RevItemIterator<'_, K, V> {
        let start = self
            .last_leaf_id()
            .and_then(|id| self.get_leaf(id).map(|leaf| (id, leaf.len())));
        RevItemIterator::new(self, start, Bound::Unbounded)
    }

    /// Returns an iterator over all keys in sorted order.
    pub fn keys(&self) -> KeyIterator<'_, K, V> {
        KeyIterator {
            items: self.items(),
        }
    }

    /// Returns an iterator over all values in key order.
    pub fn values(&self) -> ValueIterator<'_, K, V> {
        ValueIterator {
            items: self.items(),
        }
    }
}

// ============================================================================
// ITEMITERATOR IMPLEMENTATION
// ============================================================================

impl<'a, K: Ord, V> ItemIterator<'a, K, V> {
    /// Start at `index` of leaf `start`; `None` yields nothing.
    pub(crate) fn new(
        tree: &'a BPlusTreeIndex<K, V>,
        start: Option<NodeId>,
        index: usize,
        end_bound: Bound<K>,
    ) -> Self {
        Self {
            tree,
            current_leaf_ref: start.and_then(|id| tree.leaf_arena.get(id)),
            current_leaf_index: index,
            end_bound,
        }
    }

    fn beyond_end(&self, key: &K) -> bool {
        match &self.end_bound {
            Bound::Included(end) => key > end,
            Bound::Excluded(end) => key >= end,
            Bound::Unbounded => false,
        }
    }
}

impl<'a, K: Ord, V> Iterator for ItemIterator<'a, K, V> {
    type Item = &'a Item<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let leaf = self.current_leaf_ref?;
            if let Some(item) = leaf.items().get(self.current_leaf_index) {
                if self.beyond_end(&item.key) {
                    self.current_leaf_ref = None;
                    return None;
                }
                self.current_leaf_index += 1;
                return Some(item);
            }
            self.current_leaf_ref = leaf.next_id().and_then(|id| self.tree.leaf_arena.get(id));
            self.current_leaf_index = 0;
        }
    }
}

impl<'a, K: Ord, V> FusedIterator for ItemIterator<'a, K, V> {}

// ============================================================================
// REVITEMITERATOR IMPLEMENTATION
// ============================================================================

impl<'a, K: Ord, V> RevItemIterator<'a, K, V> {
    /// Start just before `position` of the given leaf; `None` yields nothing.
    pub(crate) fn new(
        tree: &'a BPlusTreeIndex<K, V>,
        start: Option<(NodeId, usize)>,
        start_bound: Bound<K>,
    ) -> Self {
        let (current_leaf_ref, current_leaf_position) = match start {
            Some((id, position)) => (tree.leaf_arena.get(id), position),
            None => (None, 0),
        };
        Self {
            tree,
            current_leaf_ref,
            current_leaf_position,
            start_bound,
        }
    }

    fn before_start(&self, key: &K) -> bool {
        match &self.start_bound {
            Bound::Included(start) => key < start,
            Bound::Excluded(start) => key <= start,
            Bound::Unbounded => false,
        }
    }
}

impl<'a, K: Ord, V> Iterator for RevItemIterator<'a, K, V> {
    type Item = &'a Item<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let leaf = self.current_leaf_ref?;
            let candidate = self
                .current_leaf_position
                .checked_sub(1)
                .and_then(|index| leaf.items().get(index));
            if let Some(item) = candidate {
                if self.before_start(&item.key) {
                    self.current_leaf_ref = None;
                    return None;
                }
                self.current_leaf_position -= 1;
                return Some(item);
            }
            self.current_leaf_ref = leaf.prev_id().and_then(|id| self.tree.leaf_arena.get(id));
            self.current_leaf_position = self.current_leaf_ref.map_or(0, |prev| prev.len());
        }
    }
}

impl<'a, K: Ord, V> FusedIterator for RevItemIterator<'a, K, V> {}

// ============================================================================
// KEY AND VALUE ITERATORS
// ============================================================================

impl<'a, K: Ord, V> Iterator for KeyIterator<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next().map(|item| &item.key)
    }
}

impl<'a, K: Ord, V> Iterator for ValueIterator<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next().map(|item| &item.value)
    }
}
