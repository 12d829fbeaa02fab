//! Node implementations for BPlusTreeIndex.
//!
//! Per-node primitives for LeafNode and BranchNode: positional search,
//! splitting, and the single-item / single-child moves used when borrowing
//! between siblings. Nothing here touches the arenas or the leaf links of
//! other nodes; that is left to the tree-level engines.

use std::ops::Range;

use crate::types::{BranchNode, ChildKind, Item, LeafNode, NodeId, NodeRef, NULL_NODE};

// ============================================================================
// LEAF NODE IMPLEMENTATION
// ============================================================================

impl<K: Ord, V> LeafNode<K, V> {
    /// Returns the number of items in this leaf.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if this leaf node is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The items of this leaf in key order.
    pub fn items(&self) -> &[Item<K, V>] {
        &self.items
    }

    /// Previous leaf in the linked list, if any.
    pub fn prev_id(&self) -> Option<NodeId> {
        (self.prev != NULL_NODE).then_some(self.prev)
    }

    /// Next leaf in the linked list, if any.
    pub fn next_id(&self) -> Option<NodeId> {
        (self.next != NULL_NODE).then_some(self.next)
    }

    pub fn first_key(&self) -> Option<&K> {
        self.items.first().map(|item| &item.key)
    }

    pub fn last_key(&self) -> Option<&K> {
        self.items.last().map(|item| &item.key)
    }

    /// Index of the first item with key `>= key`.
    pub fn lower_bound(&self, key: &K) -> usize {
        self.items.partition_point(|item| item.key < *key)
    }

    /// Index of the first item with key `> key`.
    pub fn upper_bound(&self, key: &K) -> usize {
        self.items.partition_point(|item| item.key <= *key)
    }

    /// Positions of all items equal to `key`.
    pub fn matching(&self, key: &K) -> Range<usize> {
        self.lower_bound(key)..self.upper_bound(key)
    }

    /// Position of the last item equal to `key`.
    pub fn rightmost_position(&self, key: &K) -> Option<usize> {
        let end = self.upper_bound(key);
        (end > 0 && self.items[end - 1].key == *key).then(|| end - 1)
    }

    // ============================================================================
    // INSERT OPERATIONS
    // ============================================================================

    /// Insert after every item with an equal key.
    pub fn insert(&mut self, item: Item<K, V>) {
        let index = self.upper_bound(&item.key);
        self.items.insert(index, item);
    }

    /// Returns true if this leaf node holds more than its capacity.
    pub fn needs_split(&self) -> bool {
        self.items.len() > self.capacity
    }

    /// Split off the upper half of this leaf.
    ///
    /// The left side keeps `ceil(n / 2)` items. The returned node is not
    /// linked; the caller splices it in after `self`.
    pub fn split(&mut self) -> LeafNode<K, V> {
        let mid = self.items.len().div_ceil(2);
        let mut right = LeafNode::new(self.capacity);
        right.items = self.items.split_off(mid);
        right
    }

    // ============================================================================
    // DELETE AND BORROW OPERATIONS
    // ============================================================================

    pub fn remove_at(&mut self, index: usize) -> Item<K, V> {
        self.items.remove(index)
    }

    /// A leaf can give an item away as long as it keeps one.
    pub fn can_spare(&self) -> bool {
        self.items.len() >= 2
    }

    /// Remove the first item (used when this is the right sibling).
    pub fn take_first(&mut self) -> Option<Item<K, V>> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items.remove(0))
    }

    /// Remove the last item (used when this is the left sibling).
    pub fn take_last(&mut self) -> Option<Item<K, V>> {
        self.items.pop()
    }

    /// Accept an item borrowed from the left sibling.
    pub fn accept_from_left(&mut self, item: Item<K, V>) {
        self.items.insert(0, item);
    }

    /// Accept an item borrowed from the right sibling.
    pub fn accept_from_right(&mut self, item: Item<K, V>) {
        self.items.push(item);
    }
}

// ============================================================================
// BRANCH NODE IMPLEMENTATION
// ============================================================================

impl<K: Ord + Clone> BranchNode<K> {
    /// Returns the number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Separators of this branch.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn child_kind(&self) -> ChildKind {
        self.kind
    }

    /// The child at `index`, typed by this branch's child kind.
    pub fn child(&self, index: usize) -> Option<NodeRef> {
        self.children
            .get(index)
            .map(|&id| self.kind.node_ref(id))
    }

    /// Child index for `key`; equal separators send the key right.
    pub fn find_child_index(&self, key: &K) -> usize {
        self.keys.partition_point(|separator| separator <= key)
    }

    /// Child index for `key`; equal separators send the key left.
    pub fn find_child_index_leftmost(&self, key: &K) -> usize {
        self.keys.partition_point(|separator| separator < key)
    }

    // ============================================================================
    // INSERT OPERATIONS
    // ============================================================================

    /// Put `new_child` right of `child_index` with `separator_key` between them.
    pub fn insert_child(&mut self, child_index: usize, separator_key: K, new_child: NodeId) {
        self.keys.insert(child_index, separator_key);
        self.children.insert(child_index + 1, new_child);
    }

    /// Returns true if this branch has more children than its capacity.
    pub fn needs_split(&self) -> bool {
        self.children.len() > self.capacity
    }

    /// Split this branch, returning the new right node and promoted key.
    ///
    /// The left side keeps `floor(n / 2)` children. The promoted key is the
    /// minimum of the right side and is removed from both halves. Returns
    /// `None` for a branch with fewer than two children.
    pub fn split(&mut self) -> Option<(BranchNode<K>, K)> {
        if self.children.len() < 2 || self.keys.len() + 1 != self.children.len() {
            return None;
        }
        let mid = self.children.len() / 2;

        let mut right = BranchNode::new(self.capacity, self.kind);
        right.children = self.children.split_off(mid);
        right.keys = self.keys.split_off(mid);
        let promoted = self.keys.pop()?;

        Some((right, promoted))
    }

    // ============================================================================
    // DELETE AND BORROW OPERATIONS
    // ============================================================================

    /// A branch can give a child away as long as it keeps two.
    pub fn can_spare_child(&self) -> bool {
        self.children.len() > 2
    }

    /// Fewer than two children: only a parent can repair this node.
    pub fn is_collapsed(&self) -> bool {
        self.children.len() < 2
    }

    /// Overwrite separator `index`, reporting whether its value changed.
    pub fn set_separator(&mut self, index: usize, key: K) -> bool {
        match self.keys.get_mut(index) {
            Some(slot) if *slot != key => {
                *slot = key;
                true
            }
            _ => false,
        }
    }

    /// Remove the child at `index` together with the separator that bounds it.
    ///
    /// For `index > 0` that is `keys[index - 1]`; for child 0 it is
    /// `keys[0]`, the old minimum of the child that becomes the new first.
    pub fn remove_child(&mut self, index: usize) -> Option<NodeId> {
        if index >= self.children.len() {
            return None;
        }
        if !self.keys.is_empty() {
            self.keys.remove(index.saturating_sub(1));
        }
        Some(self.children.remove(index))
    }

    /// Detach the first child. Returns it with this branch's new minimum.
    pub fn pop_front_child(&mut self) -> Option<(NodeId, K)> {
        if self.keys.is_empty() {
            return None;
        }
        let new_min = self.keys.remove(0);
        Some((self.children.remove(0), new_min))
    }

    /// Detach the last child. Returns it with its own minimum key.
    pub fn pop_back_child(&mut self) -> Option<(NodeId, K)> {
        let child_min = self.keys.pop()?;
        self.children.pop().map(|child| (child, child_min))
    }

    /// Prepend a child; `old_min` is this branch's minimum before the move.
    pub fn accept_from_left(&mut self, child: NodeId, old_min: K) {
        self.keys.insert(0, old_min);
        self.children.insert(0, child);
    }

    /// Append a child whose minimum key is `child_min`.
    pub fn accept_from_right(&mut self, child: NodeId, child_min: K) {
        self.keys.push(child_min);
        self.children.push(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_with(keys: &[i32]) -> LeafNode<i32, i32> {
        let mut leaf = LeafNode::new(4);
        for (value, &key) in keys.iter().enumerate() {
            leaf.insert(Item::new(key, value as i32));
        }
        leaf
    }

    #[test]
    fn test_leaf_insert_places_duplicates_last() {
        let leaf = leaf_with(&[5, 3, 5, 1]);
        let pairs: Vec<_> = leaf.items().iter().map(|i| (i.key, i.value)).collect();
        assert_eq!(pairs, vec![(1, 3), (3, 1), (5, 0), (5, 2)]);
        assert_eq!(leaf.rightmost_position(&5), Some(3));
        assert_eq!(leaf.rightmost_position(&4), None);
        assert_eq!(leaf.matching(&5), 2..4);
    }

    #[test]
    fn test_leaf_split_keeps_larger_half_left() {
        let mut leaf = leaf_with(&[1, 2, 3, 4, 5]);
        assert!(leaf.needs_split());
        let right = leaf.split();
        assert_eq!(leaf.len(), 3);
        assert_eq!(right.first_key(), Some(&4));
        assert_eq!(right.prev_id(), None);
    }

    #[test]
    fn test_leaf_borrow_helpers() {
        let mut left = leaf_with(&[1, 2]);
        let mut right = leaf_with(&[7]);
        assert!(left.can_spare());
        assert!(!right.can_spare());

        let moved = left.take_last().unwrap();
        right.accept_from_left(moved);
        assert_eq!(right.first_key(), Some(&2));
        assert_eq!(left.last_key(), Some(&1));
    }

    fn branch(keys: Vec<i32>, children: Vec<NodeId>) -> BranchNode<i32> {
        let mut node = BranchNode::new(4, ChildKind::Leaves);
        node.keys = keys;
        node.children = children;
        node
    }

    #[test]
    fn test_find_child_index_respects_tie_direction() {
        let node = branch(vec![10, 20, 20, 30], vec![0, 1, 2, 3, 4]);
        assert_eq!(node.find_child_index(&5), 0);
        assert_eq!(node.find_child_index(&10), 1);
        assert_eq!(node.find_child_index(&20), 3);
        assert_eq!(node.find_child_index_leftmost(&20), 1);
        assert_eq!(node.find_child_index(&99), 4);
    }

    #[test]
    fn test_branch_split_moves_right_half() {
        let mut node = branch(vec![10, 20, 30, 40], vec![0, 1, 2, 3, 4]);
        assert!(node.needs_split());
        let (right, promoted) = node.split().unwrap();
        assert_eq!(promoted, 20);
        assert_eq!(node.keys(), &[10]);
        assert_eq!(node.children, vec![0, 1]);
        assert_eq!(right.keys(), &[30, 40]);
        assert_eq!(right.children, vec![2, 3, 4]);
    }

    #[test]
    fn test_remove_child_drops_bounding_separator() {
        let mut node = branch(vec![10, 20, 30], vec![0, 1, 2, 3]);
        assert_eq!(node.remove_child(2), Some(2));
        assert_eq!(node.keys(), &[10, 30]);
        assert_eq!(node.remove_child(0), Some(0));
        assert_eq!(node.keys(), &[30]);
        assert_eq!(node.children, vec![1, 3]);
    }

    #[test]
    fn test_child_moves_between_branches() {
        let mut donor = branch(vec![10, 20], vec![0, 1, 2]);
        assert!(donor.can_spare_child());
        let (child, new_min) = donor.pop_front_child().unwrap();
        assert_eq!((child, new_min), (0, 10));
        assert!(!donor.can_spare_child());

        let mut receiver = branch(vec![], vec![7]);
        assert!(receiver.is_collapsed());
        receiver.accept_from_left(child, 5);
        assert_eq!(receiver.keys(), &[5]);
        assert_eq!(receiver.children, vec![0, 7]);
        assert!(receiver.set_separator(0, 6));
        assert!(!receiver.set_separator(0, 6));
    }
}
