//! Range query operations for BPlusTreeIndex.
//!
//! A range scan descends once to find its starting position and then walks
//! the leaf list. Tie-breaking on equal separators depends on the bound: an
//! included lower bound must see the first duplicate, so it descends
//! leftmost; an excluded one must skip every duplicate, so it descends
//! rightmost. Backward scans mirror this.

use std::ops::{Bound, RangeBounds};

use crate::iteration::{ItemIterator, RevItemIterator};
use crate::types::{BPlusTreeIndex, Descent, Item, NodeId};

// ============================================================================
// RANGE QUERY OPERATIONS
// ============================================================================

impl<K: Ord + Clone, V> BPlusTreeIndex<K, V> {
    /// Returns an iterator over the items whose keys fall in `range`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeIndex;
    ///
    /// let mut index = BPlusTreeIndex::new(4).unwrap();
    /// for i in 0..10 {
    ///     index.insert(i, i * 100).unwrap();
    /// }
    ///
    /// let keys: Vec<_> = index.range(3..7).map(|item| item.key).collect();
    /// assert_eq!(keys, vec![3, 4, 5, 6]);
    ///
    /// let keys: Vec<_> = index.range(7..).map(|item| item.key).collect();
    /// assert_eq!(keys, vec![7, 8, 9]);
    ///
    /// let values: Vec<_> = index.range(..=1).map(|item| item.value).collect();
    /// assert_eq!(values, vec![0, 100]);
    /// ```
    pub fn range<R>(&self, range: R) -> ItemIterator<'_, K, V>
    where
        R: RangeBounds<K>,
    {
        let (start, index) = match self.forward_start(range.start_bound()) {
            Some((leaf, index)) => (Some(leaf), index),
            None => (None, 0),
        };
        ItemIterator::new(self, start, index, range.end_bound().cloned())
    }

    /// Returns an iterator over the items in `range`, largest key first.
    ///
    /// ```
    /// use bplus_index::BPlusTreeIndex;
    ///
    /// let mut index = BPlusTreeIndex::new(4).unwrap();
    /// for i in 0..10 {
    ///     index.insert(i, ()).unwrap();
    /// }
    /// let keys: Vec<_> = index.range_rev(2..=5).map(|item| item.key).collect();
    /// assert_eq!(keys, vec![5, 4, 3, 2]);
    /// ```
    pub fn range_rev<R>(&self, range: R) -> RevItemIterator<'_, K, V>
    where
        R: RangeBounds<K>,
    {
        let start = self.backward_start(range.end_bound());
        RevItemIterator::new(self, start, range.start_bound().cloned())
    }

    /// Returns the item with the smallest key, oldest duplicate first.
    pub fn first(&self) -> Option<&Item<K, V>> {
        self.items().next()
    }

    /// Returns the item with the largest key, newest duplicate first.
    pub fn last(&self) -> Option<&Item<K, V>> {
        self.items_rev().next()
    }

    // ============================================================================
    // RANGE QUERY HELPERS
    // ============================================================================

    /// Leaf and index of the first item at or after the lower bound.
    fn forward_start(&self, bound: Bound<&K>) -> Option<(NodeId, usize)> {
        match bound {
            Bound::Included(key) => {
                let leaf_id = self.find_leaf(key, Descent::Leftmost).ok()?;
                Some((leaf_id, self.get_leaf(leaf_id)?.lower_bound(key)))
            }
            Bound::Excluded(key) => {
                let leaf_id = self.find_leaf(key, Descent::Rightmost).ok()?;
                Some((leaf_id, self.get_leaf(leaf_id)?.upper_bound(key)))
            }
            Bound::Unbounded => Some((self.first_leaf_id()?, 0)),
        }
    }

    /// Leaf and the position just past the last item within the upper bound.
    fn backward_start(&self, bound: Bound<&K>) -> Option<(NodeId, usize)> {
        match bound {
            Bound::Included(key) => {
                let leaf_id = self.find_leaf(key, Descent::Rightmost).ok()?;
                Some((leaf_id, self.get_leaf(leaf_id)?.upper_bound(key)))
            }
            Bound::Excluded(key) => {
                let leaf_id = self.find_leaf(key, Descent::Leftmost).ok()?;
                Some((leaf_id, self.get_leaf(leaf_id)?.lower_bound(key)))
            }
            Bound::Unbounded => {
                let leaf_id = self.last_leaf_id()?;
                Some((leaf_id, self.get_leaf(leaf_id)?.len()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ops::Bound;

    use crate::types::BPlusTreeIndex;

    fn tree_with_duplicates() -> BPlusTreeIndex<i32, usize> {
        let mut tree = BPlusTreeIndex::new(3).unwrap();
        let keys = [1, 2, 2, 2, 2, 3, 4, 4, 5, 6, 6, 6, 7];
        for (value, key) in keys.into_iter().enumerate() {
            tree.insert(key, value).unwrap();
        }
        tree
    }

    fn forward<R: std::ops::RangeBounds<i32>>(tree: &BPlusTreeIndex<i32, usize>, range: R) -> Vec<i32> {
        tree.range(range).map(|item| item.key).collect()
    }

    fn backward<R: std::ops::RangeBounds<i32>>(tree: &BPlusTreeIndex<i32, usize>, range: R) -> Vec<i32> {
        tree.range_rev(range).map(|item| item.key).collect()
    }

    #[test]
    fn test_included_bounds_keep_every_duplicate() {
        let tree = tree_with_duplicates();
        assert_eq!(forward(&tree, 2..=2), vec![2, 2, 2, 2]);
        assert_eq!(forward(&tree, 4..=6), vec![4, 4, 5, 6, 6, 6]);
        assert_eq!(backward(&tree, 4..=6), vec![6, 6, 6, 5, 4, 4]);
    }

    #[test]
    fn test_excluded_bounds_skip_every_duplicate() {
        let tree = tree_with_duplicates();
        let range = (Bound::Excluded(2), Bound::Excluded(6));
        assert_eq!(forward(&tree, range), vec![3, 4, 4, 5]);
        assert_eq!(backward(&tree, range), vec![5, 4, 4, 3]);
    }

    #[test]
    fn test_unbounded_and_empty_ranges() {
        let tree = tree_with_duplicates();
        assert_eq!(forward(&tree, ..).len(), 13);
        assert_eq!(backward(&tree, ..).len(), 13);
        assert!(forward(&tree, 8..).is_empty());
        assert!(backward(&tree, ..1).is_empty());
        assert!(forward(&tree, (Bound::Excluded(3), Bound::Excluded(4))).is_empty());
    }

    #[test]
    fn test_duplicates_come_out_in_insertion_order() {
        let tree = tree_with_duplicates();
        let values: Vec<usize> = tree.range(2..3).map(|item| item.value).collect();
        assert_eq!(values, vec![1, 2, 3, 4]);
        let values: Vec<usize> = tree.range_rev(2..3).map(|item| item.value).collect();
        assert_eq!(values, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_first_and_last() {
        let tree = tree_with_duplicates();
        assert_eq!(tree.first().map(|item| item.value), Some(0));
        assert_eq!(tree.last().map(|item| item.key), Some(7));

        let empty: BPlusTreeIndex<i32, ()> = BPlusTreeIndex::new(3).unwrap();
        assert!(empty.first().is_none());
        assert!(empty.last().is_none());
    }
}
