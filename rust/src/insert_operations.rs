//! INSERT operations for BPlusTreeIndex.
//!
//! Bottom-up insertion: the item goes into the rightmost leaf whose range
//! holds its key, overflowing nodes split in two, and each split hands a
//! separator (the minimum of the new right node) to the parent. A split of
//! the root grows the tree by one level.

use tracing::trace;

use crate::error::{BPlusTreeError, BTreeResultExt, ModifyResult, TreeResult};
use crate::types::{BPlusTreeIndex, BranchNode, InsertResult, Item, NodeId, NodeRef, NULL_NODE};

impl<K: Ord + Clone, V> BPlusTreeIndex<K, V> {
    /// Insert an item. Duplicate keys are kept, newest last.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeIndex;
    ///
    /// let mut index = BPlusTreeIndex::new(4).unwrap();
    /// index.insert(1, "one").unwrap();
    /// index.insert(1, "uno").unwrap();
    /// assert_eq!(index.len(), 2);
    /// assert_eq!(index.get(&1), Some(&"uno"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> ModifyResult<()> {
        self.insert_item(Item::new(key, value))
    }

    /// Insert an already-built item.
    pub fn insert_item(&mut self, item: Item<K, V>) -> ModifyResult<()> {
        let root = self.root;
        match self.insert_recursive(root, item).with_operation("insert")? {
            InsertResult::Absorbed => Ok(()),
            InsertResult::Split {
                separator_key,
                new_node,
            } => self.new_root(separator_key, new_node).with_operation("insert"),
        }
    }

    // ============================================================================
    // HELPERS FOR INSERT OPERATIONS
    // ============================================================================

    fn insert_recursive(&mut self, node: NodeRef, item: Item<K, V>) -> TreeResult<InsertResult<K>> {
        match node {
            NodeRef::Leaf(id) => {
                let leaf = self.leaf_mut(id)?;
                leaf.insert(item);
                if !leaf.needs_split() {
                    return Ok(InsertResult::Absorbed);
                }
                self.split_leaf(id)
            }
            NodeRef::Branch(id) => {
                let (child_index, child) = {
                    let branch = self.branch_ref(id)?;
                    let index = branch.find_child_index(&item.key);
                    let child = branch.child(index).ok_or_else(|| {
                        BPlusTreeError::invariant_violation(
                            "insert descent",
                            &format!("branch {} has no child {}", id, index),
                        )
                    })?;
                    (index, child)
                };

                match self.insert_recursive(child, item)? {
                    InsertResult::Absorbed => Ok(InsertResult::Absorbed),
                    InsertResult::Split {
                        separator_key,
                        new_node,
                    } => {
                        let branch = self.branch_mut(id)?;
                        branch.insert_child(child_index, separator_key, new_node.id());
                        if !branch.needs_split() {
                            return Ok(InsertResult::Absorbed);
                        }
                        self.split_branch(id)
                    }
                }
            }
        }
    }

    /// Split an overfull leaf and splice the new right half into the list.
    fn split_leaf(&mut self, id: NodeId) -> TreeResult<InsertResult<K>> {
        let (mut right, old_next) = {
            let leaf = self.leaf_mut(id)?;
            (leaf.split(), leaf.next)
        };
        let separator_key = right.first_key().cloned().ok_or_else(|| {
            BPlusTreeError::invariant_violation("leaf split", "right half is empty")
        })?;

        right.prev = id;
        right.next = old_next;
        let new_id = self.allocate_leaf(right)?;
        self.leaf_mut(id)?.next = new_id;
        if old_next != NULL_NODE {
            self.leaf_mut(old_next)?.prev = new_id;
        }

        trace!(
            target: "bplus_index::split",
            leaf = id,
            new_leaf = new_id,
            degree = self.degree,
            "split leaf"
        );
        Ok(InsertResult::Split {
            separator_key,
            new_node: NodeRef::Leaf(new_id),
        })
    }

    fn split_branch(&mut self, id: NodeId) -> TreeResult<InsertResult<K>> {
        let (right, separator_key) = self.branch_mut(id)?.split().ok_or_else(|| {
            BPlusTreeError::invariant_violation("branch split", &format!("branch {} is malformed", id))
        })?;
        let new_id = self.allocate_branch(right)?;

        trace!(
            target: "bplus_index::split",
            branch = id,
            new_branch = new_id,
            degree = self.degree,
            "split branch"
        );
        Ok(InsertResult::Split {
            separator_key,
            new_node: NodeRef::Branch(new_id),
        })
    }

    /// Grow the tree: a new root above the old root and its split sibling.
    fn new_root(&mut self, separator_key: K, new_node: NodeRef) -> TreeResult<()> {
        let old_root = self.root;
        let mut root = BranchNode::new(self.degree, old_root.kind());
        root.keys.push(separator_key);
        root.children.push(old_root.id());
        root.children.push(new_node.id());

        let root_id = self.allocate_branch(root)?;
        self.root = NodeRef::Branch(root_id);
        trace!(target: "bplus_index::split", root = root_id, "grew new root");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{BPlusTreeIndex, NodeRef};

    #[test]
    fn test_root_leaf_splits_into_two_leaves() {
        let mut tree = BPlusTreeIndex::new(4).unwrap();
        for key in 1..=5 {
            tree.insert(key, key * 10).unwrap();
        }
        assert!(!tree.is_leaf_root());
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.leaf_sizes(), vec![3, 2]);
        assert_eq!(tree.separators_at_depth(0), vec![vec![4]]);
        assert!(tree.check_invariants());
    }

    #[test]
    fn test_increasing_inserts_build_expected_shape() {
        let mut tree = BPlusTreeIndex::new(4).unwrap();
        for key in 1..=21 {
            tree.insert(key, ()).unwrap();
        }
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.separators_at_depth(0), vec![vec![7, 13]]);
        assert_eq!(
            tree.separators_at_depth(1),
            vec![vec![4], vec![10], vec![16, 19]]
        );
        assert_eq!(tree.leaf_sizes(), vec![3, 3, 3, 3, 3, 3, 3]);
    }

    #[test]
    fn test_split_links_new_leaf_between_neighbours() {
        let mut tree = BPlusTreeIndex::new(3).unwrap();
        for key in [10, 20, 30, 40, 50, 60] {
            tree.insert(key, ()).unwrap();
        }
        // Split the first leaf so the new leaf lands between two existing ones.
        tree.insert(11, ()).unwrap();
        tree.insert(12, ()).unwrap();

        let mut forward = Vec::new();
        let mut current = tree.first_leaf_id();
        while let Some(id) = current {
            let leaf = tree.get_leaf(id).unwrap();
            if let Some(prev) = leaf.prev_id() {
                assert_eq!(tree.get_leaf(prev).unwrap().next_id(), Some(id));
            }
            forward.extend(leaf.items().iter().map(|item| item.key));
            current = leaf.next_id();
        }
        assert_eq!(forward, vec![10, 11, 12, 20, 30, 40, 50, 60]);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_duplicates_go_to_rightmost_leaf() {
        let mut tree = BPlusTreeIndex::new(3).unwrap();
        for value in 0..7 {
            tree.insert(1, value).unwrap();
        }
        let NodeRef::Branch(_) = tree.root() else {
            panic!("expected a branch root");
        };
        let values: Vec<_> = tree.items().map(|item| item.value).collect();
        assert_eq!(values, (0..7).collect::<Vec<_>>());
        assert!(tree.check_invariants());
    }
}
