//! GET operations for BPlusTreeIndex.
//!
//! Read-only descent from the root, point lookups and the leaf entry points
//! used by iteration and diagnostics.

use crate::error::{BPlusTreeError, TreeResult};
use crate::types::{BPlusTreeIndex, BranchNode, Descent, Item, LeafNode, NodeId, NodeRef};

impl<K: Ord + Clone, V> BPlusTreeIndex<K, V> {
    // ============================================================================
    // PUBLIC GET OPERATIONS
    // ============================================================================

    /// Every item with `key`, in leaf-list order.
    ///
    /// Duplicates are contiguous in the leaf list but may cross leaf
    /// boundaries; this follows `prev` links until the run ends.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeIndex;
    ///
    /// let mut index = BPlusTreeIndex::new(3).unwrap();
    /// for value in 0..5 {
    ///     index.insert(1, value).unwrap();
    /// }
    /// index.insert(2, 99).unwrap();
    ///
    /// let values: Vec<_> = index.search(&1).iter().map(|item| item.value).collect();
    /// assert_eq!(values, vec![0, 1, 2, 3, 4]);
    /// assert!(index.search(&3).is_empty());
    /// ```
    pub fn search(&self, key: &K) -> Vec<&Item<K, V>> {
        let Ok(start) = self.find_leaf(key, Descent::Rightmost) else {
            return Vec::new();
        };

        let mut runs: Vec<&[Item<K, V>]> = Vec::new();
        let mut current = Some(start);
        while let Some(leaf) = current.and_then(|id| self.get_leaf(id)) {
            let run = &leaf.items()[leaf.matching(key)];
            if run.is_empty() {
                break;
            }
            runs.push(run);
            // The run only continues left if it starts this leaf.
            current = if leaf.first_key() == Some(key) {
                leaf.prev_id()
            } else {
                None
            };
        }

        runs.into_iter().rev().flatten().collect()
    }

    /// Value of the rightmost item with `key`, the one `delete` would remove.
    pub fn get(&self, key: &K) -> Option<&V> {
        let leaf = self.get_leaf(self.find_leaf(key, Descent::Rightmost).ok()?)?;
        leaf.rightmost_position(key)
            .map(|index| &leaf.items()[index].value)
    }

    /// Check if at least one item has `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Number of items with `key`.
    pub fn count(&self, key: &K) -> usize {
        self.search(key).len()
    }

    // ============================================================================
    // NODE ACCESS
    // ============================================================================

    /// The root node reference.
    pub fn root(&self) -> NodeRef {
        self.root
    }

    /// Get a reference to a leaf node in the arena.
    pub fn get_leaf(&self, id: NodeId) -> Option<&LeafNode<K, V>> {
        self.leaf_arena.get(id)
    }

    /// Get a reference to a branch node in the arena.
    pub fn get_branch(&self, id: NodeId) -> Option<&BranchNode<K>> {
        self.branch_arena.get(id)
    }

    /// The leftmost leaf: start of the forward leaf list.
    pub fn first_leaf_id(&self) -> Option<NodeId> {
        self.edge_leaf(|branch| branch.child(0)).ok()
    }

    /// The rightmost leaf: start of the backward leaf list.
    pub fn last_leaf_id(&self) -> Option<NodeId> {
        self.edge_leaf(|branch| branch.child(branch.child_count().checked_sub(1)?))
            .ok()
    }

    // ============================================================================
    // DESCENT HELPERS
    // ============================================================================

    fn edge_leaf<F>(&self, pick: F) -> TreeResult<NodeId>
    where
        F: Fn(&BranchNode<K>) -> Option<NodeRef>,
    {
        let mut current = self.root;
        loop {
            match current {
                NodeRef::Leaf(id) => return Ok(id),
                NodeRef::Branch(id) => {
                    current = pick(self.branch_ref(id)?).ok_or_else(|| {
                        BPlusTreeError::invariant_violation("edge descent", "branch without children")
                    })?;
                }
            }
        }
    }

    /// Find the leaf whose range holds `key`, breaking separator ties by `descent`.
    pub(crate) fn find_leaf(&self, key: &K, descent: Descent) -> TreeResult<NodeId> {
        let mut current = self.root;
        loop {
            match current {
                NodeRef::Leaf(id) => return Ok(id),
                NodeRef::Branch(id) => {
                    let branch = self.branch_ref(id)?;
                    let index = match descent {
                        Descent::Rightmost => branch.find_child_index(key),
                        Descent::Leftmost => branch.find_child_index_leftmost(key),
                    };
                    current = branch.child(index).ok_or_else(|| {
                        BPlusTreeError::invariant_violation(
                            "key descent",
                            &format!("branch {} has no child {}", id, index),
                        )
                    })?;
                }
            }
        }
    }

    /// Smallest key stored under `node`.
    pub(crate) fn subtree_min(&self, node: NodeRef) -> TreeResult<K> {
        let mut current = node;
        loop {
            match current {
                NodeRef::Leaf(id) => {
                    return self.leaf_ref(id)?.first_key().cloned().ok_or_else(|| {
                        BPlusTreeError::invariant_violation(
                            "subtree minimum",
                            &format!("leaf {} is empty", id),
                        )
                    });
                }
                NodeRef::Branch(id) => {
                    current = self.branch_ref(id)?.child(0).ok_or_else(|| {
                        BPlusTreeError::invariant_violation(
                            "subtree minimum",
                            &format!("branch {} has no children", id),
                        )
                    })?;
                }
            }
        }
    }
}
