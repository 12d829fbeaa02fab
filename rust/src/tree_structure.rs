//! Tree structure management operations for BPlusTreeIndex.
//!
//! Size queries, clearing and node counting. Counts are computed by walking
//! the tree; the index keeps no cached totals that could drift.

use crate::types::{BPlusTreeIndex, LeafNode, NodeRef};

// ============================================================================
// TREE STRUCTURE OPERATIONS
// ============================================================================

impl<K: Ord + Clone, V> BPlusTreeIndex<K, V> {
    /// Returns the number of items in the tree, duplicates included.
    pub fn len(&self) -> usize {
        self.len_recursive(self.root)
    }

    fn len_recursive(&self, node: NodeRef) -> usize {
        match node {
            NodeRef::Leaf(id) => self.get_leaf(id).map_or(0, |leaf| leaf.len()),
            NodeRef::Branch(id) => self.get_branch(id).map_or(0, |branch| {
                (0..branch.child_count())
                    .filter_map(|index| branch.child(index))
                    .map(|child| self.len_recursive(child))
                    .sum()
            }),
        }
    }

    /// Returns true if the tree holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the root is a leaf node.
    pub fn is_leaf_root(&self) -> bool {
        self.root.is_leaf()
    }

    /// Returns the number of leaf nodes in the tree.
    pub fn leaf_count(&self) -> usize {
        self.count_nodes_in_tree().0
    }

    /// Number of branch levels above the leaves; a leaf root has height 0.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let NodeRef::Branch(id) = current {
            match self.get_branch(id).and_then(|branch| branch.child(0)) {
                Some(child) => current = child,
                None => break,
            }
            height += 1;
        }
        height
    }

    /// Drop every item, leaving a single empty root leaf.
    pub fn clear(&mut self) {
        self.leaf_arena.clear();
        self.branch_arena.clear();
        // A cleared arena hands out slot 0 first.
        let _ = self.leaf_arena.allocate(LeafNode::new(self.degree));
        self.root = NodeRef::Leaf(0);
    }

    /// Count the `(leaf, branch)` nodes reachable from the root.
    pub fn count_nodes_in_tree(&self) -> (usize, usize) {
        self.count_nodes_recursive(self.root)
    }

    fn count_nodes_recursive(&self, node: NodeRef) -> (usize, usize) {
        match node {
            NodeRef::Leaf(_) => (1, 0),
            NodeRef::Branch(id) => {
                let Some(branch) = self.get_branch(id) else {
                    return (0, 0);
                };
                (0..branch.child_count())
                    .filter_map(|index| branch.child(index))
                    .map(|child| self.count_nodes_recursive(child))
                    .fold((0, 1), |(leaves, branches), (child_leaves, child_branches)| {
                        (leaves + child_leaves, branches + child_branches)
                    })
            }
        }
    }
}
