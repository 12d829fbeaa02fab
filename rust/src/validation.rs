//! Validation and debugging utilities for BPlusTreeIndex.
//!
//! [`BPlusTreeIndex::validate`] is the diagnostic oracle used by the tests:
//! it checks node bounds, exact separators, uniform leaf depth, leaf link
//! continuity in both directions, and that every allocated arena slot is
//! reachable from the root.

use std::fmt::{Debug, Write};

use crate::error::{BPlusTreeError, BTreeResult};
use crate::types::{BPlusTreeIndex, NodeId, NodeRef, NULL_NODE};

/// Key interval a subtree must respect, inclusive on both ends.
struct KeyBounds<'a, K> {
    lower: Option<&'a K>,
    upper: Option<&'a K>,
}

impl<'a, K: Ord> KeyBounds<'a, K> {
    fn contains(&self, key: &K) -> bool {
        self.lower.map_or(true, |lower| key >= lower) && self.upper.map_or(true, |upper| key <= upper)
    }
}

// ============================================================================
// VALIDATION METHODS
// ============================================================================

impl<K: Ord + Clone, V> BPlusTreeIndex<K, V> {
    /// Returns true if every structural invariant holds.
    pub fn check_invariants(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check every structural invariant, reporting the first one broken.
    pub fn validate(&self) -> BTreeResult<()> {
        let mut tree_leaves = Vec::new();
        let mut leaf_depth = None;
        let bounds = KeyBounds {
            lower: None,
            upper: None,
        };
        self.validate_node(self.root, bounds, 0, &mut leaf_depth, &mut tree_leaves)?;
        self.validate_leaf_links(&tree_leaves)?;
        self.validate_arena_accounting()
    }

    fn validate_node<'a>(
        &'a self,
        node: NodeRef,
        bounds: KeyBounds<'a, K>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
        leaves: &mut Vec<NodeId>,
    ) -> BTreeResult<()> {
        let is_root = node == self.root;
        match node {
            NodeRef::Leaf(id) => {
                let leaf = self
                    .get_leaf(id)
                    .ok_or_else(|| corrupted("leaf", format!("leaf {} is not allocated", id)))?;
                if leaf.len() > self.degree {
                    return Err(corrupted(
                        "leaf",
                        format!("leaf {} holds {} items, degree is {}", id, leaf.len(), self.degree),
                    ));
                }
                if leaf.is_empty() && !is_root {
                    return Err(corrupted("leaf", format!("non-root leaf {} is empty", id)));
                }
                if leaf.items().windows(2).any(|pair| pair[0].key > pair[1].key) {
                    return Err(corrupted("leaf", format!("leaf {} is out of order", id)));
                }
                if !leaf.items().iter().all(|item| bounds.contains(&item.key)) {
                    return Err(corrupted(
                        "separator",
                        format!("leaf {} holds a key outside its parent's separators", id),
                    ));
                }
                match *leaf_depth {
                    Some(expected) if expected != depth => {
                        return Err(corrupted(
                            "height",
                            format!("leaf {} at depth {}, others at depth {}", id, depth, expected),
                        ));
                    }
                    _ => *leaf_depth = Some(depth),
                }
                leaves.push(id);
                Ok(())
            }
            NodeRef::Branch(id) => {
                let branch = self
                    .get_branch(id)
                    .ok_or_else(|| corrupted("branch", format!("branch {} is not allocated", id)))?;
                let children = branch.child_count();
                if children < 2 || children > self.degree {
                    return Err(corrupted(
                        "branch",
                        format!("branch {} has {} children, degree is {}", id, children, self.degree),
                    ));
                }
                if branch.keys().len() + 1 != children {
                    return Err(corrupted(
                        "branch",
                        format!("branch {} has {} separators for {} children", id, branch.keys().len(), children),
                    ));
                }
                for index in 0..children {
                    let child = branch.child(index).ok_or_else(|| {
                        corrupted("branch", format!("branch {} lost child {}", id, index))
                    })?;
                    if child.kind() != branch.child_kind() {
                        return Err(corrupted(
                            "branch",
                            format!("branch {} mixes leaf and branch children", id),
                        ));
                    }
                    if index > 0 {
                        let separator = &branch.keys()[index - 1];
                        let child_min = self.subtree_min(child).map_err(|err| {
                            corrupted("separator", format!("branch {} child {}: {}", id, index, err))
                        })?;
                        if *separator != child_min {
                            return Err(corrupted(
                                "separator",
                                format!("branch {} separator {} is not the minimum of its right child", id, index - 1),
                            ));
                        }
                    }
                    let child_bounds = KeyBounds {
                        lower: index.checked_sub(1).map(|i| &branch.keys()[i]).or(bounds.lower),
                        upper: branch.keys().get(index).or(bounds.upper),
                    };
                    self.validate_node(child, child_bounds, depth + 1, leaf_depth, leaves)?;
                }
                Ok(())
            }
        }
    }

    /// Walk the leaf list both ways and compare it with the in-order leaves.
    fn validate_leaf_links(&self, tree_leaves: &[NodeId]) -> BTreeResult<()> {
        let mut forward = Vec::with_capacity(tree_leaves.len());
        let mut previous = NULL_NODE;
        let mut current = self.first_leaf_id().unwrap_or(NULL_NODE);
        while current != NULL_NODE {
            if forward.len() > tree_leaves.len() {
                return Err(corrupted("leaf links", "forward walk does not terminate".to_string()));
            }
            let leaf = self
                .get_leaf(current)
                .ok_or_else(|| corrupted("leaf links", format!("next link to freed leaf {}", current)))?;
            if leaf.prev != previous {
                return Err(corrupted(
                    "leaf links",
                    format!("leaf {} points back to {}, expected {}", current, leaf.prev, previous),
                ));
            }
            forward.push(current);
            previous = current;
            current = leaf.next;
        }
        if forward != tree_leaves {
            return Err(corrupted(
                "leaf links",
                format!("tree order {:?}, forward walk {:?}", tree_leaves, forward),
            ));
        }

        let mut backward = Vec::with_capacity(tree_leaves.len());
        let mut current = self.last_leaf_id().unwrap_or(NULL_NODE);
        while current != NULL_NODE && backward.len() <= tree_leaves.len() {
            backward.push(current);
            current = self.get_leaf(current).map_or(NULL_NODE, |leaf| leaf.prev);
        }
        backward.reverse();
        if backward != tree_leaves {
            return Err(corrupted(
                "leaf links",
                format!("tree order {:?}, backward walk {:?}", tree_leaves, backward),
            ));
        }
        Ok(())
    }

    fn validate_arena_accounting(&self) -> BTreeResult<()> {
        let (leaves, branches) = self.count_nodes_in_tree();
        let leaf_stats = self.leaf_arena_stats();
        let branch_stats = self.branch_arena_stats();
        if leaves != leaf_stats.allocated_count || branches != branch_stats.allocated_count {
            return Err(corrupted(
                "arena",
                format!(
                    "tree reaches {} leaves and {} branches, arenas hold {} and {}",
                    leaves, branches, leaf_stats.allocated_count, branch_stats.allocated_count
                ),
            ));
        }
        Ok(())
    }

    // ============================================================================
    // SHAPE INSPECTION
    // ============================================================================

    /// Item count of every leaf, in leaf-list order.
    pub fn leaf_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::new();
        let mut current = self.first_leaf_id();
        while let Some(leaf) = current.and_then(|id| self.get_leaf(id)) {
            sizes.push(leaf.len());
            current = leaf.next_id();
        }
        sizes
    }

    /// Separators of every branch at `depth` (root is depth 0), left to right.
    pub fn separators_at_depth(&self, depth: usize) -> Vec<Vec<K>> {
        let mut level = vec![self.root];
        for _ in 0..depth {
            level = level
                .into_iter()
                .filter_map(|node| match node {
                    NodeRef::Branch(id) => self.get_branch(id),
                    NodeRef::Leaf(_) => None,
                })
                .flat_map(|branch| (0..branch.child_count()).filter_map(move |i| branch.child(i)))
                .collect();
        }
        level
            .into_iter()
            .filter_map(|node| match node {
                NodeRef::Branch(id) => self.get_branch(id).map(|branch| branch.keys().to_vec()),
                NodeRef::Leaf(_) => None,
            })
            .collect()
    }
}

impl<K: Ord + Clone + Debug, V> BPlusTreeIndex<K, V> {
    /// Human-readable dump of the whole tree, one node per line.
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "BPlusTreeIndex degree={} items={} height={}",
            self.degree,
            self.len(),
            self.height()
        );
        self.dump_node(self.root, 1, &mut out);
        out
    }

    fn dump_node(&self, node: NodeRef, indent: usize, out: &mut String) {
        let pad = "  ".repeat(indent);
        match node {
            NodeRef::Leaf(id) => match self.get_leaf(id) {
                Some(leaf) => {
                    let keys: Vec<&K> = leaf.items().iter().map(|item| &item.key).collect();
                    let _ = writeln!(
                        out,
                        "{}Leaf#{} prev={} next={} {:?}",
                        pad,
                        id,
                        link(leaf.prev),
                        link(leaf.next),
                        keys
                    );
                }
                None => {
                    let _ = writeln!(out, "{}Leaf#{} <missing>", pad, id);
                }
            },
            NodeRef::Branch(id) => match self.get_branch(id) {
                Some(branch) => {
                    let _ = writeln!(out, "{}Branch#{} {:?}", pad, id, branch.keys());
                    for child in (0..branch.child_count()).filter_map(|i| branch.child(i)) {
                        self.dump_node(child, indent + 1, out);
                    }
                }
                None => {
                    let _ = writeln!(out, "{}Branch#{} <missing>", pad, id);
                }
            },
        }
    }
}

fn link(id: NodeId) -> String {
    if id == NULL_NODE {
        "-".to_string()
    } else {
        id.to_string()
    }
}

fn corrupted(component: &str, details: String) -> BPlusTreeError {
    BPlusTreeError::corrupted_tree(component, &details)
}
