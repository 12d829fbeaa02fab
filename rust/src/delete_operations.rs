//! DELETE operations for BPlusTreeIndex.
//!
//! Nodes keep no parent pointers, so every repair is driven from the parent
//! while the recursion unwinds. A child answers with a [`DeleteStatus`]:
//!
//! * `Absent` - the key was not found, nothing was touched.
//! * `Done` - the child is consistent and its minimum is unchanged.
//! * `RenewSeparator(k)` - the child's minimum is now `k`; the parent
//!   rewrites the separator in front of it, or passes the news upward when
//!   the child is its first one.
//! * `Collapsed` - the child is a branch with a single child left. The
//!   parent borrows a subtree for it from a sibling or folds it into one.
//!
//! Leaves are allowed to run down to a single item. An emptied leaf is
//! refilled with one item from a sibling if possible, otherwise unlinked and
//! freed.

use tracing::{debug, trace};

use crate::error::{BPlusTreeError, BTreeResultExt, ModifyResult, TreeResult};
use crate::types::{
    BPlusTreeIndex, DeleteOutcome, DeleteStatus, NodeId, NodeRef, NULL_NODE,
};

impl<K: Ord + Clone, V> BPlusTreeIndex<K, V> {
    /// Delete one item with `key`. With duplicates, the rightmost one goes.
    ///
    /// A missing key is not an error: the outcome reports `deleted == false`
    /// and the tree is left exactly as it was.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeIndex;
    ///
    /// let mut index = BPlusTreeIndex::new(4).unwrap();
    /// index.insert(7, "a").unwrap();
    /// index.insert(7, "b").unwrap();
    ///
    /// let outcome = index.delete(&7).unwrap();
    /// assert!(outcome.deleted);
    /// assert_eq!(index.get(&7), Some(&"a"));
    /// assert!(!index.delete(&8).unwrap().deleted);
    /// ```
    pub fn delete(&mut self, key: &K) -> ModifyResult<DeleteOutcome> {
        let mut separator_changed = false;
        let root = self.root;
        let status = self
            .delete_recursive(root, key, &mut separator_changed)
            .with_operation("delete")?;

        match status {
            DeleteStatus::Absent => {
                debug!(target: "bplus_index::rebalance", "delete found no matching key");
                Ok(DeleteOutcome::default())
            }
            // The root has no separator in front of it.
            DeleteStatus::Done | DeleteStatus::RenewSeparator(_) => Ok(DeleteOutcome {
                deleted: true,
                separator_changed,
            }),
            DeleteStatus::Collapsed => {
                self.demote_root().with_operation("delete")?;
                Ok(DeleteOutcome {
                    deleted: true,
                    separator_changed: true,
                })
            }
        }
    }

    // ============================================================================
    // RECURSION
    // ============================================================================

    fn delete_recursive(
        &mut self,
        node: NodeRef,
        key: &K,
        changed: &mut bool,
    ) -> TreeResult<DeleteStatus<K>> {
        let id = match node {
            NodeRef::Leaf(id) => return self.delete_from_leaf(id, key),
            NodeRef::Branch(id) => id,
        };

        let (child_index, child) = {
            let branch = self.branch_ref(id)?;
            let index = branch.find_child_index(key);
            let child = branch.child(index).ok_or_else(|| {
                BPlusTreeError::invariant_violation(
                    "delete descent",
                    &format!("branch {} has no child {}", id, index),
                )
            })?;
            (index, child)
        };

        let status = self.delete_recursive(child, key, changed)?;
        if status == DeleteStatus::Absent {
            return Ok(DeleteStatus::Absent);
        }

        // An emptied leaf needs repair even when its removal reported `Done`.
        if let NodeRef::Leaf(leaf_id) = child {
            if self.leaf_ref(leaf_id)?.is_empty() {
                return self.rebalance_empty_leaf(id, child_index, changed);
            }
        }

        match status {
            DeleteStatus::Absent => Ok(DeleteStatus::Absent),
            DeleteStatus::Done => Ok(DeleteStatus::Done),
            DeleteStatus::RenewSeparator(new_min) => {
                self.absorb_renewal(id, child_index, new_min, changed)
            }
            DeleteStatus::Collapsed => match child {
                NodeRef::Branch(_) => self.repair_collapsed_child(id, child_index, changed),
                NodeRef::Leaf(leaf_id) => Err(BPlusTreeError::invariant_violation(
                    "delete",
                    &format!("leaf {} reported a collapse", leaf_id),
                )),
            },
        }
    }

    fn delete_from_leaf(&mut self, id: NodeId, key: &K) -> TreeResult<DeleteStatus<K>> {
        let leaf = self.leaf_mut(id)?;
        let Some(position) = leaf.rightmost_position(key) else {
            return Ok(DeleteStatus::Absent);
        };
        leaf.remove_at(position);

        match (position, leaf.first_key()) {
            (0, Some(new_min)) => Ok(DeleteStatus::RenewSeparator(new_min.clone())),
            _ => Ok(DeleteStatus::Done),
        }
    }

    // ============================================================================
    // SEPARATOR MAINTENANCE
    // ============================================================================

    /// Child `index` of `parent` now starts at `new_min`.
    fn absorb_renewal(
        &mut self,
        parent: NodeId,
        index: usize,
        new_min: K,
        changed: &mut bool,
    ) -> TreeResult<DeleteStatus<K>> {
        if index == 0 {
            return Ok(DeleteStatus::RenewSeparator(new_min));
        }
        *changed |= self.branch_mut(parent)?.set_separator(index - 1, new_min);
        Ok(DeleteStatus::Done)
    }

    fn renew_child_separator(
        &mut self,
        parent: NodeId,
        index: usize,
        changed: &mut bool,
    ) -> TreeResult<DeleteStatus<K>> {
        let child = self.child_at(parent, index)?;
        let new_min = self.subtree_min(child)?;
        self.absorb_renewal(parent, index, new_min, changed)
    }

    fn child_at(&self, parent: NodeId, index: usize) -> TreeResult<NodeRef> {
        self.branch_ref(parent)?.child(index).ok_or_else(|| {
            BPlusTreeError::invariant_violation(
                "rebalance",
                &format!("branch {} has no child {}", parent, index),
            )
        })
    }

    /// Ids of the children left and right of `index`, if any.
    fn siblings(&self, parent: NodeId, index: usize) -> TreeResult<(Option<NodeId>, Option<NodeId>)> {
        let branch = self.branch_ref(parent)?;
        let left = index
            .checked_sub(1)
            .and_then(|i| branch.child(i))
            .map(|child| child.id());
        let right = branch.child(index + 1).map(|child| child.id());
        Ok((left, right))
    }

    // ============================================================================
    // LEAF REPAIR
    // ============================================================================

    fn rebalance_empty_leaf(
        &mut self,
        parent: NodeId,
        index: usize,
        changed: &mut bool,
    ) -> TreeResult<DeleteStatus<K>> {
        let empty = self.child_at(parent, index)?.id();
        let (left, right) = self.siblings(parent, index)?;

        if let Some(right_id) = right {
            if self.leaf_ref(right_id)?.can_spare() {
                let right_leaf = self.leaf_mut(right_id)?;
                let moved = right_leaf.take_first();
                let right_min = right_leaf.first_key().cloned();
                let (Some(item), Some(right_min)) = (moved, right_min) else {
                    return Err(BPlusTreeError::invariant_violation(
                        "leaf borrow",
                        &format!("leaf {} could not spare an item", right_id),
                    ));
                };
                let new_min = item.key.clone();
                self.leaf_mut(empty)?.accept_from_right(item);
                *changed |= self.branch_mut(parent)?.set_separator(index, right_min);
                trace!(
                    target: "bplus_index::rebalance",
                    leaf = empty,
                    donor = right_id,
                    "refilled empty leaf from the right"
                );
                return self.absorb_renewal(parent, index, new_min, changed);
            }
        }

        if let Some(left_id) = left {
            if self.leaf_ref(left_id)?.can_spare() {
                let item = self.leaf_mut(left_id)?.take_last().ok_or_else(|| {
                    BPlusTreeError::invariant_violation(
                        "leaf borrow",
                        &format!("leaf {} could not spare an item", left_id),
                    )
                })?;
                let new_min = item.key.clone();
                self.leaf_mut(empty)?.accept_from_left(item);
                trace!(
                    target: "bplus_index::rebalance",
                    leaf = empty,
                    donor = left_id,
                    "refilled empty leaf from the left"
                );
                return self.absorb_renewal(parent, index, new_min, changed);
            }
        }

        self.unlink_leaf(empty)?;
        self.deallocate_leaf(empty)?;
        let branch = self.branch_mut(parent)?;
        branch.remove_child(index);
        *changed = true;
        let collapsed = branch.is_collapsed();
        trace!(
            target: "bplus_index::rebalance",
            leaf = empty,
            parent,
            collapsed,
            "removed empty leaf"
        );

        if collapsed {
            Ok(DeleteStatus::Collapsed)
        } else if index == 0 {
            self.renew_child_separator(parent, 0, changed)
        } else {
            Ok(DeleteStatus::Done)
        }
    }

    fn unlink_leaf(&mut self, id: NodeId) -> TreeResult<()> {
        let (prev, next) = {
            let leaf = self.leaf_ref(id)?;
            (leaf.prev, leaf.next)
        };
        if prev != NULL_NODE {
            self.leaf_mut(prev)?.next = next;
        }
        if next != NULL_NODE {
            self.leaf_mut(next)?.prev = prev;
        }
        Ok(())
    }

    // ============================================================================
    // BRANCH REPAIR
    // ============================================================================

    /// Child `index` of `parent` is a branch with one child and no separators.
    fn repair_collapsed_child(
        &mut self,
        parent: NodeId,
        index: usize,
        changed: &mut bool,
    ) -> TreeResult<DeleteStatus<K>> {
        let collapsed = self.child_at(parent, index)?.id();
        let survivor = {
            let node = self.branch_ref(collapsed)?;
            if node.child_count() != 1 {
                return Err(BPlusTreeError::invariant_violation(
                    "collapse repair",
                    &format!(
                        "branch {} reported a collapse with {} children",
                        collapsed,
                        node.child_count()
                    ),
                ));
            }
            node.child(0).ok_or_else(|| {
                BPlusTreeError::invariant_violation("collapse repair", "collapsed branch lost its child")
            })?
        };
        let (left, right) = self.siblings(parent, index)?;

        if let Some(right_id) = right {
            self.check_same_level(collapsed, right_id)?;
            if self.branch_ref(right_id)?.can_spare_child() {
                let donor = self.branch_mut(right_id)?;
                let kind = donor.child_kind();
                let (moved, right_min) = donor.pop_front_child().ok_or_else(|| {
                    BPlusTreeError::invariant_violation(
                        "subtree borrow",
                        &format!("branch {} could not spare a child", right_id),
                    )
                })?;
                let moved_min = self.subtree_min(kind.node_ref(moved))?;
                self.branch_mut(collapsed)?.accept_from_right(moved, moved_min);
                self.branch_mut(parent)?.set_separator(index, right_min);
                // Separators moved between the two siblings.
                *changed = true;
                trace!(
                    target: "bplus_index::rebalance",
                    branch = collapsed,
                    donor = right_id,
                    "borrowed subtree from the right"
                );
                return self.renew_child_separator(parent, index, changed);
            }
        }

        if let Some(left_id) = left {
            self.check_same_level(collapsed, left_id)?;
            if self.branch_ref(left_id)?.can_spare_child() {
                let (moved, moved_min) =
                    self.branch_mut(left_id)?.pop_back_child().ok_or_else(|| {
                        BPlusTreeError::invariant_violation(
                            "subtree borrow",
                            &format!("branch {} could not spare a child", left_id),
                        )
                    })?;
                let old_min = self.subtree_min(survivor)?;
                self.branch_mut(collapsed)?.accept_from_left(moved, old_min);
                *changed = true;
                trace!(
                    target: "bplus_index::rebalance",
                    branch = collapsed,
                    donor = left_id,
                    "borrowed subtree from the left"
                );
                return self.absorb_renewal(parent, index, moved_min, changed);
            }
        }

        // Neither sibling can spare a child: hand the survivor to one of them.
        let survivor_min = self.subtree_min(survivor)?;
        match (left, right) {
            (_, Some(right_id)) => {
                let right_min = self.subtree_min(NodeRef::Branch(right_id))?;
                self.branch_mut(right_id)?
                    .accept_from_left(survivor.id(), right_min);
            }
            (Some(left_id), None) => {
                self.branch_mut(left_id)?
                    .accept_from_right(survivor.id(), survivor_min.clone());
            }
            (None, None) => {
                return Err(BPlusTreeError::invariant_violation(
                    "collapse repair",
                    &format!("branch {} has no sibling to merge into", collapsed),
                ));
            }
        }

        self.deallocate_branch(collapsed)?;
        let branch = self.branch_mut(parent)?;
        branch.remove_child(index);
        *changed = true;
        let parent_collapsed = branch.is_collapsed();
        trace!(
            target: "bplus_index::rebalance",
            branch = collapsed,
            parent,
            collapsed = parent_collapsed,
            "merged collapsed branch into sibling"
        );

        if parent_collapsed {
            Ok(DeleteStatus::Collapsed)
        } else if right.is_some() {
            // The right sibling moved into slot `index` and now starts at the survivor.
            self.absorb_renewal(parent, index, survivor_min, changed)
        } else {
            Ok(DeleteStatus::Done)
        }
    }

    fn check_same_level(&self, a: NodeId, b: NodeId) -> TreeResult<()> {
        let (kind_a, kind_b) = (self.branch_ref(a)?.child_kind(), self.branch_ref(b)?.child_kind());
        if kind_a != kind_b {
            return Err(BPlusTreeError::invariant_violation(
                "rebalance",
                &format!("sibling branches {} and {} hold different node kinds", a, b),
            ));
        }
        Ok(())
    }

    /// Replace a root branch that is down to one child by that child.
    fn demote_root(&mut self) -> TreeResult<()> {
        let NodeRef::Branch(root_id) = self.root else {
            return Err(BPlusTreeError::invariant_violation(
                "root demotion",
                "a leaf root reported a collapse",
            ));
        };
        let child = {
            let root = self.branch_ref(root_id)?;
            match (root.child_count(), root.child(0)) {
                (1, Some(child)) => child,
                (count, _) => {
                    return Err(BPlusTreeError::invariant_violation(
                        "root demotion",
                        &format!("root {} has {} children", root_id, count),
                    ));
                }
            }
        };
        self.deallocate_branch(root_id)?;
        self.root = child;
        trace!(
            target: "bplus_index::rebalance",
            old_root = root_id,
            new_root = child.id(),
            "tree height shrank"
        );
        Ok(())
    }
}
