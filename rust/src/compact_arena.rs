//! Slot arena for tree nodes.
//!
//! Nodes are addressed by `NodeId`. Freed slots go on a free list and are
//! handed out again by the next allocation, so ids stay small and stable
//! for the lifetime of a node.

use std::convert::TryFrom;

use crate::error::{BPlusTreeError, TreeResult};
use crate::types::{NodeId, NULL_NODE};

/// Statistics for a compact arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactArenaStats {
    pub total_slots: usize,
    pub allocated_count: usize,
    pub free_count: usize,
}

/// Arena allocator with free-slot reuse.
#[derive(Debug)]
pub struct CompactArena<T> {
    /// Slot storage; `None` marks a free slot.
    storage: Vec<Option<T>>,
    /// Free slot ids for reuse
    free_list: Vec<NodeId>,
}

impl<T> CompactArena<T> {
    /// Create a new empty compact arena
    pub fn new() -> Self {
        Self {
            storage: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Allocate a new item in the arena and return its ID
    #[inline]
    pub fn allocate(&mut self, item: T) -> Option<NodeId> {
        if let Some(free_id) = self.free_list.pop() {
            self.storage[free_id as usize] = Some(item);
            return Some(free_id);
        }

        // NULL_NODE is reserved as the link sentinel.
        let id = NodeId::try_from(self.storage.len())
            .ok()
            .filter(|id| *id != NULL_NODE)?;
        self.storage.push(Some(item));
        Some(id)
    }

    /// Remove an item from the arena and return it
    #[inline]
    pub fn deallocate(&mut self, id: NodeId) -> Option<T> {
        let item = self.storage.get_mut(usize::try_from(id).ok()?)?.take()?;
        self.free_list.push(id);
        Some(item)
    }

    /// Get a reference to an item in the arena
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.storage.get(usize::try_from(id).ok()?)?.as_ref()
    }

    /// Get a mutable reference to an item in the arena
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.storage.get_mut(usize::try_from(id).ok()?)?.as_mut()
    }

    /// Check if an ID is valid and allocated
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Get the number of allocated items
    pub fn len(&self) -> usize {
        self.storage.len() - self.free_list.len()
    }

    /// Check if the arena is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all items from the arena
    pub fn clear(&mut self) {
        self.storage.clear();
        self.free_list.clear();
    }

    /// Get arena statistics
    pub fn stats(&self) -> CompactArenaStats {
        CompactArenaStats {
            total_slots: self.storage.len(),
            allocated_count: self.len(),
            free_count: self.free_list.len(),
        }
    }
}

impl<T> Default for CompactArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// BPLUSTREEINDEX ARENA ALLOCATION HELPERS
// ============================================================================

use crate::types::{BPlusTreeIndex, BranchNode, LeafNode};

impl<K, V> BPlusTreeIndex<K, V> {
    /// Allocate a new leaf node in the arena and return its ID.
    pub(crate) fn allocate_leaf(&mut self, leaf: LeafNode<K, V>) -> TreeResult<NodeId> {
        let slots = self.leaf_arena.stats().total_slots;
        self.leaf_arena
            .allocate(leaf)
            .ok_or_else(|| BPlusTreeError::arena_exhausted("leaf", slots))
    }

    /// Allocate a new branch node in the arena and return its ID.
    pub(crate) fn allocate_branch(&mut self, branch: BranchNode<K>) -> TreeResult<NodeId> {
        let slots = self.branch_arena.stats().total_slots;
        self.branch_arena
            .allocate(branch)
            .ok_or_else(|| BPlusTreeError::arena_exhausted("branch", slots))
    }

    /// Deallocate a leaf node from the arena.
    pub(crate) fn deallocate_leaf(&mut self, id: NodeId) -> TreeResult<LeafNode<K, V>> {
        self.leaf_arena
            .deallocate(id)
            .ok_or_else(|| BPlusTreeError::invariant_violation("free leaf", &missing(id)))
    }

    /// Deallocate a branch node from the arena.
    pub(crate) fn deallocate_branch(&mut self, id: NodeId) -> TreeResult<BranchNode<K>> {
        self.branch_arena
            .deallocate(id)
            .ok_or_else(|| BPlusTreeError::invariant_violation("free branch", &missing(id)))
    }

    // ============================================================================
    // CHECKED ARENA ACCESS
    // ============================================================================

    /// Leaf lookup for mutation paths; a miss means the tree is broken.
    pub(crate) fn leaf_ref(&self, id: NodeId) -> TreeResult<&LeafNode<K, V>> {
        self.leaf_arena
            .get(id)
            .ok_or_else(|| BPlusTreeError::invariant_violation("leaf lookup", &missing(id)))
    }

    pub(crate) fn leaf_mut(&mut self, id: NodeId) -> TreeResult<&mut LeafNode<K, V>> {
        self.leaf_arena
            .get_mut(id)
            .ok_or_else(|| BPlusTreeError::invariant_violation("leaf lookup", &missing(id)))
    }

    pub(crate) fn branch_ref(&self, id: NodeId) -> TreeResult<&BranchNode<K>> {
        self.branch_arena
            .get(id)
            .ok_or_else(|| BPlusTreeError::invariant_violation("branch lookup", &missing(id)))
    }

    pub(crate) fn branch_mut(&mut self, id: NodeId) -> TreeResult<&mut BranchNode<K>> {
        self.branch_arena
            .get_mut(id)
            .ok_or_else(|| BPlusTreeError::invariant_violation("branch lookup", &missing(id)))
    }

    // ============================================================================
    // ARENA STATISTICS
    // ============================================================================

    /// Get statistics for the leaf node arena.
    pub fn leaf_arena_stats(&self) -> CompactArenaStats {
        self.leaf_arena.stats()
    }

    /// Get statistics for the branch node arena.
    pub fn branch_arena_stats(&self) -> CompactArenaStats {
        self.branch_arena.stats()
    }
}

fn missing(id: NodeId) -> String {
    format!("node {} is not allocated", id)
}
