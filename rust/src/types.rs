//! Core types and data structures for BPlusTreeIndex.
//!
//! This module contains the node layout, the public item type and the small
//! status enums that the insert and delete engines pass between levels.

use crate::compact_arena::CompactArena;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Smallest degree for which both splitting and borrowing are well defined.
pub const MIN_DEGREE: usize = 3;

/// Degree used by `BPlusTreeIndex::default()`.
pub const DEFAULT_DEGREE: usize = 16;

// ============================================================================
// TYPE DEFINITIONS
// ============================================================================

/// Node ID type for arena-based allocation
pub type NodeId = u32;

/// Sentinel for "no node", used by the leaf `prev`/`next` links.
pub const NULL_NODE: NodeId = u32::MAX;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// A key with its payload. Several items may share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Item<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> Item<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    /// Split the item back into its key and value.
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> From<(K, V)> for Item<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// In-memory B+ tree index that keeps duplicate keys.
///
/// Items live in leaves that form a doubly-linked list in key order; branch
/// nodes hold separators where `separator[i]` is the minimum key of child
/// `i + 1`. Inserts go to the rightmost eligible leaf and deletes remove the
/// rightmost occurrence of a key, so duplicates behave like a stack per key.
///
/// # Examples
///
/// ```
/// use bplus_index::BPlusTreeIndex;
///
/// let mut index = BPlusTreeIndex::new(4).unwrap();
/// index.insert(7, "a").unwrap();
/// index.insert(7, "b").unwrap();
/// index.insert(3, "c").unwrap();
///
/// let sevens: Vec<_> = index.search(&7).iter().map(|item| item.value).collect();
/// assert_eq!(sevens, ["a", "b"]);
///
/// let outcome = index.delete(&7).unwrap();
/// assert!(outcome.deleted);
/// assert_eq!(index.get(&7), Some(&"a"));
/// ```
///
/// # Degree
///
/// `degree` is both the maximum number of items in a leaf and the maximum
/// number of children of a branch. It must be at least [`MIN_DEGREE`].
#[derive(Debug)]
pub struct BPlusTreeIndex<K, V> {
    /// Maximum items per leaf and children per branch.
    pub(crate) degree: usize,
    /// The root node of the tree.
    pub(crate) root: NodeRef,
    /// Arena storage for leaf nodes.
    pub(crate) leaf_arena: CompactArena<LeafNode<K, V>>,
    /// Arena storage for branch nodes.
    pub(crate) branch_arena: CompactArena<BranchNode<K>>,
}

/// Leaf node holding a sorted run of items.
#[derive(Debug, Clone)]
pub struct LeafNode<K, V> {
    /// Maximum number of items this node can hold.
    pub(crate) capacity: usize,
    /// Items sorted non-decreasing by key.
    pub(crate) items: Vec<Item<K, V>>,
    /// Previous leaf in key order, or `NULL_NODE`.
    pub(crate) prev: NodeId,
    /// Next leaf in key order, or `NULL_NODE`.
    pub(crate) next: NodeId,
}

/// What every child of a branch is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    Leaves,
    Branches,
}

impl ChildKind {
    /// Wrap a child id in the matching `NodeRef`.
    pub fn node_ref(self, id: NodeId) -> NodeRef {
        match self {
            ChildKind::Leaves => NodeRef::Leaf(id),
            ChildKind::Branches => NodeRef::Branch(id),
        }
    }
}

/// Internal (branch) node containing separators and child ids.
///
/// `children.len() == keys.len() + 1` outside of an in-flight delete; a
/// branch with a single child and no separators is a collapsed node that its
/// parent is about to repair.
#[derive(Debug, Clone)]
pub struct BranchNode<K> {
    /// Maximum number of children this node can hold.
    pub(crate) capacity: usize,
    /// Separators; `keys[i]` is the minimum key under `children[i + 1]`.
    pub(crate) keys: Vec<K>,
    /// Child ids, all of `kind`.
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: ChildKind,
}

// ============================================================================
// ENUMS AND RESULT TYPES
// ============================================================================

/// Node reference that can be either a leaf or branch node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    Leaf(NodeId),
    Branch(NodeId),
}

impl NodeRef {
    /// Return the raw node ID.
    pub fn id(&self) -> NodeId {
        match *self {
            NodeRef::Leaf(id) => id,
            NodeRef::Branch(id) => id,
        }
    }

    /// Returns true if this reference points to a leaf node.
    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeRef::Leaf(_))
    }

    /// The kind a parent of this node records for its children.
    pub fn kind(&self) -> ChildKind {
        match self {
            NodeRef::Leaf(_) => ChildKind::Leaves,
            NodeRef::Branch(_) => ChildKind::Branches,
        }
    }
}

/// Which child to follow when a key equals a separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Descent {
    /// Follow the rightmost child whose range can hold the key.
    Rightmost,
    /// Follow the leftmost child whose range can hold the key.
    Leftmost,
}

/// Result of an insertion below some node.
pub(crate) enum InsertResult<K> {
    /// The item fit without growing the caller's child list.
    Absorbed,
    /// The child split; `new_node` goes right of it with `separator_key`.
    Split { separator_key: K, new_node: NodeRef },
}

/// What a child reports to its parent after a delete below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DeleteStatus<K> {
    /// The key was not present; nothing changed.
    Absent,
    /// Deletion finished at or below the child.
    Done,
    /// The child's minimum key is now the carried key.
    RenewSeparator(K),
    /// The child is a branch left with one child and no separators.
    Collapsed,
}

/// Outcome of `BPlusTreeIndex::delete`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// An item was removed.
    pub deleted: bool,
    /// Some separator above the leaves was rewritten, removed, or the root
    /// was demoted.
    pub separator_changed: bool,
}
