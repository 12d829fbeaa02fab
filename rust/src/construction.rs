//! Construction and initialization logic for BPlusTreeIndex and nodes.
//!
//! The degree is the only configuration knob. It is validated once here and
//! copied into every node as its capacity.

use crate::compact_arena::CompactArena;
use crate::error::{BPlusTreeError, BTreeResult, InitResult, ModifyResult};
use crate::types::{
    BPlusTreeIndex, BranchNode, ChildKind, LeafNode, NodeRef, DEFAULT_DEGREE, MIN_DEGREE,
    NULL_NODE,
};

impl<K, V> BPlusTreeIndex<K, V> {
    /// Create an empty index with the given degree.
    ///
    /// # Errors
    ///
    /// Returns `BPlusTreeError::InvalidDegree` when `degree < 3`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bplus_index::BPlusTreeIndex;
    ///
    /// let index = BPlusTreeIndex::<i64, String>::new(4).unwrap();
    /// assert!(index.is_empty());
    /// assert!(BPlusTreeIndex::<i64, String>::new(2).is_err());
    /// ```
    pub fn new(degree: usize) -> InitResult<Self> {
        Self::validate_degree(degree)?;

        let mut leaf_arena = CompactArena::new();
        let root_id = leaf_arena
            .allocate(LeafNode::new(degree))
            .ok_or_else(|| BPlusTreeError::arena_exhausted("leaf", 0))?;

        Ok(Self {
            degree,
            root: NodeRef::Leaf(root_id),
            leaf_arena,
            branch_arena: CompactArena::new(),
        })
    }

    /// Create an empty index with [`DEFAULT_DEGREE`].
    pub fn with_default_degree() -> InitResult<Self> {
        Self::new(DEFAULT_DEGREE)
    }

    /// Check a degree read from some outside configuration.
    pub fn validate_degree(degree: usize) -> BTreeResult<()> {
        if degree < MIN_DEGREE {
            return Err(BPlusTreeError::invalid_degree(degree, MIN_DEGREE));
        }
        Ok(())
    }

    /// The degree this index was built with.
    pub fn degree(&self) -> usize {
        self.degree
    }
}

impl<K: Ord + Clone, V> BPlusTreeIndex<K, V> {
    /// Insert every pair from `items`, returning how many were inserted.
    ///
    /// Stops at the first error; pairs inserted before it stay in the tree.
    pub fn batch_insert<I>(&mut self, items: I) -> ModifyResult<usize>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut inserted = 0;
        for (key, value) in items {
            self.insert(key, value)?;
            inserted += 1;
        }
        Ok(inserted)
    }
}

impl<K, V> LeafNode<K, V> {
    /// Creates a new, unlinked leaf node with the specified capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::with_capacity(capacity + 1),
            prev: NULL_NODE,
            next: NULL_NODE,
        }
    }
}

impl<K> BranchNode<K> {
    /// Creates a new branch node with no children.
    pub fn new(capacity: usize, kind: ChildKind) -> Self {
        Self {
            capacity,
            keys: Vec::with_capacity(capacity),
            children: Vec::with_capacity(capacity + 1),
            kind,
        }
    }
}

impl<K, V> Default for BPlusTreeIndex<K, V> {
    fn default() -> Self {
        Self {
            degree: DEFAULT_DEGREE,
            root: NodeRef::Leaf(0),
            leaf_arena: {
                let mut arena = CompactArena::new();
                // The first slot of a fresh arena is always id 0.
                let _ = arena.allocate(LeafNode::new(DEFAULT_DEGREE));
                arena
            },
            branch_arena: CompactArena::new(),
        }
    }
}
