//! In-memory B+ tree index with duplicate keys.
//!
//! `BPlusTreeIndex` keeps `Item { key, value }` pairs in key order inside
//! arena-allocated leaves joined by a doubly-linked list, so full and range
//! scans run in either direction without touching the branches again.
//! Duplicate keys are allowed; a new duplicate lands after the existing ones
//! and a delete removes the rightmost one.
//!
//! Nodes have no parent pointers. Deletion reports what happened to a
//! subtree through a small status value returned up the recursion, and
//! every parent repairs its own separators and children from that status.
//!
//! ```
//! use bplus_index::BPlusTreeIndex;
//!
//! let mut index = BPlusTreeIndex::new(4).unwrap();
//! for (key, value) in [(3, "c"), (1, "a"), (2, "b"), (2, "b2")] {
//!     index.insert(key, value).unwrap();
//! }
//!
//! let twos: Vec<_> = index.search(&2).into_iter().map(|item| item.value).collect();
//! assert_eq!(twos, vec!["b", "b2"]);
//!
//! let outcome = index.delete(&2).unwrap();
//! assert!(outcome.deleted);
//! assert_eq!(index.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
//! ```

mod compact_arena;
mod construction;
mod delete_operations;
mod error;
mod get_operations;
mod insert_operations;
mod iteration;
mod node;
mod range_queries;
mod tree_structure;
mod types;
mod validation;

pub use compact_arena::{CompactArena, CompactArenaStats};
pub use error::{BPlusTreeError, BTreeResult, BTreeResultExt, InitResult, ModifyResult};
pub use iteration::{ItemIterator, KeyIterator, RevItemIterator, ValueIterator};
pub use types::{
    BPlusTreeIndex, BranchNode, ChildKind, DeleteOutcome, Item, LeafNode, NodeId, NodeRef,
    DEFAULT_DEGREE, MIN_DEGREE, NULL_NODE,
};
