//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Once;

use bplus_index::BPlusTreeIndex;
use tracing_subscriber::EnvFilter;

/// Install a subscriber once per test binary. `RUST_LOG=bplus_index=trace`
/// shows every split and rebalance step.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bplus_index=warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init();
    });
}

/// Multiset model: values per key, oldest first.
pub type Model = BTreeMap<i32, Vec<u32>>;

pub fn flatten(model: &Model) -> Vec<(i32, u32)> {
    model
        .iter()
        .flat_map(|(key, values)| values.iter().map(move |value| (*key, *value)))
        .collect()
}

pub fn tree_pairs(tree: &BPlusTreeIndex<i32, u32>) -> Vec<(i32, u32)> {
    tree.items().map(|item| (item.key, item.value)).collect()
}

/// Every separator in the tree, level by level.
pub fn all_separators(tree: &BPlusTreeIndex<i32, u32>) -> Vec<Vec<Vec<i32>>> {
    (0..tree.height()).map(|depth| tree.separators_at_depth(depth)).collect()
}

/// Panic with the tree dump if any invariant is broken.
pub fn assert_valid<V>(tree: &BPlusTreeIndex<i32, V>) {
    if let Err(err) = tree.validate() {
        panic!("{}\n{}", err, tree.debug_dump());
    }
}
