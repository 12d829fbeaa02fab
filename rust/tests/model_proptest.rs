//! Random insert/delete sequences replayed against a `BTreeMap` multiset.

mod common;

use bplus_index::BPlusTreeIndex;
use proptest::prelude::*;

use common::{all_separators, assert_valid, flatten, tree_pairs, Model};

#[derive(Debug, Clone)]
enum IndexOp {
    Insert(i32),
    Delete(i32),
}

/// Narrow key space so duplicates and misses are common.
fn key_strategy() -> impl Strategy<Value = i32> {
    0i32..40
}

fn op_strategy() -> impl Strategy<Value = IndexOp> {
    prop_oneof![
        3 => key_strategy().prop_map(IndexOp::Insert),
        2 => key_strategy().prop_map(IndexOp::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn index_matches_multiset_model(
        degree in 3usize..=8,
        ops in proptest::collection::vec(op_strategy(), 1..400),
    ) {
        common::init_tracing();
        let mut tree: BPlusTreeIndex<i32, u32> = BPlusTreeIndex::new(degree).unwrap();
        let mut model = Model::new();

        for (step, op) in ops.iter().enumerate() {
            let value = step as u32;
            match op {
                IndexOp::Insert(key) => {
                    tree.insert(*key, value).unwrap();
                    model.entry(*key).or_default().push(value);
                }
                IndexOp::Delete(key) => {
                    let separators_before = all_separators(&tree);
                    let outcome = tree.delete(key).unwrap();
                    let expected = match model.get_mut(key) {
                        Some(values) => {
                            let removed = values.pop().is_some();
                            if values.is_empty() {
                                model.remove(key);
                            }
                            removed
                        }
                        None => false,
                    };
                    prop_assert_eq!(outcome.deleted, expected, "delete({})", key);
                    if !outcome.separator_changed {
                        prop_assert_eq!(&all_separators(&tree), &separators_before);
                    }
                }
            }
            assert_valid(&tree);
        }

        prop_assert_eq!(tree_pairs(&tree), flatten(&model));
        prop_assert_eq!(tree.len(), model.values().map(Vec::len).sum::<usize>());
        for (key, values) in &model {
            let found: Vec<u32> = tree.search(key).into_iter().map(|item| item.value).collect();
            prop_assert_eq!(&found, values);
            prop_assert_eq!(tree.get(key), values.last());
        }
    }

    #[test]
    fn range_scans_match_model(
        keys in proptest::collection::vec(key_strategy(), 0..200),
        lo in -2i32..42,
        hi in -2i32..42,
        lo_kind in 0u8..3,
        hi_kind in 0u8..3,
    ) {
        use std::ops::Bound;

        let mut tree: BPlusTreeIndex<i32, u32> = BPlusTreeIndex::new(4).unwrap();
        let mut model = Model::new();
        for (value, key) in keys.iter().enumerate() {
            tree.insert(*key, value as u32).unwrap();
            model.entry(*key).or_default().push(value as u32);
        }

        let bound = |kind: u8, key: i32| match kind {
            0 => Bound::Included(key),
            1 => Bound::Excluded(key),
            _ => Bound::Unbounded,
        };
        let range = (bound(lo_kind, lo), bound(hi_kind, hi));
        let in_range = |key: i32| {
            let above = match range.0 {
                Bound::Included(start) => key >= start,
                Bound::Excluded(start) => key > start,
                Bound::Unbounded => true,
            };
            let below = match range.1 {
                Bound::Included(end) => key <= end,
                Bound::Excluded(end) => key < end,
                Bound::Unbounded => true,
            };
            above && below
        };

        let expected: Vec<(i32, u32)> =
            flatten(&model).into_iter().filter(|(key, _)| in_range(*key)).collect();
        let forward: Vec<(i32, u32)> = tree.range(range).map(|item| (item.key, item.value)).collect();
        let mut backward: Vec<(i32, u32)> =
            tree.range_rev(range).map(|item| (item.key, item.value)).collect();
        backward.reverse();

        prop_assert_eq!(&forward, &expected);
        prop_assert_eq!(&backward, &expected);
    }
}
