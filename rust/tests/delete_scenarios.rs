mod common;

use bplus_index::{BPlusTreeIndex, DeleteOutcome};
use paste::paste;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use common::{assert_valid, init_tracing};

fn build(degree: usize, keys: &[i32]) -> BPlusTreeIndex<i32, u32> {
    let mut tree = BPlusTreeIndex::new(degree).unwrap();
    for (value, key) in keys.iter().enumerate() {
        tree.insert(*key, value as u32).unwrap();
    }
    tree
}

#[test]
fn test_full_drain_scenario_renews_root_separator() {
    init_tracing();
    let keys: Vec<i32> = (1..=21).collect();
    let mut tree = build(4, &keys);
    assert_eq!(tree.separators_at_depth(0), vec![vec![7, 13]]);

    let first = tree.delete(&14).unwrap();
    assert_eq!(
        first,
        DeleteOutcome {
            deleted: true,
            separator_changed: false
        }
    );
    let second = tree.delete(&13).unwrap();
    assert!(second.deleted);
    assert!(second.separator_changed);

    assert_eq!(tree.separators_at_depth(0), vec![vec![7, 15]]);
    let expected: Vec<i32> = (1..=12).chain(15..=21).collect();
    assert_eq!(tree.keys().copied().collect::<Vec<_>>(), expected);
    let mut backward: Vec<i32> = tree.items_rev().map(|item| item.key).collect();
    backward.reverse();
    assert_eq!(backward, expected);
    assert_valid(&tree);
}

#[test]
fn test_shuffled_drain_leaves_single_empty_leaf() {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut keys: Vec<i32> = (0..1_000).collect();
    keys.shuffle(&mut rng);
    let mut tree = build(5, &keys);
    assert_eq!(tree.len(), 1_000);

    keys.shuffle(&mut rng);
    for key in &keys {
        assert!(tree.delete(key).unwrap().deleted, "key {} vanished early", key);
    }
    assert_eq!(tree.len(), 0);
    assert!(tree.is_leaf_root());
    assert_eq!(tree.leaf_count(), 1);
    assert_eq!(tree.first_leaf_id(), tree.last_leaf_id());
    assert_valid(&tree);
}

#[test]
fn test_absent_key_leaves_structure_identical() {
    let keys: Vec<i32> = (0..200).map(|i| i * 2).collect();
    let mut tree = build(4, &keys);
    for missing in [-1, 1, 199, 401, 1_000] {
        let before = tree.debug_dump();
        let height = tree.height();
        let outcome = tree.delete(&missing).unwrap();
        assert_eq!(outcome, DeleteOutcome::default());
        assert_eq!(tree.debug_dump(), before);
        assert_eq!(tree.height(), height);
    }
}

#[test]
fn test_delete_on_empty_tree() {
    let mut tree: BPlusTreeIndex<i32, u32> = BPlusTreeIndex::new(3).unwrap();
    assert!(!tree.delete(&1).unwrap().deleted);
    assert!(tree.search(&1).is_empty());
    assert_valid(&tree);
}

#[test]
fn test_duplicate_run_spanning_leaves() {
    init_tracing();
    let mut tree = BPlusTreeIndex::new(3).unwrap();
    tree.insert(1, 0).unwrap();
    for value in 1..=9 {
        tree.insert(5, value).unwrap();
    }
    tree.insert(9, 10).unwrap();
    assert!(tree.leaf_count() > 3);

    let values: Vec<u32> = tree.search(&5).into_iter().map(|item| item.value).collect();
    assert_eq!(values, (1..=9).collect::<Vec<_>>());
    assert_eq!(tree.count(&5), 9);

    for remaining in (0..9).rev() {
        assert!(tree.delete(&5).unwrap().deleted);
        assert_eq!(tree.count(&5), remaining);
        assert_eq!(tree.get(&5).copied(), (remaining > 0).then_some(remaining as u32));
        assert_valid(&tree);
    }
    assert_eq!(tree.keys().copied().collect::<Vec<_>>(), vec![1, 9]);
}

fn drain_shuffled(degree: usize, count: i32, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut keys: Vec<i32> = (0..count).map(|i| i % (count / 3)).collect();
    keys.shuffle(&mut rng);
    let mut tree = build(degree, &keys);
    assert_valid(&tree);

    keys.shuffle(&mut rng);
    for (removed, key) in keys.iter().enumerate() {
        assert!(tree.delete(key).unwrap().deleted);
        assert_eq!(tree.len(), keys.len() - removed - 1);
        assert_valid(&tree);
    }
    assert!(tree.is_empty());
    assert!(tree.is_leaf_root());
}

fn interleave(degree: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tree = BPlusTreeIndex::new(degree).unwrap();
    let mut live: Vec<i32> = Vec::new();
    for round in 0..20u32 {
        let mut batch: Vec<i32> = (0..30).map(|i| (i * 7 + round as i32) % 50).collect();
        batch.shuffle(&mut rng);
        for key in &batch {
            tree.insert(*key, round).unwrap();
            live.push(*key);
        }
        live.shuffle(&mut rng);
        for key in live.split_off(live.len() / 2) {
            assert!(tree.delete(&key).unwrap().deleted);
        }
        assert_valid(&tree);
    }
    live.sort_unstable();
    assert_eq!(tree.keys().copied().collect::<Vec<_>>(), live);
}

macro_rules! degree_cases {
    ($($degree:literal),*) => {
        paste! {
            $(
                #[test]
                fn [<test_drain_with_duplicates_degree_ $degree>]() {
                    init_tracing();
                    drain_shuffled($degree, 300, 0xd00d + $degree);
                }

                #[test]
                fn [<test_interleaved_insert_delete_degree_ $degree>]() {
                    init_tracing();
                    interleave($degree, 0xbee + $degree);
                }
            )*
        }
    };
}

degree_cases!(3, 4, 5, 6, 8, 16, 32);
