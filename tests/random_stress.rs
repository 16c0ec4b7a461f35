//! Randomized split/merge stress test, checked against a plain `Vec`-backed reference model.

use cbt::Tree;
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};
use std::collections::BTreeSet;

/// Reference model: the set of currently-live leaf nodes, as an ordered set, with split/merge
/// implemented by direct set manipulation instead of bit-packed counters.
struct ReferenceModel {
    max_depth: i32,
    leaves: BTreeSet<u32>,
}

impl ReferenceModel {
    fn new(max_depth: i32, initial_depth: i32) -> Self {
        let min_id = 1u32 << initial_depth;
        let max_id = min_id << 1;
        ReferenceModel {
            max_depth,
            leaves: (min_id..max_id).collect(),
        }
    }

    fn depth_of(id: u32) -> i32 {
        31 - id.leading_zeros() as i32
    }

    fn split(&mut self, id: u32) {
        assert!(self.leaves.remove(&id), "splitting a non-leaf");
        self.leaves.insert(id << 1);
        self.leaves.insert((id << 1) | 1);
    }

    fn merge(&mut self, id: u32) {
        let sibling = id ^ 1;
        assert!(self.leaves.remove(&id), "merging a non-leaf");
        assert!(self.leaves.remove(&sibling), "merging a non-leaf sibling");
        self.leaves.insert(id & !1);
    }

    fn sorted_ids(&self) -> Vec<u32> {
        self.leaves.iter().copied().collect()
    }

    fn can_split(&self, id: u32) -> bool {
        Self::depth_of(id) < self.max_depth
    }
}

#[test]
#[cfg_attr(miri, ignore)]
fn random_split_merge_sequence_matches_reference_model() {
    let max_depth = 12;
    let initial_depth = 3;
    let mut rng = ChaCha8Rng::from_seed([7u8; 32]);

    let tree = Tree::create_at_depth(max_depth, initial_depth).unwrap();
    let mut model = ReferenceModel::new(max_depth, initial_depth);

    let iterations = if cfg!(miri) { 20 } else { 500 };

    for _ in 0..iterations {
        let node_count = tree.node_count();
        assert_eq!(node_count as usize, model.leaves.len());

        let handle = rng.next_u64() % node_count;
        let node = tree.decode(handle);
        assert_eq!(model.sorted_ids()[handle as usize], node.id);

        // 60% split, 40% merge, falling back to the other action when the chosen one is
        // unavailable (can't split at max_depth, can't merge a node without a live sibling).
        let want_split = rng.next_u32() % 5 < 3;

        if want_split && model.can_split(node.id) {
            tree.split(node);
            model.split(node.id);
        } else if tree.is_leaf(node.sibling()) && !node.sibling().is_null() {
            tree.merge(node);
            model.merge(node.id);
        } else if model.can_split(node.id) {
            tree.split(node);
            model.split(node.id);
        }

        tree.reduce();
    }

    let final_count = tree.node_count();
    assert_eq!(final_count as usize, model.leaves.len());

    let expected_ids = model.sorted_ids();
    for (handle, &expected_id) in expected_ids.iter().enumerate() {
        let node = tree.decode(handle as u64);
        assert_eq!(node.id, expected_id);
        assert_eq!(tree.encode(node), handle as u64);
    }
}

#[test]
#[cfg_attr(miri, ignore)]
fn random_splits_then_reset_returns_to_uniform_depth() {
    let mut rng = ChaCha8Rng::from_seed([3u8; 32]);
    let mut tree = Tree::create_at_depth(10, 2).unwrap();

    for _ in 0..50 {
        let node_count = tree.node_count();
        let handle = rng.next_u64() % node_count;
        let node = tree.decode(handle);
        if node.depth < tree.max_depth() {
            tree.split(node);
        }
        tree.reduce();
    }
    assert!(tree.node_count() > 4);

    tree.reset_to_depth(2).unwrap();
    assert_eq!(tree.node_count(), 1 << 2);
    for handle in 0..tree.node_count() {
        assert_eq!(tree.decode(handle).depth, 2);
    }
}

