//! Lock-free leaf split/merge and batch update.

use crate::heap;
use crate::node::Node;
use crate::tree::Tree;

impl Tree {
    /// Splits `node` in two, without checking that `node` is currently a live leaf.
    ///
    /// Sets the leaf bit for `node`'s right child and leaves the left child's bit (which equals
    /// `node`'s own leaf bit, since `ceil` of the left child coincides with `ceil` of `node`)
    /// alone. Safe to call concurrently with other splits/merges targeting different leaves;
    /// [`reduce`](Tree::reduce) must run before the new leaf's counters are queried.
    #[inline]
    pub fn split_fast(&self, node: Node) {
        debug_assert!(!node.is_ceil(self.max_depth()), "cannot split a node at max_depth");
        heap::write_bitfield(self.heap_words(), self.max_depth(), node.right_child_fast(), 1);
    }

    /// Splits `node` in two, a no-op if `node` is already at [`max_depth`](Tree::max_depth) (it
    /// has no children to split into). `node` must currently be a live leaf; violating that is
    /// checked with `debug_assert!` only.
    #[inline]
    pub fn split(&self, node: Node) {
        if node.is_ceil(self.max_depth()) {
            return;
        }
        debug_assert!(self.is_leaf(node), "split() requires a live leaf");
        self.split_fast(node);
    }

    /// Merges `node` with its sibling, without checking that both are currently live leaves.
    ///
    /// Clears the leaf bit of whichever of `node`/its sibling is the right child; the left
    /// child's bit becomes the merged node's bit, matching [`split_fast`](Tree::split_fast)'s
    /// choice of which bit represents the parent.
    #[inline]
    pub fn merge_fast(&self, node: Node) {
        heap::write_bitfield(self.heap_words(), self.max_depth(), node.right_sibling_fast(), 0);
    }

    /// Merges `node` with its sibling, a no-op if `node` is the root (it has no sibling to merge
    /// with). Both `node` and its sibling must currently be live leaves; violating that is
    /// checked with `debug_assert!` only.
    #[inline]
    pub fn merge(&self, node: Node) {
        if node.is_root() {
            return;
        }
        debug_assert!(self.is_leaf(node), "merge() requires a live leaf");
        debug_assert!(self.is_leaf(node.sibling_fast()), "merge() requires a live sibling leaf");
        self.merge_fast(node);
    }

    /// Runs `updater` once for every currently-live leaf, in increasing handle order, then
    /// restores the subtree-sum invariant with [`reduce`](Tree::reduce).
    ///
    /// `updater` is free to call [`split`](Tree::split)/[`merge`](Tree::merge) on the node it is
    /// passed (but not on other leaves — doing so races with this same pass iterating them).
    pub fn update(&self, updater: impl Fn(&Tree, Node)) {
        let leaf_count = self.node_count();
        for handle in 0..leaf_count {
            updater(self, self.decode(handle));
        }
        self.reduce();
    }

    /// Parallel counterpart of [`update`](Tree::update), gated behind the `parallel` feature.
    ///
    /// Dispatches each live leaf to `updater` via `rayon`'s work-stealing pool regardless of the
    /// tree's [`reduction_config`](Tree::reduction_config) parallel threshold — batch update is
    /// assumed to be the expensive part of the caller's per-leaf work, unlike `reduce()` itself —
    /// then restores the subtree-sum invariant with [`reduce`](Tree::reduce).
    #[cfg(feature = "parallel")]
    pub fn update_parallel(&self, updater: impl Fn(&Tree, Node) + Sync) {
        use rayon::prelude::*;

        let leaf_count = self.node_count();
        (0..leaf_count)
            .into_par_iter()
            .for_each(|handle| updater(self, self.decode(handle)));
        self.reduce();
    }
}
