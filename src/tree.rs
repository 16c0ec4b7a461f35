//! The concurrent binary tree itself: heap storage, construction, reset and (de)serialization.

use crate::error::CbtError;
use crate::node::Node;
use crate::reduction::{self, ReductionConfig};
use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::heap;

/// Smallest supported `max_depth`. Below this the five-stage bit-parallel prepass would have
/// nowhere to land its shallowest stage.
pub const MIN_MAX_DEPTH: i32 = 5;

/// Largest supported `max_depth`. Chosen so every node's bit range, and the heap's total byte
/// size, stay representable without `u64` heap indices.
pub const MAX_MAX_DEPTH: i32 = 29;

/// A concurrent binary tree: a bit-packed implicit binary heap supporting lock-free concurrent
/// split/merge of leaves and parallel restoration of the subtree-sum invariant.
///
/// Every non-leaf node stores, in a variable-width bit field sized by its depth, the number of
/// currently-live leaves in its subtree. Leaves store a single bit: whether they are currently
/// "live" (part of the current leaf set) or not. [`split`](Tree::split)/[`merge`](Tree::merge)
/// mutate only these leaf bits; [`reduce`](Tree::reduce) restores the invariant that every inner
/// counter equals the sum of its two children's counters, which [`decode`](Tree::decode) and
/// [`encode`](Tree::encode) rely on to map between leaf handles and tree positions in `O(depth)`.
#[derive(Debug)]
pub struct Tree {
    max_depth: i32,
    heap: Box<[AtomicU32]>,
    reduction_config: ReductionConfig,
}

impl Tree {
    /// Creates a tree of the given `max_depth` with a single live leaf: the root.
    ///
    /// Equivalent to `create_at_depth(max_depth, 0)`.
    pub fn create(max_depth: i32) -> Result<Tree, CbtError> {
        Self::create_at_depth(max_depth, 0)
    }

    /// Creates a tree of the given `max_depth` with every leaf at `initial_depth` live.
    ///
    /// `initial_depth` must be in `[0, max_depth]`; the resulting tree has `2^initial_depth`
    /// live leaves, each at a uniform initial subdivision level.
    pub fn create_at_depth(max_depth: i32, initial_depth: i32) -> Result<Tree, CbtError> {
        if !(MIN_MAX_DEPTH..=MAX_MAX_DEPTH).contains(&max_depth) {
            return Err(CbtError::InvalidMaxDepth { max_depth });
        }
        if !(0..=max_depth).contains(&initial_depth) {
            return Err(CbtError::InvalidDepth { depth: initial_depth, max_depth });
        }

        let heap: Box<[AtomicU32]> = (0..heap::heap_word_count(max_depth))
            .map(|_| AtomicU32::new(0))
            .collect();

        let mut tree = Tree {
            max_depth,
            heap,
            reduction_config: ReductionConfig::default(),
        };
        tree.reset_to_depth_unchecked(initial_depth);

        tracing::debug!(max_depth, initial_depth, "created tree");
        Ok(tree)
    }

    /// `max_depth` this tree was created with.
    #[inline]
    pub const fn max_depth(&self) -> i32 {
        self.max_depth
    }

    /// Current configuration controlling the sequential/parallel crossover for
    /// [`reduce`](Tree::reduce) and [`update_parallel`](Tree::update_parallel).
    #[inline]
    pub const fn reduction_config(&self) -> ReductionConfig {
        self.reduction_config
    }

    /// Replaces the reduction/parallel-dispatch configuration.
    pub fn set_reduction_config(&mut self, config: ReductionConfig) {
        self.reduction_config = config;
    }

    /// Resets every leaf at `depth` to live and every other leaf to dead, then restores the
    /// subtree-sum invariant. Requires exclusive access since it overwrites the whole heap.
    pub fn reset_to_depth(&mut self, depth: i32) -> Result<(), CbtError> {
        if !(0..=self.max_depth).contains(&depth) {
            return Err(CbtError::InvalidDepth { depth, max_depth: self.max_depth });
        }
        self.reset_to_depth_unchecked(depth);
        tracing::debug!(depth, "reset tree");
        Ok(())
    }

    /// Resets to the finest possible uniform subdivision, i.e. `reset_to_depth(max_depth())`.
    pub fn reset_to_max_depth(&mut self) {
        self.reset_to_depth_unchecked(self.max_depth);
        tracing::debug!(depth = self.max_depth, "reset tree to max depth");
    }

    fn reset_to_depth_unchecked(&mut self, depth: i32) {
        for word in self.heap.iter() {
            word.store(0, Ordering::Relaxed);
        }

        let min_id = 1u32 << depth;
        let max_id = min_id << 1;
        for id in min_id..max_id {
            heap::write_bitfield(&self.heap, self.max_depth, Node { id, depth }, 1);
        }

        self.reduce();
    }

    /// Restores the invariant that every inner node's counter equals the sum of its children's
    /// counters, after a batch of [`split`](Tree::split)/[`merge`](Tree::merge) calls.
    ///
    /// Dispatches to the sequential or `rayon`-driven implementation based on
    /// [`reduction_config`](Tree::reduction_config) and the live leaf count.
    pub fn reduce(&self) {
        reduction::reduce(&self.heap, self.max_depth, &self.reduction_config);
    }

    /// Size in bytes of the buffer returned by [`get_heap`](Tree::get_heap) and expected by
    /// [`set_heap`](Tree::set_heap).
    #[inline]
    pub const fn heap_byte_size(&self) -> usize {
        heap::heap_byte_size(self.max_depth)
    }

    /// Serializes the heap to a little-endian byte buffer, suitable for persistence or upload to
    /// a GPU buffer binding.
    pub fn get_heap(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.heap_byte_size());
        for word in self.heap.iter() {
            bytes.extend_from_slice(&word.load(Ordering::Relaxed).to_le_bytes());
        }
        bytes
    }

    /// Overwrites the heap from a little-endian byte buffer previously produced by
    /// [`get_heap`](Tree::get_heap) for a tree of the same `max_depth`. Requires exclusive access.
    pub fn set_heap(&mut self, bytes: &[u8]) -> Result<(), CbtError> {
        let expected = self.heap_byte_size();
        if bytes.len() != expected {
            return Err(CbtError::HeapLengthMismatch { expected, actual: bytes.len() });
        }

        for (word, chunk) in self.heap.iter().zip(bytes.chunks_exact(4)) {
            let value = u32::from_le_bytes(chunk.try_into().expect("chunks_exact(4) yields 4-byte slices"));
            word.store(value, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Raw access to the underlying atomic heap words, for callers implementing their own
    /// reduction or mutation passes over the same storage (e.g. a GPU-mirrored buffer).
    #[inline]
    pub(crate) fn heap_words(&self) -> &[AtomicU32] {
        &self.heap
    }

    /// Consumes and drops the tree, freeing its heap buffer.
    ///
    /// Provided for parity with the explicit create/release lifecycle this tree is modeled on;
    /// ordinary scope-exit drop does the same thing, so calling this is never required.
    #[inline]
    pub fn release(self) {
        drop(self);
    }
}
