//! Bottom-up sum reduction restoring the "inner counter = sum of children" invariant after a
//! batch of splits/merges has been applied to the leaf bitfield.

use crate::heap;
use crate::node::Node;
use core::sync::atomic::AtomicU32;
#[cfg(feature = "parallel")]
use core::sync::atomic::{AtomicUsize, Ordering};

/// Tunable crossover between the sequential and `rayon`-driven reduction code paths.
///
/// Mirrors the tuning constants the teacher crate hardcodes for its own parallel fan-out
/// (`MAX_BUCKET_SIZE`, `REDUCED_BUCKETS_SIZE` in `chiapos::table`), except exposed as a runtime
/// value on [`Tree`](crate::Tree) rather than a compile-time constant, so tests and benches can
/// override it without recompiling.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ReductionConfig {
    /// Below this many live leaves, `reduce()` and `update_parallel()` always run the sequential
    /// code path even when the `parallel` feature is enabled, since `rayon`'s fan-out overhead
    /// dominates for small trees.
    pub parallel_threshold: usize,
}

/// Default crossover point: below ~4K leaves, a single core reduces the tree faster than the
/// cost of farming the prepass out to a thread pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

impl Default for ReductionConfig {
    fn default() -> Self {
        ReductionConfig {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// Cache line size in bytes, used to batch prepass work so that threads don't false-share the
/// same leaf-bitfield cache line.
#[cfg(feature = "parallel")]
const CACHE_LINE_SIZE: usize = 64;

/// Runs the bottom-up sum reduction, choosing the sequential or parallel code path based on
/// `config` and the current leaf count.
pub(crate) fn reduce(heap: &[AtomicU32], max_depth: i32, config: &ReductionConfig) {
    #[cfg(feature = "parallel")]
    {
        let leaf_count = heap::read(heap, max_depth, Node::ROOT) as usize;
        if leaf_count >= config.parallel_threshold {
            tracing::debug!(leaf_count, "running parallel sum reduction");
            reduce_parallel(heap, max_depth);
            return;
        }
    }
    let _ = config;

    tracing::debug!("running sequential sum reduction");
    reduce_sequential(heap, max_depth);
}

/// Bit-parallel prepass over one 32-bit-aligned chunk of the leaf bitfield, producing packed
/// counters for the five shallower levels.
///
/// Returns the already-summed depth-`max_depth - 5` counter so callers operating level by level
/// (the parallel path) can chain straight into the shallow tail without re-reading it.
#[inline]
fn prepass_chunk(heap: &[AtomicU32], max_depth: i32, leaf_chunk_id: u32) {
    use core::sync::atomic::Ordering::Relaxed;

    let depth = max_depth;
    let node = Node { id: leaf_chunk_id, depth };
    let word_index = (heap::node_bit_id(max_depth, node) >> 5) as usize;
    let mut bit_field = heap[word_index].load(Relaxed);

    // Stage 1 (pairs, 2-bit counts): the 16 resulting counters exactly fill one aligned word at
    // depth - 1, so this is a plain store, not a masked insert.
    bit_field = (bit_field & 0x5555_5555) + ((bit_field >> 1) & 0x5555_5555);
    let stage1_node = Node { id: leaf_chunk_id >> 1, depth: depth - 1 };
    let stage1_word = (heap::node_bit_id(max_depth, stage1_node) >> 5) as usize;
    heap[stage1_word].store(bit_field, Relaxed);

    // Stage 2 (groups of 4, 3-bit counts packed into 24 bits).
    bit_field = (bit_field & 0x3333_3333) + ((bit_field >> 2) & 0x3333_3333);
    let mut packed = 0u32;
    for i in 0..8 {
        packed |= (bit_field >> i) & (0b111 << (3 * i));
    }
    heap::write_explicit(heap, max_depth, Node { id: leaf_chunk_id >> 2, depth: depth - 2 }, 24, packed);

    // Stage 3 (groups of 8, 4-bit counts packed into 16 bits).
    bit_field = (bit_field & 0x0F0F_0F0F) + ((bit_field >> 4) & 0x0F0F_0F0F);
    let mut packed = 0u32;
    for i in 0..4 {
        packed |= (bit_field >> (4 * i)) & (0b1111 << (4 * i));
    }
    heap::write_explicit(heap, max_depth, Node { id: leaf_chunk_id >> 3, depth: depth - 3 }, 16, packed);

    // Stage 4 (groups of 16, 5-bit counts packed into 10 bits).
    bit_field = (bit_field & 0x00FF_00FF) + ((bit_field >> 8) & 0x00FF_00FF);
    let packed = (bit_field & 0b11111) | ((bit_field >> 11) & (0b11111 << 5));
    heap::write_explicit(heap, max_depth, Node { id: leaf_chunk_id >> 4, depth: depth - 4 }, 10, packed);

    // Stage 5 (groups of 32, a single 6-bit count).
    bit_field = (bit_field & 0x0000_FFFF) + ((bit_field >> 16) & 0x0000_FFFF);
    heap::write_explicit(heap, max_depth, Node { id: leaf_chunk_id >> 5, depth: depth - 5 }, 6, bit_field);
}

/// Per-node tail step: sum the two children's counters into the parent's counter.
#[inline(always)]
fn tail_node(heap: &[AtomicU32], max_depth: i32, node: Node) {
    let left = heap::read(heap, max_depth, node.left_child_fast());
    let right = heap::read(heap, max_depth, node.right_child_fast());
    heap::write(heap, max_depth, node, left + right);
}

fn reduce_sequential(heap: &[AtomicU32], max_depth: i32) {
    let min_leaf_id = 1u32 << max_depth;
    let max_leaf_id = min_leaf_id << 1;

    for leaf_chunk_id in (min_leaf_id..max_leaf_id).step_by(32) {
        prepass_chunk(heap, max_depth, leaf_chunk_id);
    }

    for depth in (0..=(max_depth - 6)).rev() {
        let min_node_id = 1u32 << depth;
        let max_node_id = min_node_id << 1;
        for node_id in min_node_id..max_node_id {
            tail_node(heap, max_depth, Node { id: node_id, depth });
        }
    }
}

/// Parallel sum reduction, gated behind the `parallel` feature. Uses `rayon::broadcast` with an
/// atomic work-claim counter for the prepass (batching work by cache line, the way the teacher
/// crate's `chiapos::table::create_parallel` claims bucket batches), then a straightforward
/// `rayon` parallel-for per tail level — each level is its own synchronous barrier, since the
/// next level must not start reading a still-being-written parent counter.
#[cfg(feature = "parallel")]
fn reduce_parallel(heap: &[AtomicU32], max_depth: i32) {
    use rayon::prelude::*;

    let min_leaf_id = 1u32 << max_depth;
    let max_leaf_id = min_leaf_id << 1;
    let num_chunks = ((max_leaf_id - min_leaf_id) as usize).div_ceil(32);

    // One `u32` counter per chunk at depth - 5; batch by cache line to avoid false sharing on the
    // shared claim counter itself, same rationale as `CACHE_LINE_SIZE` in the teacher crate.
    let chunk_batch_size = (CACHE_LINE_SIZE / size_of::<u32>()).max(1);
    let next_batch = AtomicUsize::new(0);

    rayon::broadcast(|_ctx| {
        loop {
            let batch_index = next_batch.fetch_add(1, Ordering::Relaxed);
            let start = batch_index * chunk_batch_size;
            if start >= num_chunks {
                break;
            }
            let end = (start + chunk_batch_size).min(num_chunks);

            for chunk in start..end {
                let leaf_chunk_id = min_leaf_id + (chunk as u32) * 32;
                prepass_chunk(heap, max_depth, leaf_chunk_id);
            }
        }
    });

    for depth in (0..=(max_depth - 6)).rev() {
        let min_node_id = 1u32 << depth;
        let max_node_id = min_node_id << 1;
        (min_node_id..max_node_id)
            .into_par_iter()
            .for_each(|node_id| tail_node(heap, max_depth, Node { id: node_id, depth }));
    }
}
