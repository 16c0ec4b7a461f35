//! Concurrent binary tree.
//!
//! A bit-packed implicit binary tree, stored as a flat array of 32-bit words, supporting:
//!
//! - lock-free, concurrent [`split`](Tree::split)/[`merge`](Tree::merge) of individual leaves
//! - restoring the subtree-sum invariant afterwards with a bit-parallel [`reduce`](Tree::reduce)
//!   pass, sequential or `rayon`-driven
//! - `O(max_depth)` mapping between a dense leaf handle and its tree position via
//!   [`decode`](Tree::decode)/[`encode`](Tree::encode)
//!
//! This is the substrate underlying Longest Edge Bisection mesh refinement: each leaf corresponds
//! to one triangle of a subdivided mesh, and split/merge implement bisecting/collapsing an edge.
//! The tree itself is agnostic to what a leaf represents; it only tracks which leaves are live.
//!
//! # Concurrency
//!
//! Every leaf's liveness bit and every inner node's counter lives in its own, non-overlapping bit
//! range of the heap. [`split`](Tree::split) and [`merge`](Tree::merge) touch only the leaf
//! bitfield, via two independent atomic read-modify-write operations (see [`bitfield`] for why
//! that is sufficient), so splits/merges of *different* leaves may run fully concurrently and take
//! `&self`. [`reduce`](Tree::reduce) must run after a batch of them completes and before
//! [`decode`](Tree::decode)/[`encode`](Tree::encode)/[`node_count`](Tree::node_count) are called,
//! since those rely on the counters it restores.
//!
//! [`reset_to_depth`](Tree::reset_to_depth) and [`set_heap`](Tree::set_heap) overwrite the whole
//! heap and require `&mut self`.
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(rust_2018_idioms, missing_debug_implementations, missing_docs, unreachable_pub)]

#[cfg(not(feature = "alloc"))]
compile_error!("the `alloc` feature (enabled by default via `std`) is currently required");

#[cfg(not(feature = "std"))]
extern crate alloc;

mod bitfield;
mod error;
mod heap;
mod mutation;
mod node;
mod query;
mod reduction;
mod tree;

pub use crate::error::CbtError;
pub use crate::node::Node;
pub use crate::reduction::{ReductionConfig, DEFAULT_PARALLEL_THRESHOLD};
pub use crate::tree::{Tree, MAX_MAX_DEPTH, MIN_MAX_DEPTH};
