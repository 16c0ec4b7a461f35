use crate::node::Node;

/// Error produced by the checked, non-hot-path surface of [`Tree`](crate::Tree).
///
/// The per-leaf hot path (`split_fast`, `merge_fast`, `decode`, `encode`, `is_leaf`) does not go
/// through this type: those are `debug_assert!`-checked so they compile down to branch-free code
/// in release builds, matching a structure whose whole purpose is O(1)/O(depth) per-call work.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum CbtError {
    /// `max_depth` was outside the supported `[5, 29]` range.
    #[error("max_depth {max_depth} is out of the supported [5, 29] range")]
    InvalidMaxDepth {
        /// The rejected `max_depth`.
        max_depth: i32,
    },
    /// A `depth` argument was outside `[0, max_depth]`.
    #[error("depth {depth} is out of the [0, {max_depth}] range")]
    InvalidDepth {
        /// The rejected depth.
        depth: i32,
        /// The tree's `max_depth`.
        max_depth: i32,
    },
    /// `decode` was called with a handle outside `[0, node_count())`.
    #[error("handle {handle} is out of the [0, {node_count}) range")]
    HandleOutOfRange {
        /// The rejected handle.
        handle: u64,
        /// `node_count()` at the time of the call.
        node_count: u64,
    },
    /// `encode` was called on a node that is not currently a leaf.
    #[error("{node} is not a leaf")]
    NotALeaf {
        /// The offending node.
        node: Node,
    },
    /// `set_heap` was called with a buffer whose length doesn't match `heap_byte_size()`.
    #[error("heap buffer length mismatch: expected {expected} bytes, got {actual}")]
    HeapLengthMismatch {
        /// Expected length, i.e. `heap_byte_size()`.
        expected: usize,
        /// Actual length of the buffer passed in.
        actual: usize,
    },
}
