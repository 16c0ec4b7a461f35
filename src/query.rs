//! Leaf/handle queries: counting, leaf testing, and the decode/encode pair mapping between the
//! dense leaf-handle numbering and tree positions.

use crate::error::CbtError;
use crate::heap;
use crate::node::Node;
use crate::tree::Tree;

impl Tree {
    /// Number of currently-live leaves, i.e. the root's counter.
    ///
    /// Reflects the heap state as of the last [`reduce`](Tree::reduce) call; splits/merges since
    /// then are not counted until the next reduction.
    #[inline]
    pub fn node_count(&self) -> u64 {
        heap::read(self.heap_words(), self.max_depth(), Node::ROOT) as u64
    }

    /// Whether `node` is currently a live leaf.
    ///
    /// A node is a leaf exactly when its counter is `1` — for an inner node, "one live leaf in
    /// this subtree" can only mean the subtree itself wasn't split any further.
    #[inline]
    pub fn is_leaf(&self, node: Node) -> bool {
        heap::read(self.heap_words(), self.max_depth(), node) == 1
    }

    /// Maps a dense leaf handle in `[0, node_count())` to the tree position of the
    /// correspondingly-numbered live leaf, in leaf-order (left to right).
    ///
    /// `O(max_depth)`. Requires no splits/merges are in flight and [`reduce`](Tree::reduce) has
    /// been called since the last one; checked only with `debug_assert!`.
    pub fn decode(&self, handle: u64) -> Node {
        debug_assert!(
            handle < self.node_count(),
            "decode() handle {handle} out of range (node_count = {})",
            self.node_count()
        );

        let max_depth = self.max_depth();
        let heap = self.heap_words();
        let mut node = Node::ROOT;
        let mut remaining = handle;

        while heap::read(heap, max_depth, node) > 1 {
            let left = node.left_child_fast();
            let left_count = heap::read(heap, max_depth, left) as u64;
            if remaining < left_count {
                node = left;
            } else {
                remaining -= left_count;
                node = node.right_child_fast();
            }
        }

        node
    }

    /// Checked counterpart of [`decode`](Tree::decode): validates `handle` against
    /// [`node_count`](Tree::node_count) before descending.
    pub fn decode_checked(&self, handle: u64) -> Result<Node, CbtError> {
        let node_count = self.node_count();
        if handle >= node_count {
            return Err(CbtError::HandleOutOfRange { handle, node_count });
        }
        Ok(self.decode(handle))
    }

    /// Maps a live leaf back to its dense handle, the inverse of [`decode`](Tree::decode).
    ///
    /// `O(max_depth)`. `node` must currently be a live leaf; checked only with `debug_assert!`.
    pub fn encode(&self, node: Node) -> u64 {
        debug_assert!(self.is_leaf(node), "encode() requires a live leaf, got {node}");

        let max_depth = self.max_depth();
        let heap = self.heap_words();
        let mut handle = 0u64;
        let mut current = node;

        while !current.is_root() {
            let sibling = current.sibling_fast();
            if current.id & 1 == 1 {
                handle += heap::read(heap, max_depth, sibling) as u64;
            }
            current = current.parent_fast();
        }

        handle
    }

    /// Checked counterpart of [`encode`](Tree::encode): validates `node` is currently a live
    /// leaf before ascending.
    pub fn encode_checked(&self, node: Node) -> Result<u64, CbtError> {
        if !self.is_leaf(node) {
            return Err(CbtError::NotALeaf { node });
        }
        Ok(self.encode(node))
    }
}
