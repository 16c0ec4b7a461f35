//! Atomic bit-range primitives over 32-bit words.
//!
//! Distinct nodes at the same tree depth always occupy non-overlapping bit ranges, so correctness
//! never requires a single atomic word update across two fields — only that each individual
//! AND and OR commits independently. See the crate-level docs for the full argument.

use core::sync::atomic::{AtomicU32, Ordering};

/// Extracts `count` bits starting at `offset` from `word`, returned in the low bits of the
/// result.
///
/// # Panics (debug only)
/// Panics if `offset + count > 32` or `count >= 32`.
#[inline(always)]
pub(crate) fn extract(word: u32, offset: u32, count: u32) -> u32 {
    debug_assert!(count < 32, "count must fit a shift amount");
    debug_assert!(offset + count <= 32, "range must fit in a single word");

    let mask = !(u32::MAX << count);
    (word >> offset) & mask
}

/// Atomically clears `count` bits starting at `offset` in `word`, then ORs in `data << offset`.
///
/// Implemented as two independent atomic read-modify-write operations (AND, then OR), which is
/// sufficient because callers never target overlapping bit ranges concurrently.
///
/// # Panics (debug only)
/// Panics if `offset + count > 32` or `count >= 32`.
#[inline(always)]
pub(crate) fn atomic_insert(word: &AtomicU32, offset: u32, count: u32, data: u32) {
    debug_assert!(count < 32, "count must fit a shift amount");
    debug_assert!(offset + count <= 32, "range must fit in a single word");

    let clear_mask = !(!(u32::MAX << count) << offset);
    word.fetch_and(clear_mask, Ordering::Relaxed);
    word.fetch_or(data << offset, Ordering::Relaxed);
}

/// Atomically sets the single bit at `bit_id` in `word` to `value` (`0` or `1`).
#[inline(always)]
pub(crate) fn atomic_set_bit(word: &AtomicU32, bit_id: u32, value: u32) {
    debug_assert!(bit_id < 32);
    debug_assert!(value <= 1);

    let clear_mask = !(1u32 << bit_id);
    word.fetch_and(clear_mask, Ordering::Relaxed);
    word.fetch_or(value << bit_id, Ordering::Relaxed);
}
