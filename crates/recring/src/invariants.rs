//! Debug assertion macros for ring buffer invariants.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`), so release builds
//! pay nothing for them.

// =============================================================================
// Cursor Range
// =============================================================================

/// Assert that a cursor lies inside the slot range.
///
/// **Invariant**: `0 ≤ index < capacity`
///
/// Used in: every cursor store
macro_rules! debug_assert_cursor_in_range {
    ($name:literal, $index:expr, $capacity:expr) => {
        debug_assert!(
            $index < $capacity,
            "cursor out of range: {} = {} with capacity {}",
            $name,
            $index,
            $capacity
        )
    };
}

// =============================================================================
// Bounded Occupancy
// =============================================================================

/// Assert that the ring never holds more than `capacity - 1` records.
///
/// **Invariant**: `(write - read) mod capacity ≤ capacity - 1`, so `read == write`
/// always means empty.
///
/// Used in: `write()` after computing the new write cursor
macro_rules! debug_assert_bounded_occupancy {
    ($occupied:expr, $capacity:expr) => {
        debug_assert!(
            $occupied < $capacity,
            "occupancy {} reached capacity {}; empty and full are no longer distinguishable",
            $occupied,
            $capacity
        )
    };
}

// =============================================================================
// Batch Fits
// =============================================================================

/// Assert that a committed batch fits inside what was measured in the same region.
///
/// Used in: `commit_write()`, `commit_read()`
macro_rules! debug_assert_batch_fits {
    ($count:expr, $available:expr) => {
        debug_assert!(
            $count <= $available,
            "committing {} records with only {} available",
            $count,
            $available
        )
    };
}

pub(crate) use debug_assert_batch_fits;
pub(crate) use debug_assert_bounded_occupancy;
pub(crate) use debug_assert_cursor_in_range;
