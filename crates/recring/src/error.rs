//! Error types for ring buffer operations.

use thiserror::Error;

/// Errors reported by [`RingBuffer`](crate::RingBuffer) operations.
///
/// Shortfalls (`InsufficientSpace`, `InsufficientData`) are all-or-nothing
/// rejections: the ring is left exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// Bad capacity/record size, or a slice that is not a whole number of records.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: &'static str,
    },

    /// Backing storage could not be allocated.
    #[error("out of memory allocating {bytes} bytes of ring storage")]
    OutOfMemory {
        /// Size of the failed allocation.
        bytes: usize,
    },

    /// The write needs more free slots than the ring has.
    #[error("insufficient space: {requested} records requested, {available} free")]
    InsufficientSpace {
        /// Records the caller tried to write.
        requested: usize,
        /// Free slots at the time of the call.
        available: usize,
    },

    /// The read or peek needs more buffered records than the ring holds.
    #[error("insufficient data: {requested} records requested, {available} buffered")]
    InsufficientData {
        /// Records the caller tried to read. For `peek` this is `offset + count`,
        /// the number of buffered records the request reaches into.
        requested: usize,
        /// Buffered records at the time of the call.
        available: usize,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RingError>;

impl RingError {
    /// Returns `true` if retrying later may succeed (the ring was merely too full or too empty).
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientSpace { .. } | Self::InsufficientData { .. }
        )
    }

    /// Negative sentinel used by the integer-status calling convention.
    #[inline]
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } => -1,
            Self::OutOfMemory { .. } => -2,
            Self::InsufficientSpace { .. } => -3,
            Self::InsufficientData { .. } => -4,
        }
    }
}

/// Collapse a record-count result into "records transferred, or negative error code".
///
/// ```
/// use recring_rs::{status, RingBuffer};
///
/// let ring = RingBuffer::create(4, 1).unwrap();
/// assert_eq!(status(ring.write(&[1, 2])), 2);
/// assert_eq!(status(ring.write(&[3, 4])), -3);
/// ```
pub fn status(result: Result<usize>) -> i32 {
    match result {
        Ok(n) => i32::try_from(n).unwrap_or(i32::MAX),
        Err(e) => e.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(RingError::InsufficientSpace { requested: 2, available: 1 }.is_recoverable());
        assert!(RingError::InsufficientData { requested: 2, available: 1 }.is_recoverable());
        assert!(!RingError::OutOfMemory { bytes: 64 }.is_recoverable());
        assert!(!RingError::InvalidArgument { reason: "x" }.is_recoverable());
    }

    #[test]
    fn test_codes_are_negative_and_distinct() {
        let codes = [
            RingError::InvalidArgument { reason: "x" }.code(),
            RingError::OutOfMemory { bytes: 1 }.code(),
            RingError::InsufficientSpace { requested: 1, available: 0 }.code(),
            RingError::InsufficientData { requested: 1, available: 0 }.code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            assert!(*a < 0);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_status_conversion() {
        assert_eq!(status(Ok(3)), 3);
        assert_eq!(status(Ok(0)), 0);
        assert_eq!(
            status(Err(RingError::InsufficientData { requested: 1, available: 0 })),
            -4
        );
    }

    #[test]
    fn test_display_mentions_counts() {
        let msg = RingError::InsufficientSpace { requested: 5, available: 2 }.to_string();
        assert!(msg.contains('5') && msg.contains('2'), "{msg}");
    }
}
