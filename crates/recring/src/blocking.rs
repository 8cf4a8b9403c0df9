//! Timed, retrying wrappers over the non-blocking ring operations.
//!
//! The core never waits. These helpers retry a write or read that failed for
//! lack of space or data until it succeeds or the timeout passes, backing off
//! between attempts. They are for task context only.

use crate::critical::CriticalSection;
use crate::{Backoff, Result, RingBuffer};
use std::time::{Duration, Instant};
use tracing::trace;

impl<C: CriticalSection> RingBuffer<C> {
    /// [`write`](Self::write), retried until it fits or `timeout` elapses.
    ///
    /// A zero timeout makes exactly one attempt. On expiry the last
    /// `InsufficientSpace` error is returned; other errors return at once.
    pub fn write_timeout(&self, src: &[u8], timeout: Duration) -> Result<usize> {
        retry_until(timeout, || self.write(src))
    }

    /// [`read`](Self::read), retried until enough records arrive or `timeout` elapses.
    pub fn read_timeout(&self, dst: &mut [u8], timeout: Duration) -> Result<usize> {
        retry_until(timeout, || self.read(dst))
    }
}

/// Run `attempt` until it returns anything but a recoverable error, or the deadline passes.
///
/// A timeout too large to represent as an `Instant` waits without limit.
fn retry_until<T>(timeout: Duration, mut attempt: impl FnMut() -> Result<T>) -> Result<T> {
    let deadline = Instant::now().checked_add(timeout);
    let mut backoff = Backoff::new();
    let mut retries = 0u64;

    loop {
        match attempt() {
            Err(e) if e.is_recoverable() => {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    trace!(retries, error = %e, "timed out waiting on ring buffer");
                    return Err(e);
                }
                retries += 1;
                backoff.wait(deadline);
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RingError;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_zero_timeout_is_single_attempt() {
        let ring = RingBuffer::create(2, 1).unwrap();
        ring.write(&[1]).unwrap();

        let start = Instant::now();
        assert_eq!(
            ring.write_timeout(&[2], Duration::ZERO),
            Err(RingError::InsufficientSpace {
                requested: 1,
                available: 0
            })
        );
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_read_times_out_on_empty_ring() {
        let ring = RingBuffer::create(4, 1).unwrap();
        let start = Instant::now();
        let err = ring
            .read_timeout(&mut [0u8; 1], Duration::from_millis(20))
            .unwrap_err();
        assert!(matches!(err, RingError::InsufficientData { .. }));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_invalid_argument_is_not_retried() {
        let ring = RingBuffer::create(4, 2).unwrap();
        let start = Instant::now();
        assert!(matches!(
            ring.write_timeout(&[1, 2, 3], Duration::from_secs(5)),
            Err(RingError::InvalidArgument { .. })
        ));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_read_waits_for_producer() {
        let ring = Arc::new(RingBuffer::create(4, 1).unwrap());
        let producer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                ring.write(&[9, 8]).unwrap();
            })
        };

        let mut out = [0u8; 2];
        assert_eq!(ring.read_timeout(&mut out, Duration::from_secs(5)), Ok(2));
        assert_eq!(out, [9, 8]);
        producer.join().unwrap();
    }
}
