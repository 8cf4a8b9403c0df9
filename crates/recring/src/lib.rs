//! RecRing - Fixed-Size Record Ring Buffer for Task and Interrupt Contexts
//!
//! A fixed-capacity circular buffer moving batches of fixed-size records between
//! exactly one producer and one consumer, where either side may be a task or an
//! interrupt handler.
//!
//! # Key Features
//!
//! - All-or-nothing batches: a write or read moves every record or none
//! - Commit after copy: a cursor only moves once its records are fully copied
//! - Injected [`CriticalSection`] with task and interrupt forms
//! - Full-by-one-slot convention: `capacity - 1` usable slots, `read == write` is empty
//! - Optional timed wrappers (`write_timeout`, `read_timeout`) kept outside the core
//!
//! # Example
//!
//! ```
//! use recring_rs::{RingBuffer, RingError};
//!
//! let ring = RingBuffer::create(4, 4).unwrap();
//! let src: Vec<u8> = [1u32, 2, 3].iter().flat_map(|v| v.to_le_bytes()).collect();
//! assert_eq!(ring.write(&src), Ok(3));
//!
//! // Full: the fourth record is rejected and nothing changes
//! assert!(matches!(
//!     ring.write(&4u32.to_le_bytes()),
//!     Err(RingError::InsufficientSpace { .. })
//! ));
//!
//! let mut dst = [0u8; 12];
//! assert_eq!(ring.read(&mut dst), Ok(3));
//! assert_eq!(&dst[..], &src[..]);
//! ```

mod backoff;
mod blocking;
mod config;
pub mod critical;
mod error;
mod invariants;
mod metrics;
mod ring;

pub use backoff::Backoff;
pub use config::{Config, BYTE_STREAM_CONFIG, WORD_QUEUE_CONFIG};
pub use critical::{Counting, CriticalSection, HostMutex, NoopSection};
pub use error::{status, Result, RingError};
pub use metrics::MetricsSnapshot;
pub use ring::RingBuffer;
