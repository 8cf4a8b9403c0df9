use crate::{Result, RingError};

/// Configuration for a [`RingBuffer`](crate::RingBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Number of record slots (one is always kept free, so at most `capacity - 1` are usable)
    pub capacity: usize,
    /// Bytes per record
    pub record_size: usize,
    /// Enable metrics collection (slight overhead)
    #[cfg_attr(feature = "serde", serde(default))]
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration with metrics disabled.
    pub const fn new(capacity: usize, record_size: usize) -> Self {
        Self {
            capacity,
            record_size,
            enable_metrics: false,
        }
    }

    /// Enables or disables metrics collection.
    pub const fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Size of the backing storage, or `None` if it overflows `usize`.
    #[inline]
    pub const fn size_in_bytes(&self) -> Option<usize> {
        self.capacity.checked_mul(self.record_size)
    }

    /// Checks the configuration describes a buildable ring.
    pub fn validate(&self) -> Result<()> {
        if self.capacity < 2 {
            return Err(RingError::InvalidArgument {
                reason: "capacity must be at least 2",
            });
        }
        if self.record_size == 0 {
            return Err(RingError::InvalidArgument {
                reason: "record size must be non-zero",
            });
        }
        if self.size_in_bytes().is_none() {
            return Err(RingError::InvalidArgument {
                reason: "capacity * record size overflows usize",
            });
        }
        Ok(())
    }
}

/// Byte stream configuration (256 one-byte slots, UART receive style)
pub const BYTE_STREAM_CONFIG: Config = Config::new(256, 1);

/// Word queue configuration (64 four-byte slots)
pub const WORD_QUEUE_CONFIG: Config = Config::new(64, 4);
