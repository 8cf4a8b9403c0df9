use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters, updated only when `Config::enable_metrics` is set.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
    records_written: AtomicU64,
    records_read: AtomicU64,
    write_batches: AtomicU64,
    read_batches: AtomicU64,
    rejected_writes: AtomicU64,
    rejected_reads: AtomicU64,
    records_flushed: AtomicU64,
}

/// Point-in-time copy of a ring's metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_written: u64,
    pub records_read: u64,
    pub write_batches: u64,
    pub read_batches: u64,
    pub rejected_writes: u64,
    pub rejected_reads: u64,
    /// Records discarded by `flush()` without being read
    pub records_flushed: u64,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_write(&self, n: usize) {
        self.records_written.fetch_add(n as u64, Ordering::Relaxed);
        self.write_batches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_read(&self, n: usize) {
        self.records_read.fetch_add(n as u64, Ordering::Relaxed);
        self.read_batches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejected_write(&self) {
        self.rejected_writes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejected_read(&self) {
        self.rejected_reads.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_flush(&self, discarded: usize) {
        self.records_flushed.fetch_add(discarded as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_written: self.records_written.load(Ordering::Relaxed),
            records_read: self.records_read.load(Ordering::Relaxed),
            write_batches: self.write_batches.load(Ordering::Relaxed),
            read_batches: self.read_batches.load(Ordering::Relaxed),
            rejected_writes: self.rejected_writes.load(Ordering::Relaxed),
            rejected_reads: self.rejected_reads.load(Ordering::Relaxed),
            records_flushed: self.records_flushed.load(Ordering::Relaxed),
        }
    }
}
