use crate::critical::{CriticalSection, HostMutex};
use crate::invariants::{
    debug_assert_batch_fits, debug_assert_bounded_occupancy, debug_assert_cursor_in_range,
};
use crate::metrics::Metrics;
use crate::{Config, MetricsSnapshot, Result, RingError};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// One producer and one consumer share a slot array and two wrapped cursors.
//
// ## Cursors
//
// `write_index` and `read_index` both live in `[0, capacity)`. One slot is
// always left free, so `read == write` means empty and the occupied count is
// `(write - read) mod capacity`, at most `capacity - 1`.
//
// ## Commit After Copy
//
// **Producer (write path), inside the task critical region:**
// 1. Load `write_index` Relaxed (only the producer stores it)
// 2. Load `read_index` Acquire (synchronizes with the consumer's release)
// 3. Reject the whole batch if it does not fit
// 4. Copy every record into its slot
// 5. Store `write_index` Release (publishes the records)
//
// **Consumer (read path), inside the task or interrupt critical region:**
// 1. Load `read_index` Relaxed (only the consumer stores it)
// 2. Load `write_index` Acquire (synchronizes with the producer's release)
// 3. Reject the whole batch if not enough records are buffered
// 4. Copy every record out of its slot
// 5. Store `read_index` Release (hands the slots back to the producer)
//
// A cursor never moves before its copy is complete, so the other side can
// only ever see fully written records and fully vacated slots.
//
// ## Critical Regions
//
// The measure/copy/commit sequence runs inside the injected `CriticalSection`.
// Every access to `storage` happens inside such a region, which is what makes
// the `UnsafeCell` access sound when the ring is shared. Occupancy queries only
// load the two atomic cursors and take no region.
//
// =============================================================================

/// Which form of critical region an operation runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Task,
    Isr,
}

/// Fixed-capacity ring of fixed-size byte records.
///
/// Records are copied in and out whole; a write or read either moves the entire
/// batch or nothing. Mutual exclusion comes from the `CriticalSection` type `C`.
///
/// # Example
///
/// ```
/// use recring_rs::RingBuffer;
///
/// // 4 slots of 4 bytes, so at most 3 records buffered
/// let ring = RingBuffer::create(4, 4).unwrap();
///
/// let src: Vec<u8> = [1u32, 2, 3].iter().flat_map(|v| v.to_le_bytes()).collect();
/// assert_eq!(ring.write(&src), Ok(3));
/// assert_eq!(ring.space_count(), 0);
///
/// let mut dst = [0u8; 8];
/// assert_eq!(ring.read(&mut dst), Ok(2));
/// assert_eq!(&dst[..4], &1u32.to_le_bytes());
/// ```
pub struct RingBuffer<C = HostMutex> {
    /// Next slot to write (stored by producer, loaded by both)
    write_index: CachePadded<AtomicUsize>,
    /// Next slot to read (stored by consumer, loaded by both)
    read_index: CachePadded<AtomicUsize>,

    config: Config,
    metrics: Metrics,
    section: C,

    /// `capacity * record_size` bytes, zeroed at creation.
    ///
    /// `Box<[u8]>` because the size is fixed for the ring's lifetime.
    storage: UnsafeCell<Box<[u8]>>,
}

// SAFETY: all storage access happens inside `C`'s regions, and `CriticalSection`
// implementors guarantee regions on one instance never overlap across threads.
// Cursors are atomics.
unsafe impl<C: CriticalSection + Sync> Sync for RingBuffer<C> {}

impl RingBuffer<HostMutex> {
    /// Creates a ring of `capacity` slots of `record_size` bytes guarded by a [`HostMutex`].
    ///
    /// Fails with `InvalidArgument` if `capacity < 2` or `record_size == 0`, and
    /// with `OutOfMemory` if the storage cannot be allocated.
    pub fn create(capacity: usize, record_size: usize) -> Result<Self> {
        Self::new(Config::new(capacity, record_size))
    }

    /// Creates a ring from a [`Config`], guarded by a [`HostMutex`].
    pub fn new(config: Config) -> Result<Self> {
        Self::with_section(config, HostMutex::new())
    }
}

impl<C: CriticalSection> RingBuffer<C> {
    /// Creates a ring using the given critical-section implementation.
    pub fn with_section(config: Config, section: C) -> Result<Self> {
        config.validate()?;
        let bytes = config.capacity * config.record_size;
        let storage = allocate_zeroed(bytes)?;

        debug!(
            capacity = config.capacity,
            record_size = config.record_size,
            bytes,
            "ring buffer created"
        );

        Ok(Self {
            write_index: CachePadded::new(AtomicUsize::new(0)),
            read_index: CachePadded::new(AtomicUsize::new(0)),
            config,
            metrics: Metrics::new(),
            section,
            storage: UnsafeCell::new(storage),
        })
    }

    // ---------------------------------------------------------------------
    // CONSTANTS & STATUS
    // ---------------------------------------------------------------------

    /// Number of record slots, including the one that is always kept free.
    #[inline]
    pub fn size(&self) -> usize {
        self.config.capacity
    }

    /// Size of the backing storage in bytes.
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.config.capacity * self.config.record_size
    }

    /// Bytes per record.
    #[inline]
    pub fn record_size(&self) -> usize {
        self.config.record_size
    }

    /// The critical-section implementation guarding this ring.
    #[inline]
    pub fn section(&self) -> &C {
        &self.section
    }

    /// Number of buffered, unread records.
    #[inline]
    pub fn data_count(&self) -> usize {
        let write = self.write_index.load(Ordering::Acquire);
        let read = self.read_index.load(Ordering::Acquire);
        occupied(write, read, self.size())
    }

    /// Number of records that can be written before the ring is full.
    #[inline]
    pub fn space_count(&self) -> usize {
        self.size() - 1 - self.data_count()
    }

    /// Returns true if no records are buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data_count() == 0
    }

    /// Returns true if a one-record write would be rejected.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.space_count() == 0
    }

    // ---------------------------------------------------------------------
    // PRODUCER API
    // ---------------------------------------------------------------------

    /// Writes every record in `src`, or nothing.
    ///
    /// `src` must hold a whole number of records. Returns the number of records
    /// written; fails with `InsufficientSpace` and leaves the ring untouched if
    /// they do not all fit.
    pub fn write(&self, src: &[u8]) -> Result<usize> {
        let count = self.records_in(src.len())?;
        if count == 0 {
            return Ok(0);
        }

        let result = self.section.critical(|| {
            let write = self.write_index.load(Ordering::Relaxed);
            let read = self.read_index.load(Ordering::Acquire);
            let available = self.size() - 1 - occupied(write, read, self.size());
            if count > available {
                return Err(RingError::InsufficientSpace {
                    requested: count,
                    available,
                });
            }

            // SAFETY: we are inside the region and the slots in
            // [write, write + count) are free: the consumer will not touch them
            // until `write_index` moves past them below.
            unsafe { self.copy_in(write, src, count) };
            self.commit_write(write, read, count, available);
            Ok(count)
        });

        match &result {
            Ok(n) => {
                if self.config.enable_metrics {
                    self.metrics.record_write(*n);
                }
            }
            Err(e) => {
                if self.config.enable_metrics {
                    self.metrics.record_rejected_write();
                }
                trace!(error = %e, "write rejected");
            }
        }
        result
    }

    /// Publish `count` freshly copied records.
    fn commit_write(&self, write: usize, read: usize, count: usize, available: usize) {
        debug_assert_batch_fits!(count, available);
        let new_write = self.advance(write, count);
        debug_assert_cursor_in_range!("write_index", new_write, self.size());
        debug_assert_bounded_occupancy!(occupied(new_write, read, self.size()), self.size());

        self.write_index.store(new_write, Ordering::Release);
    }

    // ---------------------------------------------------------------------
    // CONSUMER API
    // ---------------------------------------------------------------------

    /// Reads `dst.len() / record_size` records into `dst`, or nothing.
    ///
    /// Runs in a task-context critical region. Fails with `InsufficientData` and
    /// leaves the ring untouched if fewer records are buffered.
    pub fn read(&self, dst: &mut [u8]) -> Result<usize> {
        self.read_in(Context::Task, dst)
    }

    /// Same contract as [`read`](Self::read), but runs in the interrupt-safe region.
    ///
    /// Never blocks, allocates or logs.
    pub fn read_from_isr(&self, dst: &mut [u8]) -> Result<usize> {
        self.read_in(Context::Isr, dst)
    }

    fn read_in(&self, ctx: Context, dst: &mut [u8]) -> Result<usize> {
        let count = self.records_in(dst.len())?;
        if count == 0 {
            return Ok(0);
        }

        let result = self.enter(ctx, || {
            let read = self.read_index.load(Ordering::Relaxed);
            let write = self.write_index.load(Ordering::Acquire);
            let available = occupied(write, read, self.size());
            if count > available {
                return Err(RingError::InsufficientData {
                    requested: count,
                    available,
                });
            }

            // SAFETY: we are inside the region and the slots in
            // [read, read + count) were published by the producer's release of
            // `write_index`, which the acquire load above observed.
            unsafe { self.copy_out(read, dst, count) };
            self.commit_read(read, count, available);
            Ok(count)
        });

        match &result {
            Ok(n) => {
                if self.config.enable_metrics {
                    self.metrics.record_read(*n);
                }
            }
            Err(e) => {
                if self.config.enable_metrics {
                    self.metrics.record_rejected_read();
                }
                if ctx == Context::Task {
                    trace!(error = %e, "read rejected");
                }
            }
        }
        result
    }

    /// Release `count` slots back to the producer.
    fn commit_read(&self, read: usize, count: usize, available: usize) {
        debug_assert_batch_fits!(count, available);
        let new_read = self.advance(read, count);
        debug_assert_cursor_in_range!("read_index", new_read, self.size());

        self.read_index.store(new_read, Ordering::Release);
    }

    /// Copies `dst.len() / record_size` records starting `offset` records past
    /// the read cursor, without consuming them.
    ///
    /// Fails with `InsufficientData` unless `offset + count <= data_count()`.
    pub fn peek(&self, dst: &mut [u8], offset: usize) -> Result<usize> {
        let count = self.records_in(dst.len())?;

        let result = self.section.critical(|| {
            let read = self.read_index.load(Ordering::Relaxed);
            let write = self.write_index.load(Ordering::Acquire);
            let available = occupied(write, read, self.size());
            let end = offset.saturating_add(count);
            if end > available {
                return Err(RingError::InsufficientData {
                    requested: end,
                    available,
                });
            }

            // SAFETY: same as `read_in`; the slots stay owned by the consumer
            // because `read_index` does not move.
            unsafe { self.copy_out(self.advance(read, offset), dst, count) };
            Ok(count)
        });

        if let Err(e) = &result {
            trace!(error = %e, offset, "peek rejected");
        }
        result
    }

    /// Discards every buffered record by moving the read cursor to the write cursor.
    ///
    /// Returns the number of records discarded. Calling it twice in a row is the
    /// same as calling it once.
    pub fn flush(&self) -> usize {
        let discarded = self.section.critical(|| {
            let read = self.read_index.load(Ordering::Relaxed);
            let write = self.write_index.load(Ordering::Acquire);
            self.read_index.store(write, Ordering::Release);
            occupied(write, read, self.size())
        });

        if discarded > 0 {
            if self.config.enable_metrics {
                self.metrics.record_flush(discarded);
            }
            debug!(discarded, "ring buffer flushed");
        }
        discarded
    }

    /// Get a snapshot of metrics if enabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        if self.config.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }

    // ---------------------------------------------------------------------
    // SLOT ARITHMETIC
    // ---------------------------------------------------------------------

    #[inline]
    fn enter<R>(&self, ctx: Context, f: impl FnOnce() -> R) -> R {
        match ctx {
            Context::Task => self.section.critical(f),
            Context::Isr => self.section.critical_from_isr(f),
        }
    }

    /// Number of whole records in a slice of `len` bytes.
    #[inline]
    fn records_in(&self, len: usize) -> Result<usize> {
        if len % self.record_size() != 0 {
            return Err(RingError::InvalidArgument {
                reason: "slice length is not a multiple of the record size",
            });
        }
        Ok(len / self.record_size())
    }

    /// Slot `n` records after `index`, wrapping at capacity. Requires `n < capacity`.
    #[inline]
    fn advance(&self, index: usize, n: usize) -> usize {
        let to_end = self.size() - index;
        if n < to_end {
            index + n
        } else {
            n - to_end
        }
    }

    /// Split `count` slots starting at `start` into the run before the physical
    /// end of storage and the run that wraps to slot 0.
    #[inline]
    fn segments(&self, start: usize, count: usize) -> (Range<usize>, Range<usize>) {
        let first = count.min(self.size() - start);
        (start..start + first, 0..count - first)
    }

    #[inline]
    fn byte_range(&self, slots: Range<usize>) -> Range<usize> {
        slots.start * self.record_size()..slots.end * self.record_size()
    }

    /// Copy `count` records from `src` into the slots starting at `start`.
    ///
    /// # Safety
    ///
    /// Caller must be inside a critical region and own the target slots.
    unsafe fn copy_in(&self, start: usize, src: &[u8], count: usize) {
        let storage = &mut *self.storage.get();
        let (head, tail) = self.segments(start, count);
        let split = head.len() * self.record_size();
        storage[self.byte_range(head)].copy_from_slice(&src[..split]);
        storage[self.byte_range(tail)].copy_from_slice(&src[split..]);
    }

    /// Copy `count` records out of the slots starting at `start` into `dst`.
    ///
    /// # Safety
    ///
    /// Caller must be inside a critical region and the slots must hold published records.
    unsafe fn copy_out(&self, start: usize, dst: &mut [u8], count: usize) {
        let storage = &*self.storage.get();
        let (head, tail) = self.segments(start, count);
        let split = head.len() * self.record_size();
        dst[..split].copy_from_slice(&storage[self.byte_range(head)]);
        dst[split..].copy_from_slice(&storage[self.byte_range(tail)]);
    }
}

impl<C> fmt::Debug for RingBuffer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.config.capacity)
            .field("record_size", &self.config.record_size)
            .field("read_index", &self.read_index.load(Ordering::Relaxed))
            .field("write_index", &self.write_index.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Occupied slots between two wrapped cursors.
#[inline]
fn occupied(write: usize, read: usize, capacity: usize) -> usize {
    if write >= read {
        write - read
    } else {
        capacity - read + write
    }
}

/// Allocate `bytes` zeroed bytes, reporting failure instead of aborting.
fn allocate_zeroed(bytes: usize) -> Result<Box<[u8]>> {
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(bytes)
        .map_err(|_| RingError::OutOfMemory { bytes })?;
    storage.resize(bytes, 0);
    Ok(storage.into_boxed_slice())
}
