//! Critical-section capability injected into a [`RingBuffer`](crate::RingBuffer).
//!
//! The ring never masks interrupts or talks to a scheduler itself. It asks its
//! `CriticalSection` to run the copy-and-commit step, in one of two forms:
//!
//! - **task form** (`critical`): may block the calling task until the region is free.
//! - **interrupt form** (`critical_from_isr`): must never park, sleep or yield to a
//!   scheduler. It may only spin, and it must restore whatever state it changed on
//!   the way out.
//!
//! On an RTOS target the two forms map onto "enter critical" and the
//! "enter critical from ISR / restore saved mask" pair. On a host, [`HostMutex`]
//! stands in for both and [`NoopSection`] serves single-threaded code.

use std::cell::Cell;
use std::hint;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, TryLockError};

/// A scoped mutual-exclusion region usable from task or interrupt context.
///
/// # Safety
///
/// Regions entered through one instance must never overlap across threads, in
/// either form. A ring shared between threads relies on this for the soundness
/// of its storage access. A `!Sync` implementation can never be shared, so it
/// only has to avoid reentrancy.
pub unsafe trait CriticalSection {
    /// Run `f` inside a task-context critical region.
    fn critical<R>(&self, f: impl FnOnce() -> R) -> R;

    /// Run `f` inside an interrupt-safe critical region. Never blocks or yields.
    fn critical_from_isr<R>(&self, f: impl FnOnce() -> R) -> R;
}

/// Host implementation backed by `std::sync::Mutex`.
///
/// The interrupt form busy-waits on `try_lock` instead of parking the thread.
/// Poisoning is ignored: a panic inside the region cannot leave a half-committed
/// cursor behind, because cursors are stored only after the copy finishes.
#[derive(Debug, Default)]
pub struct HostMutex {
    lock: Mutex<()>,
}

impl HostMutex {
    pub const fn new() -> Self {
        Self {
            lock: Mutex::new(()),
        }
    }
}

// SAFETY: both forms hold the same mutex for the whole region.
unsafe impl CriticalSection for HostMutex {
    fn critical<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    fn critical_from_isr<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = loop {
            match self.lock.try_lock() {
                Ok(guard) => break guard,
                Err(TryLockError::Poisoned(poisoned)) => break poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => hint::spin_loop(),
            }
        };
        f()
    }
}

/// No-op region for single-threaded use.
///
/// `NoopSection` is `!Sync`, so a ring built on it cannot be shared between threads.
#[derive(Debug, Default)]
pub struct NoopSection {
    _not_sync: PhantomData<Cell<()>>,
}

impl NoopSection {
    pub const fn new() -> Self {
        Self {
            _not_sync: PhantomData,
        }
    }
}

// SAFETY: `NoopSection` is `!Sync`, so every region runs on the owning thread.
unsafe impl CriticalSection for NoopSection {
    #[inline]
    fn critical<R>(&self, f: impl FnOnce() -> R) -> R {
        f()
    }

    #[inline]
    fn critical_from_isr<R>(&self, f: impl FnOnce() -> R) -> R {
        f()
    }
}

/// Wrapper counting how many regions of each form were entered.
#[derive(Debug, Default)]
pub struct Counting<C> {
    inner: C,
    task_entries: AtomicUsize,
    isr_entries: AtomicUsize,
}

impl<C> Counting<C> {
    pub const fn new(inner: C) -> Self {
        Self {
            inner,
            task_entries: AtomicUsize::new(0),
            isr_entries: AtomicUsize::new(0),
        }
    }

    /// Number of task-context regions entered so far.
    pub fn task_entries(&self) -> usize {
        self.task_entries.load(Ordering::Relaxed)
    }

    /// Number of interrupt-context regions entered so far.
    pub fn isr_entries(&self) -> usize {
        self.isr_entries.load(Ordering::Relaxed)
    }
}

// SAFETY: every region is delegated to `inner`.
unsafe impl<C: CriticalSection> CriticalSection for Counting<C> {
    fn critical<R>(&self, f: impl FnOnce() -> R) -> R {
        self.task_entries.fetch_add(1, Ordering::Relaxed);
        self.inner.critical(f)
    }

    fn critical_from_isr<R>(&self, f: impl FnOnce() -> R) -> R {
        self.isr_entries.fetch_add(1, Ordering::Relaxed);
        self.inner.critical_from_isr(f)
    }
}
