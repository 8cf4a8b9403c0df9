use std::hint;
use std::thread;
use std::time::{Duration, Instant};

/// Adaptive backoff strategy (Crossbeam-style).
///
/// Progressively increases wait time: spin with PAUSE → yield to OS → sleep in
/// short naps. Never used from interrupt context.
#[derive(Debug)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 6; // 2^6 = 64 spins max before yielding
    const YIELD_LIMIT: u32 = 10; // Then start napping
    const NAP: Duration = Duration::from_micros(100);

    /// Creates a new backoff instance.
    #[inline]
    pub fn new() -> Self {
        Self { step: 0 }
    }

    /// Light spin with PAUSE hints.
    #[inline]
    pub fn spin(&mut self) {
        let spins = 1 << self.step.min(Self::SPIN_LIMIT);
        for _ in 0..spins {
            hint::spin_loop();
        }
        if self.step <= Self::SPIN_LIMIT {
            self.step += 1;
        }
    }

    /// Heavier backoff: spin then yield.
    #[inline]
    pub fn snooze(&mut self) {
        if self.step <= Self::SPIN_LIMIT {
            self.spin();
        } else {
            thread::yield_now();
            if self.step <= Self::YIELD_LIMIT {
                self.step += 1;
            }
        }
    }

    /// Wait once, never past `deadline` (`None` waits without limit).
    ///
    /// Snoozes until spinning and yielding are exhausted, then sleeps in short
    /// naps clipped to the time remaining.
    pub fn wait(&mut self, deadline: Option<Instant>) {
        if !self.is_completed() {
            self.snooze();
            return;
        }
        let nap = match deadline {
            Some(d) => d.saturating_duration_since(Instant::now()).min(Self::NAP),
            None => Self::NAP,
        };
        thread::sleep(nap);
    }

    /// Check if spinning and yielding are exhausted.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.step > Self::YIELD_LIMIT
    }

    /// Reset for next wait cycle.
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
