//! Time sources and sleep primitives.
//!
//! Time is expressed as a [`Duration`] since an arbitrary per-clock origin,
//! which lets the manual test clock start at zero and advance exactly.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since this clock's origin.
    fn now(&self) -> Duration;
}

/// Blocking sleep primitive used for the end-of-cycle wait.
pub trait Sleeper {
    /// Suspend the calling thread for `duration`.
    fn sleep(&mut self, duration: Duration);
}

/// Wall-clock implementation backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Sleeper backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Manually advanced clock for deterministic tests.
///
/// Clones share the same underlying time, so a test can keep one handle to
/// simulate work while the [`CycleClock`](crate::CycleClock) owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a manual clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `duration`.
    pub fn advance(&self, duration: Duration) {
        let step = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(step, Ordering::SeqCst);
    }

    /// Create a sleeper that advances this clock instead of blocking.
    pub fn sleeper(&self) -> ManualSleeper {
        ManualSleeper {
            clock: self.clone(),
            sleeps: Vec::new(),
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// Sleeper that advances a [`ManualClock`] and records every request.
#[derive(Debug, Clone)]
pub struct ManualSleeper {
    clock: ManualClock,
    sleeps: Vec<Duration>,
}

impl ManualSleeper {
    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }
}

impl Sleeper for ManualSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
        self.clock.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(Duration::from_millis(3));
        assert_eq!(clock.now(), Duration::from_millis(3));
    }

    #[test]
    fn test_manual_sleeper_advances_clock() {
        let clock = ManualClock::new();
        let mut sleeper = clock.sleeper();
        sleeper.sleep(Duration::from_millis(5));
        sleeper.sleep(Duration::from_millis(7));
        assert_eq!(clock.now(), Duration::from_millis(12));
        assert_eq!(
            sleeper.sleeps(),
            &[Duration::from_millis(5), Duration::from_millis(7)]
        );
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
