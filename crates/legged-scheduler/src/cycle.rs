//! The cycle clock.

use std::time::Duration;

use crate::clock::{Clock, Sleeper, SystemClock, ThreadSleeper};
use crate::drift::DriftMetrics;

/// Result of closing one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    /// 1-based index of the cycle that just finished
    pub cycle: u64,
    /// Time spent in the cycle body
    pub elapsed: Duration,
    /// Time slept to reach the deadline (zero on overrun)
    pub slept: Duration,
    /// Whether the body used up the whole period
    pub overran: bool,
    /// How far past the period the body ran (zero when on time)
    pub overrun_by: Duration,
    /// Consecutive overruns including this cycle (zero when on time)
    pub consecutive_overruns: u64,
}

/// Fixed-period cycle clock.
///
/// Each cycle is bracketed by [`start_cycle`](Self::start_cycle) and
/// [`finish_cycle`](Self::finish_cycle). When the body finishes before the
/// period elapses the clock sleeps the remainder; otherwise it counts an
/// overrun and returns immediately. Missed time is never caught up.
///
/// `overrun_count` is monotonic for the life of the clock.
/// `consecutive_overruns` resets on the first on-time cycle.
#[derive(Debug)]
pub struct CycleClock<C: Clock = SystemClock, S: Sleeper = ThreadSleeper> {
    period: Duration,
    clock: C,
    sleeper: S,
    cycle_start: Option<Duration>,
    last_deadline: Option<Duration>,
    overrun_count: u64,
    consecutive_overruns: u64,
    cycle_count: u64,
    drift: DriftMetrics,
}

impl CycleClock {
    /// Create a wall-clock cycle clock with the given period.
    pub fn system(period: Duration) -> Self {
        Self::new(period, SystemClock::new(), ThreadSleeper)
    }
}

impl<C: Clock, S: Sleeper> CycleClock<C, S> {
    /// Create a cycle clock over explicit time and sleep sources.
    pub fn new(period: Duration, clock: C, sleeper: S) -> Self {
        Self {
            period,
            clock,
            sleeper,
            cycle_start: None,
            last_deadline: None,
            overrun_count: 0,
            consecutive_overruns: 0,
            cycle_count: 0,
            drift: DriftMetrics::new(),
        }
    }

    /// Mark the start of a cycle.
    pub fn start_cycle(&mut self) {
        let now = self.clock.now();
        self.cycle_start = Some(now);
        self.last_deadline = Some(now.saturating_add(self.period));
    }

    /// Close the current cycle: sleep out the remaining period or count an
    /// overrun.
    ///
    /// Calling this without a matching `start_cycle` treats the body as
    /// having taken no time.
    pub fn finish_cycle(&mut self) -> CycleOutcome {
        let now = self.clock.now();
        let start = self.cycle_start.take().unwrap_or(now);
        let deadline = self
            .last_deadline
            .unwrap_or_else(|| start.saturating_add(self.period));
        let elapsed = now.saturating_sub(start);
        self.cycle_count = self.cycle_count.saturating_add(1);

        if elapsed < self.period {
            let slept = self.period.saturating_sub(elapsed);
            self.sleeper.sleep(slept);
            self.consecutive_overruns = 0;

            let lateness = self.clock.now().saturating_sub(deadline);
            self.drift.record(duration_ns(lateness));

            CycleOutcome {
                cycle: self.cycle_count,
                elapsed,
                slept,
                overran: false,
                overrun_by: Duration::ZERO,
                consecutive_overruns: 0,
            }
        } else {
            let overrun_by = elapsed.saturating_sub(self.period);
            self.overrun_count = self.overrun_count.saturating_add(1);
            self.consecutive_overruns = self.consecutive_overruns.saturating_add(1);
            self.drift.record(duration_ns(overrun_by));

            tracing::trace!(
                cycle = self.cycle_count,
                overrun_us = duration_ns(overrun_by) / 1_000,
                "cycle overran its period"
            );

            CycleOutcome {
                cycle: self.cycle_count,
                elapsed,
                slept: Duration::ZERO,
                overran: true,
                overrun_by,
                consecutive_overruns: self.consecutive_overruns,
            }
        }
    }

    /// The configured period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Total overruns since construction.
    pub fn overrun_count(&self) -> u64 {
        self.overrun_count
    }

    /// Overruns since the last on-time cycle.
    pub fn consecutive_overruns(&self) -> u64 {
        self.consecutive_overruns
    }

    /// Cycles closed since construction.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Deadline of the most recently started cycle, on this clock's timeline.
    pub fn last_deadline(&self) -> Option<Duration> {
        self.last_deadline
    }

    /// Drift statistics.
    pub fn drift(&self) -> &DriftMetrics {
        &self.drift
    }

    /// The time source.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The sleep primitive.
    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }
}

fn duration_ns(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
