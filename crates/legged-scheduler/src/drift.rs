//! Wake-up drift tracking.
//!
//! Drift is how late a cycle actually resumed relative to its deadline. For
//! on-time cycles that is the sleep overshoot; for overruns it is the amount
//! the cycle body ran past its period.

use std::collections::VecDeque;

/// Lateness distribution at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriftSummary {
    /// Cycles recorded over the whole run
    pub cycles: u64,
    /// Median lateness over the retained window, in nanoseconds
    pub p50_ns: u64,
    /// 99th percentile lateness over the retained window, in nanoseconds
    pub p99_ns: u64,
    /// Worst lateness over the whole run, in nanoseconds
    pub max_ns: u64,
}

/// Per-cycle lateness samples over a bounded window.
#[derive(Debug, Clone)]
pub struct DriftMetrics {
    window: VecDeque<u64>,
    capacity: usize,
    cycles: u64,
    max_ns: u64,
}

impl Default for DriftMetrics {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_WINDOW)
    }
}

impl DriftMetrics {
    const DEFAULT_WINDOW: usize = 4_096;

    /// Create drift metrics with the default window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create drift metrics retaining the latest `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            cycles: 0,
            max_ns: 0,
        }
    }

    /// Record one cycle's lateness. Does not allocate once the window is full.
    pub fn record(&mut self, lateness_ns: u64) {
        self.cycles = self.cycles.saturating_add(1);
        self.max_ns = self.max_ns.max(lateness_ns);

        if self.capacity == 0 {
            return;
        }
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(lateness_ns);
    }

    /// Cycles recorded.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Worst lateness seen, in nanoseconds.
    pub fn max_ns(&self) -> u64 {
        self.max_ns
    }

    /// Most recent lateness, in nanoseconds.
    pub fn last_ns(&self) -> Option<u64> {
        self.window.back().copied()
    }

    /// Percentiles over the window. Sorts a copy, so call it at the end of a
    /// run rather than per cycle.
    pub fn summary(&self) -> DriftSummary {
        let mut sorted: Vec<u64> = self.window.iter().copied().collect();
        sorted.sort_unstable();
        DriftSummary {
            cycles: self.cycles,
            p50_ns: nearest_rank(&sorted, 50),
            p99_ns: nearest_rank(&sorted, 99),
            max_ns: self.max_ns,
        }
    }
}

/// Nearest-rank percentile of an ascending slice; 0 when empty.
fn nearest_rank(sorted: &[u64], percent: usize) -> u64 {
    let rank = sorted
        .len()
        .saturating_mul(percent)
        .div_ceil(100)
        .saturating_sub(1);
    sorted.get(rank).copied().unwrap_or(0)
}
