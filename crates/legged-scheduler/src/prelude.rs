//! Prelude module for common scheduler types.

pub use crate::DEFAULT_PERIOD_NS;
pub use crate::clock::{Clock, Sleeper, SystemClock, ThreadSleeper};
pub use crate::cycle::{CycleClock, CycleOutcome};
pub use crate::drift::{DriftMetrics, DriftSummary};
