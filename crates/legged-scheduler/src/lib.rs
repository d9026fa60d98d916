//! Fixed-period cycle clock for the control loop.
//!
//! The clock is deliberately simple: a cycle that finishes early sleeps out
//! the rest of its period, a cycle that finishes late is counted as an
//! overrun and the next one starts immediately. There is no catch-up and no
//! period adaptation.
//!
//! - **CycleClock**: start/finish bracketing of each cycle, overrun counters
//! - **DriftMetrics**: wake-up lateness versus the deadline, with percentiles
//! - **Clock / Sleeper**: time seams so cadence logic is testable without
//!   wall-clock sleeps
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use legged_scheduler::CycleClock;
//!
//! let mut clock = CycleClock::system(Duration::from_millis(20));
//! for _ in 0..10 {
//!     clock.start_cycle();
//!     // control work
//!     let outcome = clock.finish_cycle();
//!     if outcome.overran {
//!         eprintln!("cycle {} overran by {:?}", outcome.cycle, outcome.overrun_by);
//!     }
//! }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(unused_must_use)]

pub mod clock;
pub mod cycle;
pub mod drift;
pub mod prelude;

pub use clock::{Clock, ManualClock, ManualSleeper, Sleeper, SystemClock, ThreadSleeper};
pub use cycle::{CycleClock, CycleOutcome};
pub use drift::{DriftMetrics, DriftSummary};

/// Default control period (50 Hz).
pub const DEFAULT_PERIOD_NS: u64 = 20_000_000;
