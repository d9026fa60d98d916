//! Error taxonomy for the legged-robot control harness.
//!
//! The harness must keep the control loop alive under partial failure, so
//! every error type here carries a classification that tells the caller
//! whether to fall back, skip the cycle, or drop a telemetry session:
//!
//! - [`device`]: input-device discovery and I/O. `NoDevice` triggers the
//!   keyboard fallback and is never fatal.
//! - [`cycle`]: per-cycle computational faults. Caught at the loop boundary,
//!   logged, and the cycle is skipped.
//! - [`telemetry`]: session serialization. Logged, the session is discarded.
//! - [`config`]: startup configuration. The only family allowed to stop the
//!   process, and only before the loop starts.
//!
//! Cycle overruns are deliberately absent: they are a counted statistic on
//! the cycle clock, not an error.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod common;
pub mod config;
pub mod cycle;
pub mod device;
pub mod telemetry;

pub use common::{ErrorCategory, ErrorSeverity, HarnessError};
pub use config::ConfigError;
pub use cycle::CycleError;
pub use device::DeviceError;
pub use telemetry::TelemetryError;

/// A specialized `Result` type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// A specialized `Result` type for work done inside one control cycle.
pub type CycleResult<T = ()> = std::result::Result<T, CycleError>;
