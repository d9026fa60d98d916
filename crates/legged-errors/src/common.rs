//! Umbrella error type and classification shared by every harness crate.

use core::fmt;

use crate::{ConfigError, CycleError, DeviceError, TelemetryError};

/// Top-level error wrapping every harness sub-error.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Input device errors
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Per-cycle computational errors
    #[error("Cycle error: {0}")]
    Cycle(#[from] CycleError),

    /// Telemetry serialization errors
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// Startup configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl HarnessError {
    /// Which subsystem raised the error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            HarnessError::Device(_) => ErrorCategory::Device,
            HarnessError::Cycle(_) => ErrorCategory::Cycle,
            HarnessError::Telemetry(_) => ErrorCategory::Telemetry,
            HarnessError::Config(_) => ErrorCategory::Config,
        }
    }

    /// Severity of the wrapped error. Configuration errors are always
    /// critical since they stop startup.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HarnessError::Device(e) => e.severity(),
            HarnessError::Cycle(e) => e.severity(),
            HarnessError::Telemetry(e) => e.severity(),
            HarnessError::Config(_) => ErrorSeverity::Critical,
        }
    }
}

/// Subsystem that raised a [`HarnessError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Gamepad or keyboard input
    Device,
    /// Work inside one control cycle
    Cycle,
    /// Session persistence
    Telemetry,
    /// Startup configuration
    Config,
}

impl ErrorCategory {
    /// Short lowercase name, as used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Device => "device",
            ErrorCategory::Cycle => "cycle",
            ErrorCategory::Telemetry => "telemetry",
            ErrorCategory::Config => "config",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far an error reaches, from a log line to a stopped process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Nothing to act on
    Info,
    /// Degraded but running (e.g. keyboard fallback)
    Warning,
    /// One operation failed and was skipped
    Error,
    /// The process cannot start or continue
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorSeverity::Info => "INFO",
            ErrorSeverity::Warning => "WARN",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        })
    }
}
