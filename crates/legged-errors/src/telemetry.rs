//! Telemetry session serialization errors.

use crate::common::ErrorSeverity;

/// Errors raised while persisting or re-reading a telemetry session.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Writing or reading the session file failed
    #[error("Telemetry I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialized session could not be parsed back
    #[error("Malformed telemetry at line {line}: {reason}")]
    Parse {
        /// 1-based line number in the file
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// The store held no rows, so there was nothing to save
    #[error("No telemetry recorded")]
    Empty,
}

impl TelemetryError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TelemetryError::Io(_) => ErrorSeverity::Error,
            TelemetryError::Parse { .. } => ErrorSeverity::Error,
            TelemetryError::Empty => ErrorSeverity::Info,
        }
    }

    /// Create a parse error for the given line.
    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        TelemetryError::Parse {
            line,
            reason: reason.into(),
        }
    }
}
