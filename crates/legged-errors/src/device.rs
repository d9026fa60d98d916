//! Input-device error types.

use crate::common::ErrorSeverity;

/// Errors raised while opening or polling a human-input device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// No physical device is attached; callers fall back to the emulated
    /// keyboard gamepad.
    #[error("No input device connected")]
    NoDevice,

    /// The platform backend (HID stack, terminal) reported a failure
    #[error("Input backend error: {0}")]
    Backend(String),

    /// A device that was open stopped answering
    #[error("Input device disconnected: {0}")]
    Disconnected(String),
}

impl DeviceError {
    /// Create a backend error from any displayable source.
    pub fn backend(err: impl core::fmt::Display) -> Self {
        DeviceError::Backend(err.to_string())
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DeviceError::NoDevice => ErrorSeverity::Warning,
            DeviceError::Backend(_) => ErrorSeverity::Error,
            DeviceError::Disconnected(_) => ErrorSeverity::Error,
        }
    }

    /// Whether the caller should try the emulated fallback device.
    pub fn should_fall_back(&self) -> bool {
        matches!(self, DeviceError::NoDevice)
    }
}
