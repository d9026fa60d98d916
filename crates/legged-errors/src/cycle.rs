//! Per-cycle computational errors.
//!
//! Everything in here is recoverable by construction: the loop logs the
//! error, abandons the rest of the cycle body, and still sleeps to cadence.

use crate::common::ErrorSeverity;

/// A fault confined to a single control cycle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CycleError {
    /// A numeric input or output was NaN or infinite
    #[error("Non-finite value in {field}[{index}]")]
    NonFinite {
        /// Logical field name (e.g. `joint_q`, `kp`)
        field: &'static str,
        /// Element index inside the field
        index: usize,
    },

    /// An array did not have the configured joint count
    #[error("{field} has {actual} elements, expected {expected}")]
    ShapeMismatch {
        /// Logical field name
        field: &'static str,
        /// Expected element count
        expected: usize,
        /// Actual element count
        actual: usize,
    },

    /// The sensing collaborator failed to produce a snapshot
    #[error("Sensor snapshot failed: {0}")]
    Sensor(String),

    /// The actuation collaborator rejected a command
    #[error("Actuation failed: {0}")]
    Actuator(String),

    /// The policy/FSM step failed
    #[error("Policy step failed: {0}")]
    Policy(String),
}

impl CycleError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CycleError::NonFinite { .. } => ErrorSeverity::Warning,
            CycleError::ShapeMismatch { .. } => ErrorSeverity::Error,
            CycleError::Sensor(_) => ErrorSeverity::Warning,
            CycleError::Actuator(_) => ErrorSeverity::Error,
            CycleError::Policy(_) => ErrorSeverity::Error,
        }
    }

    /// Check that every element of `values` is finite.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::NonFinite`] naming the first offending element.
    pub fn check_finite(field: &'static str, values: &[f32]) -> Result<(), CycleError> {
        match values.iter().position(|v| !v.is_finite()) {
            Some(index) => Err(CycleError::NonFinite { field, index }),
            None => Ok(()),
        }
    }

    /// Check that `values` has exactly `expected` elements.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::ShapeMismatch`] when the lengths differ.
    pub fn check_len(field: &'static str, values: &[f32], expected: usize) -> Result<(), CycleError> {
        if values.len() == expected {
            Ok(())
        } else {
            Err(CycleError::ShapeMismatch {
                field,
                expected,
                actual: values.len(),
            })
        }
    }
}
