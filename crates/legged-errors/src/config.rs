//! Startup configuration errors.

/// Errors raised while loading or validating the harness configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A field holds a value the harness cannot run with
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Configuration key
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// The configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid YAML for the schema
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Create an invalid-value error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
