//! # Error Handling
//!
//! Error types shared across the application. Module-specific failures live
//! next to the code that raises them:
//! - [`crate::audio::wav::HeaderError`] for container synthesis
//! - [`crate::synthesis::SynthesisError`] for the remote call
//! - [`crate::synthesis::DeliveryError`] for a whole delivery attempt
//!
//! Startup problems are reported as [`ConfigError`] and end the process before
//! any input line is touched.

use thiserror::Error;

/// Configuration problems detected while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting has no value
    #[error("{what} not found. Please set {env_var} in your environment.")]
    Missing {
        what: &'static str,
        env_var: &'static str,
    },

    /// A setting has a value that cannot be used
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },

    /// The layered config sources could not be read or merged
    #[error("Configuration error: {0}")]
    Source(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Shorthand for results that fail with a [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_message_names_variable() {
        let err = ConfigError::Missing {
            what: "API key",
            env_var: "ELEVENLABS_API_KEY",
        };
        assert_eq!(
            err.to_string(),
            "API key not found. Please set ELEVENLABS_API_KEY in your environment."
        );
    }

    #[test]
    fn test_invalid_message() {
        let err = ConfigError::invalid("batch.retry_count", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "Invalid value for batch.retry_count: must be at least 1"
        );
    }
}
