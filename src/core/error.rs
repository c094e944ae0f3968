//! Error types and handling for the guard.
//!
//! This module defines the crate-level error type for failures that are not
//! path denials: bad configuration, unparseable snapshots and invalid blocked
//! patterns. Path denials have their own type,
//! [`PathSecurityError`](crate::core::security::PathSecurityError).

use thiserror::Error;

/// A specialized Result type for guard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the guard.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A blocked pattern could not be compiled into a matcher.
    #[error("Invalid blocked pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new invalid-pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config = Error::config("aggregation window must be greater than zero");
        assert_eq!(
            config.to_string(),
            "Invalid configuration: aggregation window must be greater than zero"
        );

        let regex_err = regex::Regex::new("(").unwrap_err();
        let pattern = Error::invalid_pattern("(", regex_err);
        assert!(pattern.to_string().starts_with("Invalid blocked pattern '('"));
        assert!(std::error::Error::source(&pattern).is_some());

        let json: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(json, Error::Json(_)));
    }
}
