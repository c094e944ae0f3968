//! Error categories.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed taxonomy every failure is sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorCategory {
    /// Caller-correctable: bad path, missing file, permission.
    User,
    /// Environment or unexpected internal fault. The default bucket.
    System,
    /// Communication with an external worker or server.
    Network,
    /// Policy-boundary violation. Always surfaced.
    Security,
    /// Malformed or invalid settings.
    Configuration,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 5] = [
        Self::User,
        Self::System,
        Self::Network,
        Self::Security,
        Self::Configuration,
    ];

    /// Upper-case name used in log records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::System => "SYSTEM",
            Self::Network => "NETWORK",
            Self::Security => "SECURITY",
            Self::Configuration => "CONFIGURATION",
        }
    }

    /// Prefix for generic user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "Invalid operation",
            Self::System => "System error",
            Self::Network => "Network error",
            Self::Security => "Security error",
            Self::Configuration => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "system" => Ok(Self::System),
            "network" => Ok(Self::Network),
            "security" => Ok(Self::Security),
            "configuration" => Ok(Self::Configuration),
            _ => Err(format!("Unknown error category: {}", s)),
        }
    }
}
