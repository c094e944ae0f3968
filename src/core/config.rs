//! Configuration management for the guard.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables, a JSON snapshot, or defaults. The
//! guard only consumes snapshots; persisting settings is the host's job.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{info, warn};

use super::error::{Error, Result};
use super::security::SecurityPolicy;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Path security policy.
    pub security: SecurityPolicy,

    /// Error reporting configuration.
    pub reporting: ReportingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_timestamps: true,
        }
    }
}

/// Error reporting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Window, in milliseconds, during which identical errors are coalesced.
    pub aggregation_window_ms: u64,

    /// Most distinct errors tracked at once; beyond this, errors are shown
    /// without deduplication.
    pub max_tracked_errors: usize,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            aggregation_window_ms: 5000,
            max_tracked_errors: 1000,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration snapshot from JSON. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `FSGUARD_`.
    /// List values are comma-separated. For example: `FSGUARD_LOG_LEVEL`,
    /// `FSGUARD_WORKSPACE_ROOT`, `FSGUARD_BLOCKED_PATHS`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(level) = std::env::var("FSGUARD_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(root) = std::env::var("FSGUARD_WORKSPACE_ROOT") {
            info!("Workspace root set to {}", root);
            config.security.workspace_root = root;
        }

        if let Some(subdirs) = env_list("FSGUARD_ALLOWED_SUBDIRECTORIES") {
            info!("Operations limited to subdirectories: {:?}", subdirs);
            config.security.allowed_subdirectories = subdirs;
        }

        if let Some(blocked) = env_list("FSGUARD_BLOCKED_PATHS") {
            config.security.blocked_paths = blocked;
        }

        if let Some(patterns) = env_list("FSGUARD_BLOCKED_PATTERNS") {
            config.security.blocked_patterns = patterns;
        }

        let limits = &mut config.security.limits;
        env_number("FSGUARD_MAX_FILE_SIZE", &mut limits.max_file_size);
        env_number("FSGUARD_MAX_BATCH_SIZE", &mut limits.max_batch_size);
        env_number(
            "FSGUARD_MAX_OPERATIONS_PER_MINUTE",
            &mut limits.max_operations_per_minute,
        );

        env_number(
            "FSGUARD_AGGREGATION_WINDOW_MS",
            &mut config.reporting.aggregation_window_ms,
        );
        env_number(
            "FSGUARD_MAX_TRACKED_ERRORS",
            &mut config.reporting.max_tracked_errors,
        );

        if config.security.workspace_root.contains(SecurityPolicy::WORKSPACE_PLACEHOLDER) {
            warn!(
                "Workspace root still contains {} - boundary checks stay disabled \
                 until the host resolves it",
                SecurityPolicy::WORKSPACE_PLACEHOLDER
            );
        }

        config
    }

    /// Reject values the guard cannot operate with.
    pub fn validate(&self) -> Result<()> {
        self.security.validate()?;

        if self.reporting.aggregation_window_ms == 0 {
            return Err(Error::config("aggregation window must be greater than zero"));
        }
        if self.reporting.max_tracked_errors == 0 {
            return Err(Error::config("max tracked errors must be greater than zero"));
        }

        Ok(())
    }
}

/// Read a comma-separated list, dropping blank items.
fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect()
    })
}

/// Overwrite `target` with a parsed variable; keep it on parse failure.
fn env_number<T: FromStr>(key: &str, target: &mut T) {
    let Ok(raw) = std::env::var(key) else {
        return;
    };

    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(_) => warn!("Ignoring {}={:?}: not a valid number", key, raw),
    }
}
