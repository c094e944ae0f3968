//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the guard:
//! platform conventions, path security, configuration, error handling and
//! logging setup.

pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod security;

pub use config::{Config, LoggingConfig, ReportingConfig};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use platform::{PathUtil, PlatformInfo, PlatformKind, platform_info};
pub use security::{
    PathSecurityError, PathValidator, ResourceLimits, SecurityPolicy, ValidationResult,
    validate_path,
};
