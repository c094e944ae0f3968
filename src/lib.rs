//! Filesystem Guard Library
//!
//! This crate is the trust boundary and failure-reporting layer for tools that
//! perform filesystem operations on behalf of an automated client. It decides
//! whether a proposed path may be touched, and turns any failure into a
//! classified, deduplicated, user-presentable error.
//!
//! # Architecture
//!
//! - **core**: Infrastructure: platform path conventions, the path security
//!   validator, configuration, error types and logging setup
//! - **domains**: Business logic organized by bounded contexts
//!   - **reporting**: Error classification, aggregation and presentation
//!
//! # Example
//!
//! ```rust,no_run
//! use fs_guard::core::{Config, PathValidator};
//! use fs_guard::domains::reporting::ErrorHandler;
//!
//! fn main() -> fs_guard::Result<()> {
//!     let config = Config::from_env();
//!     let policy = config.security.resolve_workspace("/home/dev/project");
//!     let validator = PathValidator::new(&policy)?;
//!     let errors = ErrorHandler::with_tracing(&config.reporting);
//!
//!     if let Err(denial) = validator.validate_operation("src/main.rs") {
//!         errors.handle(denial);
//!     }
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use crate::core::{Config, Error, PathValidator, Result, SecurityPolicy, ValidationResult};
pub use crate::domains::reporting::{ClassifiedError, ErrorCategory, ErrorHandler};
