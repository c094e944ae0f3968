//! Classified error type.

use serde_json::Value;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeMap;
use std::io;

use super::category::ErrorCategory;
use super::classifier::classify;
use crate::core::error::Error as CoreError;
use crate::core::security::PathSecurityError;

/// Structured details attached to an error (e.g. `path`, `boundary`, `pattern`).
pub type ErrorContext = BTreeMap<String, Value>;

/// Boxed original failure kept as the error source.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failure that has been assigned a category.
///
/// Created once per failed operation and handed to the
/// [`ErrorHandler`](super::ErrorHandler), which consumes it.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub message: String,
    pub context: Option<ErrorContext>,
    #[source]
    pub cause: Option<BoxedCause>,
    pub stack: Option<String>,
}

impl ClassifiedError {
    /// Create an error with an explicit category.
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            context: None,
            cause: None,
            stack: None,
        }
    }

    /// Create an error whose category is derived from its message and name.
    pub fn classify(message: impl Into<String>, name: Option<&str>) -> Self {
        let message = message.into();
        let category = classify(&message, name);
        Self::new(category, message)
    }

    /// Wrap an arbitrary failure, classifying it by its display text.
    pub fn from_error<E>(error: E, name: Option<&str>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::classify(error.to_string(), name).with_cause(error)
    }

    /// Wrap an I/O failure.
    ///
    /// The message is prefixed with the errno-style code for the error kind
    /// (`ENOENT`, `EACCES`, ...) and connection-level kinds are named as
    /// network errors, so classification and message synthesis see the same
    /// vocabulary on every platform.
    pub fn from_io(error: io::Error) -> Self {
        let message = match errno_code(error.kind()) {
            Some(code) => format!("{code}: {error}"),
            None => error.to_string(),
        };
        let name = is_network_kind(error.kind()).then_some("NetworkError");

        Self::classify(message, name).with_cause(error)
    }

    /// Attach one context value.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context
            .get_or_insert_with(ErrorContext::new)
            .insert(key.into(), value.into());
        self
    }

    /// Attach the original failure.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Attach a stack trace.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Capture the current backtrace if backtraces are enabled
    /// (`RUST_BACKTRACE`/`RUST_LIB_BACKTRACE`).
    pub fn capture_stack(mut self) -> Self {
        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            self.stack = Some(backtrace.to_string());
        }
        self
    }

    /// String value of a context entry.
    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.as_ref()?.get(key)?.as_str()
    }

    /// Key under which identical errors are aggregated.
    pub fn aggregation_key(&self) -> String {
        aggregation_key(self.category, &self.message)
    }
}

/// Aggregation key for a category and message.
pub fn aggregation_key(category: ErrorCategory, message: &str) -> String {
    format!("{}:{}", category, message)
}

fn errno_code(kind: io::ErrorKind) -> Option<&'static str> {
    use io::ErrorKind::*;

    let code = match kind {
        NotFound => "ENOENT",
        PermissionDenied => "EACCES",
        AlreadyExists => "EEXIST",
        NotADirectory => "ENOTDIR",
        IsADirectory => "EISDIR",
        DirectoryNotEmpty => "ENOTEMPTY",
        StorageFull => "ENOSPC",
        OutOfMemory => "ENOMEM",
        ConnectionRefused => "ECONNREFUSED",
        ConnectionReset => "ECONNRESET",
        ConnectionAborted => "ECONNABORTED",
        TimedOut => "ETIMEDOUT",
        _ => return None,
    };
    Some(code)
}

fn is_network_kind(kind: io::ErrorKind) -> bool {
    use io::ErrorKind::*;

    matches!(
        kind,
        ConnectionRefused
            | ConnectionReset
            | ConnectionAborted
            | NotConnected
            | AddrInUse
            | AddrNotAvailable
            | BrokenPipe
            | TimedOut
            | HostUnreachable
            | NetworkUnreachable
            | NetworkDown
    )
}

impl From<PathSecurityError> for ClassifiedError {
    fn from(error: PathSecurityError) -> Self {
        let mut classified = Self::new(ErrorCategory::Security, error.to_string())
            .with_context("path", error.path());

        if let Some(boundary) = error.boundary() {
            classified = classified.with_context("boundary", boundary);
        }
        if let Some(pattern) = error.pattern() {
            classified = classified.with_context("pattern", pattern);
        }
        if let PathSecurityError::OutsideAllowedSubdirectories { allowed, .. } = &error {
            classified = classified.with_context("allowedSubdirectories", allowed.clone());
        }

        classified.with_cause(error)
    }
}

impl From<CoreError> for ClassifiedError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Config(_) | CoreError::InvalidPattern { .. } => {
                Self::new(ErrorCategory::Configuration, error.to_string()).with_cause(error)
            }
            other => Self::from_error(other, None),
        }
    }
}

impl From<io::Error> for ClassifiedError {
    fn from(error: io::Error) -> Self {
        Self::from_io(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_security_denial_carries_context() {
        let denial = PathSecurityError::OutsideBoundary {
            path: "/etc/passwd".to_string(),
            boundary: "/workspace".to_string(),
        };
        let error = ClassifiedError::from(denial);

        assert_eq!(error.category, ErrorCategory::Security);
        assert_eq!(error.context_str("path"), Some("/etc/passwd"));
        assert_eq!(error.context_str("boundary"), Some("/workspace"));
        assert_eq!(error.context_str("pattern"), None);
        assert!(error.source().is_some());
    }

    #[test]
    fn test_blocked_pattern_context() {
        let error = ClassifiedError::from(PathSecurityError::BlockedPattern {
            path: "a/key.pem".to_string(),
            pattern: "*.pem".to_string(),
        });
        assert_eq!(error.context_str("pattern"), Some("*.pem"));
        assert_eq!(error.context_str("boundary"), None);
    }

    #[test]
    fn test_from_io_prefixes_errno_code() {
        let error = ClassifiedError::from_io(io::Error::new(io::ErrorKind::NotFound, "missing.txt"));
        assert_eq!(error.message, "ENOENT: missing.txt");
        assert_eq!(error.category, ErrorCategory::User);

        let refused = ClassifiedError::from_io(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert_eq!(refused.category, ErrorCategory::Network);

        let timed_out = ClassifiedError::from_io(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert_eq!(timed_out.category, ErrorCategory::Network);

        let full = ClassifiedError::from_io(io::Error::new(io::ErrorKind::StorageFull, "disk"));
        assert_eq!(full.category, ErrorCategory::System);
        assert!(full.message.starts_with("ENOSPC"));
    }

    #[test]
    fn test_core_errors_are_configuration() {
        let error = ClassifiedError::from(CoreError::config("maxBatchSize must be greater than zero"));
        assert_eq!(error.category, ErrorCategory::Configuration);
    }

    #[test]
    fn test_builders_and_key() {
        let error = ClassifiedError::classify("test error", None)
            .with_context("attempt", 2)
            .with_stack("at main");

        assert_eq!(error.category, ErrorCategory::System);
        assert_eq!(error.aggregation_key(), "SYSTEM:test error");
        assert_eq!(error.context.as_ref().unwrap()["attempt"], 2);
        assert_eq!(error.stack.as_deref(), Some("at main"));
        assert_eq!(error.to_string(), "test error");
    }
}
