//! Presentation sinks for classified errors.
//!
//! The guard decides *what* to present; a [`Presenter`] decides how. Hosts
//! implement the trait to route notifications to their UI and log records to
//! their log channel.

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use tracing::{error, info, warn};

use super::aggregator::AggregateSummary;
use super::category::ErrorCategory;
use super::classified::{ClassifiedError, ErrorContext};

/// Short message for interactive display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Structured log line for one presented error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    /// ISO-8601 timestamp.
    pub timestamp: String,
    /// Upper-case category name.
    pub category: String,
    pub message: String,
    /// JSON-serialized context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause_stack: Option<String>,
}

fn serialize_context(context: Option<&ErrorContext>) -> Option<String> {
    context
        .filter(|ctx| !ctx.is_empty())
        .and_then(|ctx| serde_json::to_string(ctx).ok())
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl LogRecord {
    /// Record for an error presented at `at`.
    pub fn from_error(error: &ClassifiedError, at: DateTime<Utc>) -> Self {
        let cause = error.cause.as_deref();

        Self {
            timestamp: format_timestamp(at),
            category: error.category.as_str().to_string(),
            message: error.message.clone(),
            context: serialize_context(error.context.as_ref()),
            stack: error.stack.clone(),
            cause_message: cause.map(|c| c.to_string()),
            cause_stack: cause
                .and_then(|c| c.downcast_ref::<ClassifiedError>())
                .and_then(|c| c.stack.clone()),
        }
    }

    /// Record for a flushed aggregate presented at `at`.
    pub fn from_summary(summary: &AggregateSummary, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: format_timestamp(at),
            category: summary.category.as_str().to_string(),
            message: summary.message.clone(),
            context: serialize_context(summary.context.as_ref()),
            stack: None,
            cause_message: None,
            cause_stack: None,
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] [{}] {}", self.timestamp, self.category, self.message)?;
        if let Some(context) = &self.context {
            write!(f, "\nContext: {context}")?;
        }
        if let Some(stack) = &self.stack {
            write!(f, "\nStack: {stack}")?;
        }
        if let Some(cause) = &self.cause_message {
            write!(f, "\nCaused by: {cause}")?;
        }
        if let Some(stack) = &self.cause_stack {
            write!(f, "\n{stack}")?;
        }
        Ok(())
    }
}

/// Destination for presented errors.
pub trait Presenter: Send + Sync {
    /// Write the structured log record.
    fn log(&self, record: &LogRecord);

    /// Show the user-facing notification.
    fn notify(&self, notification: &Notification);
}

/// Presenter that writes everything through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn log(&self, record: &LogRecord) {
        match record.category.as_str() {
            "SECURITY" | "SYSTEM" => error!(target: "fs_guard::errors", "{}", record),
            _ => warn!(target: "fs_guard::errors", "{}", record),
        }
    }

    fn notify(&self, notification: &Notification) {
        info!(
            target: "fs_guard::notifications",
            category = %notification.category,
            suggestions = ?notification.suggestions,
            "{}",
            notification.message
        );
    }
}

/// Presenter that keeps everything in memory, for tests and for hosts that
/// poll instead of receiving callbacks.
#[derive(Debug, Default)]
pub struct MemoryPresenter {
    records: Mutex<Vec<LogRecord>>,
    notifications: Mutex<Vec<Notification>>,
}

impl MemoryPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
        self.notifications.lock().clear();
    }
}

impl Presenter for MemoryPresenter {
    fn log(&self, record: &LogRecord) {
        self.records.lock().push(record.clone());
    }

    fn notify(&self, notification: &Notification) {
        self.notifications.lock().push(notification.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::security::PathSecurityError;

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_123).unwrap()
    }

    #[test]
    fn test_log_record_fields() {
        let error = ClassifiedError::from(PathSecurityError::BlockedPath {
            path: ".git/config".to_string(),
            entry: ".git".to_string(),
        })
        .with_stack("frame 0");

        let record = LogRecord::from_error(&error, at());
        assert_eq!(record.timestamp, "2023-11-14T22:13:20.123Z");
        assert_eq!(record.category, "SECURITY");
        assert_eq!(
            record.context.as_deref(),
            Some(r#"{"path":".git/config","pattern":".git"}"#)
        );
        assert_eq!(record.stack.as_deref(), Some("frame 0"));
        assert!(record.cause_message.as_deref().unwrap().contains("blocked directory"));
    }

    #[test]
    fn test_cause_stack_from_nested_classified_error() {
        let inner = ClassifiedError::classify("connection lost", None).with_stack("inner frame");
        let outer = ClassifiedError::classify("sync failed", None).with_cause(inner);

        let record = LogRecord::from_error(&outer, at());
        assert_eq!(record.cause_message.as_deref(), Some("connection lost"));
        assert_eq!(record.cause_stack.as_deref(), Some("inner frame"));
    }

    #[test]
    fn test_display_includes_optional_sections() {
        let bare = LogRecord::from_error(&ClassifiedError::classify("boom", None), at());
        assert_eq!(bare.to_string(), "[2023-11-14T22:13:20.123Z] [SYSTEM] boom");

        let rich = ClassifiedError::classify("boom", None)
            .with_context("path", "/tmp/x")
            .with_cause(std::io::Error::other("disk on fire"));
        let text = LogRecord::from_error(&rich, at()).to_string();
        assert!(text.contains("\nContext: {\"path\":\"/tmp/x\"}"));
        assert!(text.contains("\nCaused by: disk on fire"));
    }

    #[test]
    fn test_memory_presenter_collects() {
        let presenter = MemoryPresenter::new();
        presenter.notify(&Notification {
            category: ErrorCategory::User,
            message: "hello".to_string(),
            suggestions: vec![],
        });
        assert_eq!(presenter.notifications().len(), 1);
        presenter.clear();
        assert!(presenter.notifications().is_empty());
    }
}
