//! Error handling pipeline: classify, aggregate, present.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::instrument;

use super::aggregator::{AggregateSummary, AggregationOutcome, ErrorAggregator};
use super::classified::ClassifiedError;
use super::messages::{suggestions, user_message};
use super::presenter::{LogRecord, Notification, Presenter, TracingPresenter};
use crate::core::config::ReportingConfig;

/// Entry point for every failed operation.
///
/// Shared across threads; the aggregation check-then-update runs under one
/// lock, and presentation happens after the lock is released.
pub struct ErrorHandler {
    aggregator: Mutex<ErrorAggregator>,
    presenter: Arc<dyn Presenter>,
}

impl std::fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("aggregator", &*self.aggregator.lock())
            .finish_non_exhaustive()
    }
}

impl ErrorHandler {
    /// Create a handler that presents through `presenter`.
    pub fn new(config: &ReportingConfig, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            aggregator: Mutex::new(ErrorAggregator::from_config(config)),
            presenter,
        }
    }

    /// Create a handler that presents through `tracing`.
    pub fn with_tracing(config: &ReportingConfig) -> Self {
        Self::new(config, Arc::new(TracingPresenter))
    }

    /// Handle an error now. Returns the notifications that were shown.
    pub fn handle(&self, error: impl Into<ClassifiedError>) -> Vec<Notification> {
        self.handle_at(error.into(), Utc::now())
    }

    /// Classify and handle an arbitrary failure now.
    pub fn handle_failure<E>(&self, error: E, name: Option<&str>) -> Vec<Notification>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.handle(ClassifiedError::from_error(error, name))
    }

    /// Handle an error at an explicit time.
    #[instrument(skip_all, fields(category = %error.category))]
    pub fn handle_at(&self, error: ClassifiedError, now: DateTime<Utc>) -> Vec<Notification> {
        let outcome = self.aggregator.lock().record(error, now);

        match outcome {
            AggregationOutcome::Emit(error) => vec![self.present_error(&error, now)],
            AggregationOutcome::Suppressed { .. } => Vec::new(),
            AggregationOutcome::FlushAndEmit { summary, error } => vec![
                self.present_summary(&summary, now),
                self.present_error(&error, now),
            ],
            AggregationOutcome::EvictAndEmit { summaries, error } => {
                let mut shown: Vec<Notification> = summaries
                    .iter()
                    .map(|summary| self.present_summary(summary, now))
                    .collect();
                shown.push(self.present_error(&error, now));
                shown
            }
        }
    }

    /// Present summaries for aggregates whose window has elapsed.
    pub fn flush_pending(&self, now: DateTime<Utc>) -> Vec<Notification> {
        let summaries = self.aggregator.lock().flush_expired(now);
        summaries
            .iter()
            .map(|summary| self.present_summary(summary, now))
            .collect()
    }

    /// Present summaries for every pending aggregate and clear all state.
    pub fn flush_all(&self) -> Vec<Notification> {
        let now = Utc::now();
        let summaries = self.aggregator.lock().flush_all();
        summaries
            .iter()
            .map(|summary| self.present_summary(summary, now))
            .collect()
    }

    /// Clear all state without presenting pending aggregates.
    pub fn dispose(&self) {
        self.aggregator.lock().dispose();
    }

    /// Number of aggregation keys currently tracked.
    pub fn pending_count(&self) -> usize {
        self.aggregator.lock().len()
    }

    fn present_error(&self, error: &ClassifiedError, now: DateTime<Utc>) -> Notification {
        self.presenter.log(&LogRecord::from_error(error, now));

        let notification = Notification {
            category: error.category,
            message: user_message(error),
            suggestions: suggestions(error.category, error.context.as_ref()),
        };
        self.presenter.notify(&notification);
        notification
    }

    fn present_summary(&self, summary: &AggregateSummary, now: DateTime<Utc>) -> Notification {
        self.presenter.log(&LogRecord::from_summary(summary, now));

        let notification = Notification {
            category: summary.category,
            message: summary.message.clone(),
            suggestions: suggestions(summary.category, summary.context.as_ref()),
        };
        self.presenter.notify(&notification);
        notification
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::with_tracing(&ReportingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::reporting::{ErrorCategory, MemoryPresenter};
    use chrono::TimeDelta;

    fn handler() -> (ErrorHandler, Arc<MemoryPresenter>) {
        let presenter = Arc::new(MemoryPresenter::new());
        let handler = ErrorHandler::new(&ReportingConfig::default(), presenter.clone());
        (handler, presenter)
    }

    fn test_error() -> ClassifiedError {
        ClassifiedError::new(ErrorCategory::System, "test error")
    }

    #[test]
    fn test_suppression_and_flush_scenario() {
        let (handler, presenter) = handler();
        let t0 = Utc::now();

        assert_eq!(handler.handle_at(test_error(), t0).len(), 1);
        assert!(
            handler
                .handle_at(test_error(), t0 + TimeDelta::milliseconds(50))
                .is_empty()
        );
        assert_eq!(presenter.notifications().len(), 1);

        let shown = handler.handle_at(test_error(), t0 + TimeDelta::milliseconds(6000));
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].message, "test error (occurred 2 times)");
        assert_eq!(shown[0].category, ErrorCategory::System);
        assert_eq!(shown[1].message, "System error: test error");
        assert_eq!(presenter.records().len(), 3);
        assert_eq!(handler.pending_count(), 1);
    }

    #[test]
    fn test_notification_has_message_and_suggestions() {
        let (handler, presenter) = handler();
        let error = ClassifiedError::new(ErrorCategory::Security, "blocked")
            .with_context("path", "/etc/passwd")
            .with_context("boundary", "/workspace");

        let shown = handler.handle(error);
        assert_eq!(shown.len(), 1);
        assert!(shown[0].message.contains("Access denied"));
        assert!(shown[0].suggestions.iter().any(|s| s.contains("/etc/passwd")));

        let record = &presenter.records()[0];
        assert_eq!(record.category, "SECURITY");
        assert_eq!(record.message, "blocked");
    }

    #[test]
    fn test_handle_failure_classifies() {
        let (handler, _) = handler();
        let shown = handler.handle_failure(
            std::io::Error::other("ECONNREFUSED: connection refused"),
            None,
        );
        assert_eq!(shown[0].category, ErrorCategory::Network);
    }

    #[test]
    fn test_flush_pending_and_dispose() {
        let (handler, _) = handler();
        let t0 = Utc::now();
        handler.handle_at(test_error(), t0);
        handler.handle_at(test_error(), t0 + TimeDelta::milliseconds(10));

        assert!(handler.flush_pending(t0 + TimeDelta::milliseconds(100)).is_empty());
        let flushed = handler.flush_pending(t0 + TimeDelta::milliseconds(5000));
        assert_eq!(flushed.len(), 1);
        assert_eq!(flushed[0].message, "test error (occurred 2 times)");

        handler.handle_at(test_error(), t0 + TimeDelta::milliseconds(6000));
        handler.handle_at(test_error(), t0 + TimeDelta::milliseconds(6010));
        handler.dispose();
        assert_eq!(handler.pending_count(), 0);
        assert!(handler.flush_all().is_empty());
    }

    #[test]
    fn test_full_map_presents_pending_summaries_before_new_error() {
        let presenter = Arc::new(MemoryPresenter::new());
        let config = ReportingConfig {
            aggregation_window_ms: 5000,
            max_tracked_errors: 1,
        };
        let handler = ErrorHandler::new(&config, presenter.clone());
        let t0 = Utc::now();

        handler.handle_at(test_error(), t0);
        handler.handle_at(test_error(), t0 + TimeDelta::milliseconds(10));

        let fresh = || ClassifiedError::new(ErrorCategory::User, "invalid path");
        let shown = handler.handle_at(fresh(), t0 + TimeDelta::milliseconds(7000));
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].message, "test error (occurred 2 times)");
        assert_eq!(shown[1].category, ErrorCategory::User);
        let records = presenter.records();
        assert_eq!(records[1].message, "test error (occurred 2 times)");
        assert_eq!(records[2].category, "USER");

        for offset in 1..10 {
            let later = t0 + TimeDelta::milliseconds(7000 + offset);
            assert!(handler.handle_at(fresh(), later).is_empty());
        }
        assert_eq!(presenter.notifications().len(), 3);
    }

    #[test]
    fn test_handler_is_shareable_across_threads() {
        let (handler, presenter) = handler();
        let handler = Arc::new(handler);

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let handler = handler.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        handler.handle(test_error());
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        // 100 identical errors well within one window: shown once.
        assert_eq!(presenter.notifications().len(), 1);
    }
}
