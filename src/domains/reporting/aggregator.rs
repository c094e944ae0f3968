//! Time-windowed deduplication of identical errors.
//!
//! Each distinct `category:message` key moves through two states:
//!
//! - **Absent**: no entry. The next occurrence creates one (`count = 1`) and
//!   is emitted immediately.
//! - **Active**: an entry exists. A repeat less than one window after the
//!   entry's first occurrence is counted and suppressed. A repeat at or after
//!   the window closes the entry: if it counted more than one occurrence, a
//!   summary is flushed, and the new error starts a fresh entry.
//!
//! There is no timer. An entry that stops recurring keeps its count until
//! [`ErrorAggregator::flush_expired`] or [`ErrorAggregator::flush_all`] is
//! called, or until a new key arrives while the map is at capacity, which
//! closes every elapsed entry first. [`ErrorAggregator::dispose`] drops
//! pending entries without a summary.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, trace, warn};

use super::category::ErrorCategory;
use super::classified::{ClassifiedError, ErrorContext};
use crate::core::config::ReportingConfig;

/// The parts of an error kept for a later summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorSnapshot {
    pub category: ErrorCategory,
    pub message: String,
    pub context: Option<ErrorContext>,
}

impl From<&ClassifiedError> for ErrorSnapshot {
    fn from(error: &ClassifiedError) -> Self {
        Self {
            category: error.category,
            message: error.message.clone(),
            context: error.context.clone(),
        }
    }
}

/// State of one aggregation key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationEntry {
    pub count: u32,
    pub first_occurrence: DateTime<Utc>,
    pub last_occurrence: DateTime<Utc>,
    /// Most recently recorded occurrence.
    pub representative: ErrorSnapshot,
}

impl AggregationEntry {
    fn first(error: &ClassifiedError, now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            first_occurrence: now,
            last_occurrence: now,
            representative: error.into(),
        }
    }
}

/// A flushed aggregate, ready to present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub category: ErrorCategory,
    /// `"<message> (occurred N times)"`.
    pub message: String,
    pub count: u32,
    pub first_occurrence: DateTime<Utc>,
    pub last_occurrence: DateTime<Utc>,
    pub context: Option<ErrorContext>,
}

impl From<AggregationEntry> for AggregateSummary {
    fn from(entry: AggregationEntry) -> Self {
        Self {
            category: entry.representative.category,
            message: format!(
                "{} (occurred {} times)",
                entry.representative.message, entry.count
            ),
            count: entry.count,
            first_occurrence: entry.first_occurrence,
            last_occurrence: entry.last_occurrence,
            context: entry.representative.context,
        }
    }
}

/// What to present for one recorded error.
#[derive(Debug)]
pub enum AggregationOutcome {
    /// First occurrence (or untracked because the map is full). Present it.
    Emit(ClassifiedError),

    /// Repeat inside the window. Present nothing.
    Suppressed { count: u32 },

    /// The window had elapsed. Present the summary, then the error as a new
    /// first occurrence.
    FlushAndEmit {
        summary: AggregateSummary,
        error: ClassifiedError,
    },

    /// The map was full, so every elapsed entry was closed to make room.
    /// Present the summaries (oldest first), then the error.
    EvictAndEmit {
        summaries: Vec<AggregateSummary>,
        error: ClassifiedError,
    },
}

/// Per-key deduplication state.
#[derive(Debug)]
pub struct ErrorAggregator {
    window: TimeDelta,
    max_entries: usize,
    entries: HashMap<String, AggregationEntry>,
}

impl ErrorAggregator {
    pub const DEFAULT_WINDOW_MS: u64 = 5000;
    pub const DEFAULT_MAX_ENTRIES: usize = 1000;

    /// Create an aggregator with a window in milliseconds and a cap on the
    /// number of tracked keys.
    pub fn new(window_ms: u64, max_entries: usize) -> Self {
        let window_ms = i64::try_from(window_ms).unwrap_or(i64::MAX);
        Self {
            window: TimeDelta::milliseconds(window_ms),
            max_entries,
            entries: HashMap::new(),
        }
    }

    pub fn from_config(config: &ReportingConfig) -> Self {
        Self::new(config.aggregation_window_ms, config.max_tracked_errors)
    }

    pub fn window(&self) -> TimeDelta {
        self.window
    }

    /// Record one occurrence at time `now`.
    pub fn record(&mut self, error: ClassifiedError, now: DateTime<Utc>) -> AggregationOutcome {
        let key = error.aggregation_key();

        let mut evicted = Vec::new();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            evicted = self.flush_expired(now);
            if self.entries.len() >= self.max_entries {
                warn!(
                    tracked = self.entries.len(),
                    "Error aggregation map full; presenting error without deduplication"
                );
                return AggregationOutcome::Emit(error);
            }
            debug!(
                tracked = self.entries.len(),
                flushed = evicted.len(),
                "Closed elapsed aggregates to make room"
            );
        }

        match self.entries.entry(key) {
            Entry::Vacant(vacant) if !evicted.is_empty() => {
                vacant.insert(AggregationEntry::first(&error, now));
                AggregationOutcome::EvictAndEmit {
                    summaries: evicted,
                    error,
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(AggregationEntry::first(&error, now));
                AggregationOutcome::Emit(error)
            }
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();

                if now - entry.first_occurrence < self.window {
                    entry.count += 1;
                    entry.last_occurrence = now;
                    entry.representative = (&error).into();
                    trace!(key = %occupied.key(), count = occupied.get().count, "Suppressed repeated error");
                    return AggregationOutcome::Suppressed {
                        count: occupied.get().count,
                    };
                }

                let expired = occupied.insert(AggregationEntry::first(&error, now));
                if expired.count > 1 {
                    debug!(key = %occupied.key(), count = expired.count, "Flushing aggregated error");
                    AggregationOutcome::FlushAndEmit {
                        summary: expired.into(),
                        error,
                    }
                } else {
                    AggregationOutcome::Emit(error)
                }
            }
        }
    }

    /// Close every entry whose window has elapsed, returning summaries for
    /// those that counted repeats (oldest first).
    pub fn flush_expired(&mut self, now: DateTime<Utc>) -> Vec<AggregateSummary> {
        let window = self.window;
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| now - entry.first_occurrence >= window)
            .map(|(key, _)| key.clone())
            .collect();

        let closed = expired
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .collect();
        Self::summarize(closed)
    }

    /// Close every entry regardless of the window.
    pub fn flush_all(&mut self) -> Vec<AggregateSummary> {
        let closed = self.entries.drain().map(|(_, entry)| entry).collect();
        Self::summarize(closed)
    }

    /// Drop all state without emitting pending summaries.
    pub fn dispose(&mut self) {
        if !self.entries.is_empty() {
            debug!(pending = self.entries.len(), "Discarding pending error aggregates");
        }
        self.entries.clear();
    }

    /// Current state of a key, if tracked.
    pub fn entry(&self, category: ErrorCategory, message: &str) -> Option<&AggregationEntry> {
        self.entries
            .get(&super::classified::aggregation_key(category, message))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn summarize(mut closed: Vec<AggregationEntry>) -> Vec<AggregateSummary> {
        closed.retain(|entry| entry.count > 1);
        closed.sort_by_key(|entry| entry.first_occurrence);
        closed.into_iter().map(AggregateSummary::from).collect()
    }
}

impl Default for ErrorAggregator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW_MS, Self::DEFAULT_MAX_ENTRIES)
    }
}
