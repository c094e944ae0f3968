//! Reporting domain module.
//!
//! Turns failed operations into classified errors, suppresses floods of
//! identical errors, and hands the survivors to a presenter as a structured
//! log record plus a short notification with recovery suggestions.
//!
//! ## Architecture
//!
//! - `category.rs` - The fixed error taxonomy
//! - `classifier.rs` - Ordered keyword rules mapping a raw failure to a category
//! - `classified.rs` - `ClassifiedError` and conversions from path denials and I/O errors
//! - `messages.rs` - User-facing message and suggestion synthesis
//! - `aggregator.rs` - Time-windowed deduplication per `category:message` key
//! - `presenter.rs` - Presentation sinks (`tracing`, in-memory)
//! - `handler.rs` - The classify/aggregate/present pipeline

mod aggregator;
mod category;
mod classified;
mod classifier;
mod handler;
pub mod messages;
mod presenter;

pub use aggregator::{
    AggregateSummary, AggregationEntry, AggregationOutcome, ErrorAggregator, ErrorSnapshot,
};
pub use category::ErrorCategory;
pub use classified::{BoxedCause, ClassifiedError, ErrorContext, aggregation_key};
pub use classifier::classify;
pub use handler::ErrorHandler;
pub use messages::{security_message, suggestions, user_message};
pub use presenter::{LogRecord, MemoryPresenter, Notification, Presenter, TracingPresenter};
