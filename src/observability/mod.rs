//! Observability subsystem for stratify
//!
//! Structured JSON logging of a balancing invocation:
//! - typed lifecycle events
//! - begin/complete scopes
//!
//! # Principles
//!
//! 1. Observability is read-only and never alters a plan
//! 2. Logging is synchronous
//! 3. Output is deterministic for deterministic inputs
//!
//! # Usage
//!
//! ```ignore
//! use stratify::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::ProfileComplete, &[("levels", "3")]);
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

#[cfg(test)]
pub(crate) use logger::capture_lines;

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
