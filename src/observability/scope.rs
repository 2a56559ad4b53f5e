//! ObservationScope for automatic begin/complete logging
//!
//! - Logs `{name}_BEGIN` on creation
//! - Logs `{name}_COMPLETE` or `{name}_FAILED` when closed
//! - Warns with `{name}_INCOMPLETE` if dropped while still open

use std::cell::Cell;

use super::logger::Logger;

/// A scope that logs its own start and end
///
/// ```ignore
/// let scope = ObservationScope::with_fields("BALANCE", &[("source", "events")]);
/// // ... plan and materialize ...
/// scope.complete_with_fields(&[("rows", "75")]);
/// ```
pub struct ObservationScope<'a> {
    name: &'a str,
    completed: Cell<bool>,
    fields: Vec<(&'a str, String)>,
}

impl<'a> ObservationScope<'a> {
    pub fn new(name: &'a str) -> Self {
        Self::with_fields(name, &[])
    }

    /// Fields are repeated on the closing event
    pub fn with_fields(name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        let event = format!("{}_BEGIN", name);
        Logger::info(&event, fields);

        Self {
            name,
            completed: Cell::new(false),
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
        }
    }

    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    pub fn complete_with_fields(self, extra_fields: &[(&str, &str)]) {
        self.completed.set(true);
        let event = format!("{}_COMPLETE", self.name);

        let mut all_fields: Vec<(&str, &str)> =
            self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        all_fields.extend(extra_fields.iter().copied());

        Logger::info(&event, &all_fields);
    }

    /// Logs `{name}_FAILED` at ERROR with the reason
    pub fn fail(self, reason: &str) {
        self.completed.set(true);
        let event = format!("{}_FAILED", self.name);

        let mut all_fields: Vec<(&str, &str)> =
            self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        all_fields.push(("reason", reason));

        Logger::error(&event, &all_fields);
    }

    pub fn is_completed(&self) -> bool {
        self.completed.get()
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.completed.get() {
            let event = format!("{}_INCOMPLETE", self.name);
            Logger::warn(&event, &[("reason", "scope dropped without completion")]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::capture_lines;

    #[test]
    fn test_scope_complete() {
        let lines = capture_lines(|| {
            let scope = ObservationScope::with_fields("TEST", &[("source", "events")]);
            assert!(!scope.is_completed());
            scope.complete_with_fields(&[("rows", "75")]);
        });
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "TEST_BEGIN");
        assert_eq!(lines[0]["source"], "events");
        assert_eq!(lines[1]["event"], "TEST_COMPLETE");
        assert_eq!(lines[1]["severity"], "INFO");
        assert_eq!(lines[1]["source"], "events");
        assert_eq!(lines[1]["rows"], "75");
    }

    #[test]
    fn test_scope_fail_and_fields() {
        let lines = capture_lines(|| {
            let scope = ObservationScope::with_fields("TEST", &[("source", "events")]);
            scope.fail("bad spec");
        });
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["event"], "TEST_FAILED");
        assert_eq!(lines[1]["severity"], "ERROR");
        assert_eq!(lines[1]["source"], "events");
        assert_eq!(lines[1]["reason"], "bad spec");
    }

    #[test]
    fn test_scope_drop_without_completion() {
        let lines = capture_lines(|| {
            let scope = ObservationScope::new("TEST");
            drop(scope);
        });
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "TEST_BEGIN");
        assert_eq!(lines[1]["event"], "TEST_INCOMPLETE");
        assert_eq!(lines[1]["severity"], "WARN");
    }
}
