//! Observable events for a balancing invocation
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded and validated
    ConfigLoaded,

    // Pre-flight
    /// Request failed validation before any work
    PreflightRejected,

    // Profiling
    /// Frequency profile query issued
    ProfileStart,
    /// Frequency profile collected
    ProfileComplete,

    // Planning
    /// Balancing specification resolved
    SpecResolved,
    /// Per-level targets computed
    TargetsPlanned,
    /// Observed levels left out of the plan
    LevelsDropped,
    /// A sub-plan fragment was built
    FragmentBuilt,

    // Materialization
    /// Composed statement sent to the store
    MaterializeStart,
    /// Output table created
    MaterializeComplete,
    /// Store rejected the composed statement
    MaterializeFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::PreflightRejected => "PREFLIGHT_REJECTED",
            Event::ProfileStart => "PROFILE_START",
            Event::ProfileComplete => "PROFILE_COMPLETE",
            Event::SpecResolved => "SPEC_RESOLVED",
            Event::TargetsPlanned => "TARGETS_PLANNED",
            Event::LevelsDropped => "LEVELS_DROPPED",
            Event::FragmentBuilt => "FRAGMENT_BUILT",
            Event::MaterializeStart => "MATERIALIZE_START",
            Event::MaterializeComplete => "MATERIALIZE_COMPLETE",
            Event::MaterializeFailed => "MATERIALIZE_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::FragmentBuilt => Severity::Trace,
            Event::LevelsDropped => Severity::Warn,
            Event::PreflightRejected | Event::MaterializeFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::ProfileStart.as_str(), "PROFILE_START");
        assert_eq!(Event::LevelsDropped.to_string(), "LEVELS_DROPPED");
    }

    #[test]
    fn test_event_severities() {
        assert_eq!(Event::LevelsDropped.severity(), Severity::Warn);
        assert_eq!(Event::MaterializeFailed.severity(), Severity::Error);
        assert_eq!(Event::FragmentBuilt.severity(), Severity::Trace);
        assert_eq!(Event::TargetsPlanned.severity(), Severity::Info);
    }
}
