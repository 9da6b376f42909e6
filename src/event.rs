//! Timestamped lines of captured output

use crate::error::RunError;
use std::time::Duration;

/// A line seen on the child's stdout or stderr
///
/// An event either carries a captured line, or is the terminal sentinel of a
/// failed run, in which case `error` is set and `what` is empty.
#[derive(Debug, Clone)]
pub struct Event {
    /// Time between process start and the moment the line was read
    pub when: Duration,
    /// The line text, without its line terminator
    pub what: String,
    /// Failure that ended capture, if this is a sentinel
    pub error: Option<RunError>,
}

impl Event {
    /// Create a line event
    pub fn line(when: Duration, what: impl Into<String>) -> Self {
        Self {
            when,
            what: what.into(),
            error: None,
        }
    }

    /// Create a sentinel event reporting a capture failure
    pub fn failure(when: Duration, error: RunError) -> Self {
        Self {
            when,
            what: String::new(),
            error: Some(error),
        }
    }

    /// Whether this event is a failure sentinel
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
