//! Error types for capture and segment definitions

use std::fmt;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Which standard stream of the child a reader is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdout => f.write_str("stdout"),
            Stream::Stderr => f.write_str("stderr"),
        }
    }
}

/// Failures while starting a process or capturing its output
///
/// Cloneable so the same error can ride in a sentinel [`crate::event::Event`]
/// and be returned from [`crate::runner::Runner::run`].
#[derive(Error, Debug, Clone)]
pub enum RunError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("No {0} pipe available from the started process")]
    StreamUnavailable(Stream),

    #[error("Failed to read {stream}: {source}")]
    Read {
        stream: Stream,
        #[source]
        source: Arc<io::Error>,
    },
}

impl RunError {
    pub(crate) fn spawn(program: impl Into<String>, source: io::Error) -> Self {
        RunError::Spawn {
            program: program.into(),
            source: Arc::new(source),
        }
    }

    pub(crate) fn read(stream: Stream, source: io::Error) -> Self {
        RunError::Read {
            stream,
            source: Arc::new(source),
        }
    }
}

/// Invalid segment definition
#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("Segment type name must not be empty")]
    EmptyTypeName,

    #[error("Invalid {which} pattern for segment type '{type_name}': {source}")]
    InvalidPattern {
        type_name: String,
        which: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error(
        "The {which} pattern for segment type '{type_name}' must have exactly one capture group, found {found}"
    )]
    CaptureGroups {
        type_name: String,
        which: &'static str,
        found: usize,
    },
}
