//! Boundary to the process-execution environment
//!
//! The runner does not build commands; it receives something that can be
//! started and yields its stdout and stderr as byte streams.

use crate::error::{RunError, Stream};
use std::io::Read;
use std::process::{Child, Command, Stdio};

/// Output streams of a started process, plus the caller's handle to it
pub struct Started<H> {
    pub stdout: Box<dyn Read + Send>,
    pub stderr: Box<dyn Read + Send>,
    /// Handed back to the caller once capture completes
    pub handle: H,
}

/// An unstarted, already-configured process
pub trait Process {
    /// What the caller gets back to manage the process after capture
    type Handle;

    /// Start the process and acquire its stdout and stderr streams
    fn start(self) -> Result<Started<Self::Handle>, RunError>;
}

impl Process for Command {
    type Handle = Child;

    fn start(mut self) -> Result<Started<Child>, RunError> {
        let program = self.get_program().to_string_lossy().into_owned();
        let mut child = self
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RunError::spawn(&program, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or(RunError::StreamUnavailable(Stream::Stdout))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(RunError::StreamUnavailable(Stream::Stderr))?;

        tracing::debug!(pid = child.id(), %program, "process started");

        Ok(Started {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            handle: child,
        })
    }
}
