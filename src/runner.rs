//! Concurrent capture of a child's stdout and stderr
//!
//! [`Runner::run`] records the start instant, starts the process, then reads
//! both output streams on two scoped threads. Every line becomes an
//! [`Event`] stamped with the time elapsed since start, sent into a single
//! feed. The feed closes once both readers are done.
//!
//! # Design
//!
//! ```text
//!   child stdout ──► reader thread ──┐
//!                                    ├──► Sender<Event> ──► consumer
//!   child stderr ──► reader thread ──┘   (bounded, blocking)
//! ```
//!
//! Within a stream, order is preserved and timestamps never decrease. The two
//! streams interleave in whatever order the readers happen to send.

use crate::clock::{Clock, SystemClock};
use crate::error::{RunError, Stream};
use crate::event::Event;
use crate::process::{Process, Started};
use crossbeam::channel::Sender;
use std::io::{BufRead, BufReader, Read};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a completed capture
#[derive(Debug)]
pub struct RunOutcome<H> {
    /// The process handle, for the caller to wait on or inspect
    pub handle: H,
    /// Number of line events delivered to the feed
    pub lines: usize,
}

/// Runs a process and turns its output lines into timestamped events
pub struct Runner {
    clock: Arc<dyn Clock>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl Runner {
    /// Create a runner reading time from `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Start `process` and relay each line of its output into `sink`
    ///
    /// Blocks until both output streams reach end-of-stream (or fail). The
    /// sink is consumed and therefore closed when this returns, after both
    /// readers have finished.
    ///
    /// # Errors
    ///
    /// If the process cannot be started or a stream cannot be acquired, a
    /// single failure event is sent and the error is returned; no line events
    /// are produced. If reading fails, the first reader to fail sends one
    /// failure event after its last line, both readers stop, and that error
    /// is returned. A run never sends more than one failure event.
    pub fn run<P: Process>(
        &self,
        process: P,
        sink: Sender<Event>,
    ) -> Result<RunOutcome<P::Handle>, RunError> {
        let start = self.clock.now();

        let Started {
            stdout,
            stderr,
            handle,
        } = match process.start() {
            Ok(started) => started,
            Err(err) => {
                tracing::warn!(error = %err, "capture aborted before start");
                // Nobody listening is fine; the error is also returned
                let _ = sink.send(Event::failure(Duration::ZERO, err.clone()));
                return Err(err);
            }
        };

        let feed = Feed::new(sink);
        let lines = thread::scope(|scope| {
            let out = scope.spawn(|| self.relay(Stream::Stdout, stdout, start, &feed));
            let err = scope.spawn(|| self.relay(Stream::Stderr, stderr, start, &feed));
            join(out) + join(err)
        });
        tracing::debug!(lines, "capture complete");

        match feed.close() {
            Some(err) => Err(err),
            None => Ok(RunOutcome { handle, lines }),
        }
    }

    /// Read `source` line by line, sending one event per line
    ///
    /// Returns the number of lines delivered.
    fn relay(
        &self,
        stream: Stream,
        source: Box<dyn Read + Send>,
        start: Instant,
        feed: &Feed,
    ) -> usize {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        let mut lines = 0;
        let mut last = Duration::ZERO;

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => {
                    tracing::debug!(%stream, lines, "end of stream");
                    return lines;
                }
                Ok(_) => {
                    let when = self.clock.now().saturating_duration_since(start);
                    last = when;
                    if !feed.line(Event::line(when, decode_line(&buf))) {
                        tracing::debug!(%stream, lines, "event feed closed, reader stopping");
                        return lines;
                    }
                    lines += 1;
                }
                Err(e) => {
                    let err = RunError::read(stream, e);
                    tracing::warn!(%stream, error = %err, "stream read failed");
                    feed.fail(last, err);
                    return lines;
                }
            }
        }
    }
}

/// Send side of the event feed, shared by both readers
///
/// The first reported failure closes the feed to everything else, so its
/// sentinel is always the last event.
struct Feed {
    sink: Sender<Event>,
    failure: Mutex<Option<RunError>>,
}

impl Feed {
    fn new(sink: Sender<Event>) -> Self {
        Self {
            sink,
            failure: Mutex::new(None),
        }
    }

    fn failure(&self) -> MutexGuard<'_, Option<RunError>> {
        self.failure.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send a line event; false once the consumer hung up or a failure was reported
    fn line(&self, event: Event) -> bool {
        let failure = self.failure();
        failure.is_none() && self.sink.send(event).is_ok()
    }

    /// Record `err` and send its sentinel, unless a failure is already recorded
    fn fail(&self, when: Duration, err: RunError) {
        let mut failure = self.failure();
        if failure.is_some() {
            tracing::debug!(error = %err, "failure already reported, dropping");
            return;
        }
        // Nobody listening is fine; the error is also returned from run
        let _ = self.sink.send(Event::failure(when, err.clone()));
        *failure = Some(err);
    }

    /// Close the feed, yielding the failure that ended the run, if any
    fn close(self) -> Option<RunError> {
        self.failure
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
}

/// Strip the line terminator and decode, replacing invalid UTF-8
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ScriptedClock;
    use crossbeam::channel;
    use std::io::{self, Cursor};

    /// In-memory process with fixed stream contents
    struct CannedProcess {
        stdout: &'static [u8],
        stderr: &'static [u8],
    }

    impl Process for CannedProcess {
        type Handle = ();

        fn start(self) -> Result<Started<()>, RunError> {
            Ok(Started {
                stdout: Box::new(Cursor::new(self.stdout)),
                stderr: Box::new(Cursor::new(self.stderr)),
                handle: (),
            })
        }
    }

    struct BrokenPipe;

    impl Read for BrokenPipe {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe went away"))
        }
    }

    fn collect_run<P: Process>(
        runner: &Runner,
        process: P,
    ) -> (Vec<Event>, Result<RunOutcome<P::Handle>, RunError>)
    where
        P: Send,
        P::Handle: Send,
    {
        let (tx, rx) = channel::bounded(0);
        thread::scope(|scope| {
            let run = scope.spawn(|| runner.run(process, tx));
            let events: Vec<Event> = rx.iter().collect();
            (events, run.join().unwrap())
        })
    }

    #[test]
    fn test_decode_line_strips_terminators() {
        assert_eq!(decode_line(b"hello\n"), "hello");
        assert_eq!(decode_line(b"hello\r\n"), "hello");
        assert_eq!(decode_line(b"no newline"), "no newline");
        assert_eq!(decode_line(b"\n"), "");
    }

    #[test]
    fn test_decode_line_lossy_utf8() {
        assert_eq!(decode_line(b"bad \xff byte\n"), "bad \u{fffd} byte");
    }

    #[test]
    fn test_run_stamps_lines_from_clock() {
        let clock = ScriptedClock::from_offsets(&[
            Duration::ZERO,
            Duration::from_secs(10),
            Duration::from_secs(20),
        ]);
        let runner = Runner::new(Arc::new(clock));
        let process = CannedProcess {
            stdout: b"Line 1\nLine 2",
            stderr: b"",
        };

        let (events, outcome) = collect_run(&runner, process);

        assert_eq!(outcome.unwrap().lines, 2);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].when, Duration::from_secs(10));
        assert_eq!(events[0].what, "Line 1");
        assert_eq!(events[1].when, Duration::from_secs(20));
        assert_eq!(events[1].what, "Line 2");
    }

    #[test]
    fn test_run_merges_both_streams() {
        let runner = Runner::default();
        let process = CannedProcess {
            stdout: b"a\nb\nc\n",
            stderr: b"x\ny\n",
        };

        let (events, outcome) = collect_run(&runner, process);

        assert_eq!(outcome.unwrap().lines, 5);
        let mut texts: Vec<&str> = events.iter().map(|e| e.what.as_str()).collect();
        texts.sort_unstable();
        assert_eq!(texts, ["a", "b", "c", "x", "y"]);
    }

    #[test]
    fn test_run_setup_failure_sends_single_sentinel() {
        struct Unstartable;
        impl Process for Unstartable {
            type Handle = ();
            fn start(self) -> Result<Started<()>, RunError> {
                Err(RunError::StreamUnavailable(Stream::Stdout))
            }
        }

        let clock = ScriptedClock::from_offsets(&[Duration::ZERO]);
        let runner = Runner::new(Arc::new(clock));

        let (events, outcome) = collect_run(&runner, Unstartable);

        assert!(matches!(
            outcome,
            Err(RunError::StreamUnavailable(Stream::Stdout))
        ));
        assert_eq!(events.len(), 1);
        assert!(events[0].is_failure());
    }

    #[test]
    fn test_run_read_failure_sends_sentinel() {
        struct HalfBroken;
        impl Process for HalfBroken {
            type Handle = ();
            fn start(self) -> Result<Started<()>, RunError> {
                Ok(Started {
                    stdout: Box::new(Cursor::new(&b"fine\n"[..])),
                    stderr: Box::new(BrokenPipe),
                    handle: (),
                })
            }
        }

        let (events, outcome) = collect_run(&Runner::default(), HalfBroken);

        match outcome {
            Err(RunError::Read { stream, .. }) => assert_eq!(stream, Stream::Stderr),
            other => panic!("expected read error, got {other:?}"),
        }
        // stdout may or may not get its line in before the failure closes the feed
        assert_eq!(events.iter().filter(|e| e.is_failure()).count(), 1);
        assert!(events.last().unwrap().is_failure());
        assert!(events.len() <= 2);
    }

    #[test]
    fn test_run_lines_then_sentinel_on_same_stream() {
        struct FailsAfter(&'static [u8]);
        impl Read for FailsAfter {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0.is_empty() {
                    return Err(io::Error::other("device gone"));
                }
                self.0.read(buf)
            }
        }

        struct Truncated;
        impl Process for Truncated {
            type Handle = ();
            fn start(self) -> Result<Started<()>, RunError> {
                Ok(Started {
                    stdout: Box::new(FailsAfter(b"a\nb\n")),
                    stderr: Box::new(Cursor::new(&b""[..])),
                    handle: (),
                })
            }
        }

        let clock = ScriptedClock::from_offsets(&[
            Duration::ZERO,
            Duration::from_secs(1),
            Duration::from_secs(2),
        ]);
        let runner = Runner::new(Arc::new(clock));

        let (events, outcome) = collect_run(&runner, Truncated);

        match outcome {
            Err(RunError::Read { stream, .. }) => assert_eq!(stream, Stream::Stdout),
            other => panic!("expected stdout read error, got {other:?}"),
        }
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].what, "a");
        assert_eq!(events[0].when, Duration::from_secs(1));
        assert_eq!(events[1].what, "b");
        assert_eq!(events[1].when, Duration::from_secs(2));
        assert!(events[2].is_failure());
        assert_eq!(events[2].when, Duration::from_secs(2));
    }

    #[test]
    fn test_run_both_streams_fail_single_sentinel() {
        struct AllBroken;
        impl Process for AllBroken {
            type Handle = ();
            fn start(self) -> Result<Started<()>, RunError> {
                Ok(Started {
                    stdout: Box::new(BrokenPipe),
                    stderr: Box::new(BrokenPipe),
                    handle: (),
                })
            }
        }

        for _ in 0..20 {
            let (events, outcome) = collect_run(&Runner::default(), AllBroken);

            let returned = match outcome {
                Err(err @ RunError::Read { .. }) => err,
                other => panic!("expected read error, got {other:?}"),
            };
            assert_eq!(events.len(), 1);
            let sentinel = events[0].error.as_ref().unwrap();
            assert_eq!(sentinel.to_string(), returned.to_string());
        }
    }

    #[test]
    fn test_run_stops_when_consumer_hangs_up() {
        let runner = Runner::default();
        let process = CannedProcess {
            stdout: b"1\n2\n3\n",
            stderr: b"",
        };
        let (tx, rx) = channel::bounded(0);
        drop(rx);

        let outcome = runner.run(process, tx).unwrap();
        assert_eq!(outcome.lines, 0);
    }
}
