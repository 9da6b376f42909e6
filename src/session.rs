//! One timed run: capture on a background thread, fold on the caller's

use crate::error::RunError;
use crate::event::Event;
use crate::process::Process;
use crate::runner::{RunOutcome, Runner};
use crate::segment::SegmentTable;
use crate::segmenter::Segmenter;
use crossbeam::channel;
use std::thread;

/// Segments found in one run, and how the run ended
#[derive(Debug)]
pub struct Measurement<H> {
    /// Complete table, or the partial one if capture failed
    pub segments: SegmentTable,
    pub outcome: Result<RunOutcome<H>, RunError>,
}

/// Run `process` under `runner` and fold its output with `segmenter`
///
/// The two sides are joined by a rendezvous channel, so a reader blocks until
/// the segmenter takes its line. `observe` sees every event before it is
/// folded, including a failure sentinel.
pub fn measure<P, F>(
    runner: &Runner,
    segmenter: &Segmenter,
    process: P,
    mut observe: F,
) -> Measurement<P::Handle>
where
    P: Process + Send,
    P::Handle: Send,
    F: FnMut(&Event),
{
    let (tx, rx) = channel::bounded(0);

    thread::scope(|scope| {
        let capture = scope.spawn(move || runner.run(process, tx));

        // Consuming the receiver drops it when collect returns, which
        // releases any reader still blocked on a send.
        let collected = segmenter.collect(rx.into_iter().inspect(|event| observe(event)));

        let outcome = capture
            .join()
            .unwrap_or_else(|payload| std::panic::resume_unwind(payload));

        let segments = match collected {
            Ok(table) => table,
            Err(interrupted) => interrupted.table,
        };

        Measurement { segments, outcome }
    })
}
