//! Segments reconstructed from start/finish events

use std::collections::hash_map::{self, HashMap};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Side of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Start,
    Finish,
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::Start => f.write_str("start"),
            Mark::Finish => f.write_str("finish"),
        }
    }
}

/// Why a segment has no duration
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentError {
    #[error("no {missing} observed")]
    Incomplete { missing: Mark },

    #[error("finish observed before start")]
    Inverted,
}

/// A named activity with its observed start and finish times
///
/// Either side may be missing: a segment whose finish never appeared is a
/// valid partial result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// `<type>:<tag>`
    pub name: String,
    /// Elapsed time of the last start line seen for this segment
    pub start: Option<Duration>,
    /// Elapsed time of the last finish line seen for this segment
    pub finish: Option<Duration>,
}

impl Segment {
    /// Create an empty segment
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: None,
            finish: None,
        }
    }

    /// Record a mark, replacing any earlier value for the same side
    pub fn mark(&mut self, mark: Mark, when: Duration) {
        match mark {
            Mark::Start => self.start = Some(when),
            Mark::Finish => self.finish = Some(when),
        }
    }

    /// Time from start to finish
    pub fn elapsed(&self) -> Result<Duration, SegmentError> {
        match (self.start, self.finish) {
            (Some(start), Some(finish)) => finish
                .checked_sub(start)
                .ok_or(SegmentError::Inverted),
            (None, _) => Err(SegmentError::Incomplete {
                missing: Mark::Start,
            }),
            (_, None) => Err(SegmentError::Incomplete {
                missing: Mark::Finish,
            }),
        }
    }

    /// Whether both sides have been observed
    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.finish.is_some()
    }
}

/// Segments keyed by name
///
/// Iteration order is unspecified; use [`SegmentTable::sorted`] for a stable
/// presentation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentTable {
    segments: HashMap<String, Segment>,
}

impl SegmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mark for `type_name:tag`, creating the segment if needed
    pub fn record(&mut self, type_name: &str, tag: &str, mark: Mark, when: Duration) {
        let name = format!("{type_name}:{tag}");
        self.segments
            .entry(name)
            .or_insert_with_key(|name| Segment::new(name.clone()))
            .mark(mark, when);
    }

    pub fn get(&self, name: &str) -> Option<&Segment> {
        self.segments.get(name)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> hash_map::Values<'_, String, Segment> {
        self.segments.values()
    }

    /// Segments ordered by start time, then by name
    ///
    /// Segments without a start sort after all started ones.
    pub fn sorted(&self) -> Vec<&Segment> {
        let mut segments: Vec<&Segment> = self.segments.values().collect();
        segments.sort_by(|a, b| {
            let key = |s: &Segment| (s.start.is_none(), s.start.or(s.finish));
            key(a).cmp(&key(b)).then_with(|| a.name.cmp(&b.name))
        });
        segments
    }

    pub fn into_map(self) -> HashMap<String, Segment> {
        self.segments
    }
}

impl IntoIterator for SegmentTable {
    type Item = (String, Segment);
    type IntoIter = hash_map::IntoIter<String, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}
