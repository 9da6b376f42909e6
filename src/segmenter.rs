//! Folding an event feed into a segment table
//!
//! The [`Segmenter`] runs every line through its registered
//! [`SegmentDefinition`]s. A recognized start or finish sets that side of the
//! `type:tag` segment, overwriting any earlier value. Arrival order does not
//! matter, only the elapsed time carried by each event.

use crate::definition::SegmentDefinition;
use crate::error::RunError;
use crate::event::Event;
use crate::segment::{Mark, SegmentTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do when a line is recognized by more than one definition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Apply every matching definition (default)
    #[default]
    All,
    /// Apply only the first matching definition, in registration order
    First,
}

/// Collection stopped by an error event
///
/// Carries everything folded before the error arrived.
#[derive(Error, Debug)]
#[error("segment collection interrupted: {source}")]
pub struct Interrupted {
    /// Segments built from the events preceding the error
    pub table: SegmentTable,
    #[source]
    pub source: RunError,
}

/// Reconstructs segments from events using a set of definitions
#[derive(Default)]
pub struct Segmenter {
    definitions: Vec<Box<dyn SegmentDefinition>>,
    policy: MatchPolicy,
}

impl Segmenter {
    /// Create a segmenter with no definitions that applies all matches
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a segmenter with no definitions and the given match policy
    pub fn with_policy(policy: MatchPolicy) -> Self {
        Self {
            definitions: Vec::new(),
            policy,
        }
    }

    /// Register a definition; registration order is evaluation order
    pub fn add_definition(&mut self, definition: impl SegmentDefinition + 'static) {
        self.definitions.push(Box::new(definition));
    }

    pub fn definitions(&self) -> &[Box<dyn SegmentDefinition>] {
        &self.definitions
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Drain `events` into a segment table
    ///
    /// # Errors
    ///
    /// Stops at the first event carrying an error and returns it, together
    /// with the table built so far, without pulling further events.
    pub fn collect<I>(&self, events: I) -> Result<SegmentTable, Interrupted>
    where
        I: IntoIterator<Item = Event>,
    {
        let mut table = SegmentTable::new();

        for event in events {
            if let Some(source) = event.error {
                tracing::debug!(error = %source, segments = table.len(), "collection interrupted");
                return Err(Interrupted { table, source });
            }
            self.apply(&mut table, &event);
        }

        tracing::debug!(segments = table.len(), "collection complete");
        Ok(table)
    }

    fn apply(&self, table: &mut SegmentTable, event: &Event) {
        for def in &self.definitions {
            let hit = if let Some(tag) = def.is_start(&event.what) {
                Some((tag, Mark::Start))
            } else {
                def.is_finish(&event.what).map(|tag| (tag, Mark::Finish))
            };

            if let Some((tag, mark)) = hit {
                table.record(def.type_name(), tag, mark, event.when);
                if self.policy == MatchPolicy::First {
                    return;
                }
            }
        }
    }
}
