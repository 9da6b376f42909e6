//! Time source for event timestamps
//!
//! The runner never calls `Instant::now()` directly; it asks an injected
//! [`Clock`]. Production code uses [`SystemClock`], tests script the exact
//! instants they expect with [`ScriptedClock`].

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Capability providing the current instant
pub trait Clock: Send + Sync {
    /// Return the current instant
    fn now(&self) -> Instant;
}

/// Clock backed by the monotonic system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that replays a fixed sequence of instants
///
/// Each call to [`Clock::now`] returns the next scripted instant. Querying it
/// more times than scripted panics, so a test that mis-predicts how often the
/// clock is read fails immediately.
///
/// # Example
///
/// ```
/// use eggtimer::clock::{Clock, ScriptedClock};
/// use std::time::Duration;
///
/// let clock = ScriptedClock::from_offsets(&[Duration::ZERO, Duration::from_secs(10)]);
/// let t0 = clock.now();
/// let t1 = clock.now();
/// assert_eq!(t1 - t0, Duration::from_secs(10));
/// ```
#[derive(Debug)]
pub struct ScriptedClock {
    points: Vec<Instant>,
    cursor: Mutex<usize>,
}

impl ScriptedClock {
    /// Create a clock returning `points` in order
    pub fn new(points: Vec<Instant>) -> Self {
        Self {
            points,
            cursor: Mutex::new(0),
        }
    }

    /// Create a clock whose instants are `offsets` past a common base instant
    pub fn from_offsets(offsets: &[Duration]) -> Self {
        let base = Instant::now();
        Self::new(offsets.iter().map(|offset| base + *offset).collect())
    }

    /// Number of scripted instants not yet handed out
    pub fn remaining(&self) -> usize {
        let cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        self.points.len().saturating_sub(*cursor)
    }
}

impl Clock for ScriptedClock {
    fn now(&self) -> Instant {
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        let Some(point) = self.points.get(*cursor).copied() else {
            panic!(
                "ScriptedClock queried {} times but only {} instants were scripted",
                *cursor + 1,
                self.points.len()
            );
        };
        *cursor += 1;
        point
    }
}
