//! Timestamp and clock utilities
//!
//! Decision logic never reads the wall clock directly: it is handed a
//! timestamp by whoever drives it. [`Clock`] is the seam that lets the
//! session loop use the system clock while tests step time by hand.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Elapsed time between two timestamps.
///
/// Returns `None` when `later` precedes `earlier` (wall clock stepped back).
pub fn elapsed_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> Option<Duration> {
    later.signed_duration_since(earlier).to_std().ok()
}

/// Source of wall-clock time
pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        now()
    }
}

/// Manually advanced clock for deterministic tests and replays
///
/// Clones share the same underlying instant, so a test can keep one handle
/// and give another to the engine.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward by `step`
    pub fn advance(&self, step: Duration) {
        let delta = chrono::Duration::from_std(step).unwrap_or(chrono::Duration::zero());
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += delta;
    }

    /// Jump to an absolute instant (may move backwards)
    pub fn set(&self, instant: DateTime<Utc>) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}
