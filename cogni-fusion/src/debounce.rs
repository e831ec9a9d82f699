//! Debounce state machine
//!
//! [`FusionState`] is the only state that survives between cycles. It holds
//! the committed tier and when it was committed, and decides whether a new
//! candidate may replace it. A candidate arriving inside the debounce
//! interval is dropped outright (not queued), and the timestamp is left
//! alone so an oscillating input cannot extend the hold indefinitely.

use std::time::Duration;

use chrono::{DateTime, Utc};
use cogni_common::time::elapsed_between;
use cogni_common::SafetyTier;

/// Default minimum dwell time between committed changes
pub const DEFAULT_DEBOUNCE_INTERVAL: Duration = Duration::from_secs(2);

/// Result of offering a candidate tier to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Candidate equals the committed tier
    Unchanged,
    /// Candidate differs but arrived inside the debounce interval
    Dropped {
        candidate: SafetyTier,
        /// Time left until a change may be committed
        remaining: Duration,
    },
    /// Candidate became the committed tier
    Committed {
        from: SafetyTier,
        to: SafetyTier,
    },
}

/// Committed tier plus hysteresis bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusionState {
    current_tier: SafetyTier,
    last_transition_time: DateTime<Utc>,
    debounce_interval: Duration,
}

impl FusionState {
    /// Fresh state at engine start: `Normal`, committed at `start`
    pub fn new(start: DateTime<Utc>, debounce_interval: Duration) -> Self {
        Self {
            current_tier: SafetyTier::Normal,
            last_transition_time: start,
            debounce_interval,
        }
    }

    pub fn current_tier(&self) -> SafetyTier {
        self.current_tier
    }

    pub fn last_transition_time(&self) -> DateTime<Utc> {
        self.last_transition_time
    }

    pub fn debounce_interval(&self) -> Duration {
        self.debounce_interval
    }

    /// Offer a candidate observed at `now`
    ///
    /// Commits when the candidate differs and at least `debounce_interval`
    /// has elapsed since the last commit. A clock reading earlier than the
    /// last commit counts as no time elapsed.
    pub fn propose(&mut self, candidate: SafetyTier, now: DateTime<Utc>) -> Transition {
        if candidate == self.current_tier {
            return Transition::Unchanged;
        }

        let elapsed = elapsed_between(self.last_transition_time, now).unwrap_or(Duration::ZERO);
        if elapsed < self.debounce_interval {
            return Transition::Dropped {
                candidate,
                remaining: self.debounce_interval - elapsed,
            };
        }

        let from = self.current_tier;
        self.current_tier = candidate;
        self.last_transition_time = now;
        Transition::Committed {
            from,
            to: candidate,
        }
    }
}
