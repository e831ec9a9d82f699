//! Tier classifier
//!
//! A pure, ordered decision table. Rules are evaluated from most to least
//! severe and the first match wins, so exactly one rule explains every
//! decision. The table order is part of the certified behavior: do not
//! reorder rules, even the unreachable one.

use cogni_common::{HrvStatus, InputStatus, SafetyTier, Snapshot};

/// PERCLOS above which eye closure corroborated by zero input is a microsleep
pub const PERCLOS_MICROSLEEP: f64 = 0.15;
/// PERCLOS above which the driver is highly drowsy
pub const PERCLOS_HIGH_DROWSINESS: f64 = 0.12;
/// PERCLOS above which early fatigue is flagged
pub const PERCLOS_EARLY_FATIGUE: f64 = 0.075;

/// One row of the decision table
pub struct Rule {
    /// Stable name carried into transition records
    pub name: &'static str,
    pub tier: SafetyTier,
    pub predicate: fn(&Snapshot) -> bool,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("tier", &self.tier)
            .finish()
    }
}

/// The decision table, most severe first. `Normal` is the fallthrough.
pub static RULES: [Rule; 8] = [
    Rule {
        name: "hrv_unavailable_or_anomalous",
        tier: SafetyTier::Tier3Incapacitation,
        predicate: |s| matches!(s.physio.hrv_status, HrvStatus::Failure | HrvStatus::Anomaly),
    },
    Rule {
        // Eye closure only counts as microsleep when the vehicle confirms no input
        name: "perclos_with_zero_input",
        tier: SafetyTier::Tier3Microsleep,
        predicate: |s| {
            s.vision.perclos > PERCLOS_MICROSLEEP && s.vehicle.input_status == InputStatus::ZeroInput
        },
    },
    Rule {
        name: "perclos_high",
        tier: SafetyTier::Tier2HighDrowsiness,
        predicate: |s| s.vision.perclos > PERCLOS_HIGH_DROWSINESS,
    },
    Rule {
        name: "erratic_input",
        tier: SafetyTier::Tier2ErraticSteering,
        predicate: |s| s.vehicle.input_status == InputStatus::Erratic,
    },
    Rule {
        name: "gaze_distracted",
        tier: SafetyTier::Tier2Distraction,
        predicate: |s| s.vision.gaze_distracted,
    },
    Rule {
        name: "perclos_elevated",
        tier: SafetyTier::Tier1EarlyFatigue,
        predicate: |s| s.vision.perclos > PERCLOS_EARLY_FATIGUE,
    },
    Rule {
        // Unreachable: the incapacitation rule already claims ANOMALY.
        // Kept in place until product intent for HRV dips is settled.
        name: "hrv_dip",
        tier: SafetyTier::Tier1PhysioDip,
        predicate: |s| s.physio.hrv_status == HrvStatus::Anomaly,
    },
    Rule {
        name: "yawning",
        tier: SafetyTier::Tier0Monotony,
        predicate: |s| s.vision.yawn_active,
    },
];

/// Outcome of evaluating the decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub tier: SafetyTier,
    /// Name of the rule that fired; `None` means no rule matched (`Normal`)
    pub rule: Option<&'static str>,
}

/// Evaluate the table and report which rule decided
pub fn evaluate(snapshot: &Snapshot) -> Classification {
    RULES
        .iter()
        .find(|rule| (rule.predicate)(snapshot))
        .map(|rule| Classification {
            tier: rule.tier,
            rule: Some(rule.name),
        })
        .unwrap_or(Classification {
            tier: SafetyTier::Normal,
            rule: None,
        })
}

/// Candidate tier for a snapshot
pub fn classify(snapshot: &Snapshot) -> SafetyTier {
    evaluate(snapshot).tier
}
