//! Fusion snapshot and the committed-transition record
//!
//! [`TransitionRecord`] is the audit payload: it carries everything needed to
//! re-derive the decision (the full snapshot and the rule that fired), and is
//! what a fielded system would place on the vehicle bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::observation::VisionObservation;
use crate::sensors::{PhysioReading, VehicleReading};
use crate::tier::{AlertLevel, SafetyTier};

/// One classification cycle's combined input
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub vision: VisionObservation,
    pub physio: PhysioReading,
    pub vehicle: VehicleReading,
}

/// Emitted once per committed tier change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionRecord {
    /// Producer session the triggering observation arrived on
    pub session_id: Uuid,
    /// Commit counter, starting at 1 for the engine's first transition
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub previous_tier: SafetyTier,
    pub tier: SafetyTier,
    pub level: i8,
    pub alert_level: AlertLevel,
    /// Name of the classifier rule that fired; `None` for the fallthrough
    pub rule: Option<String>,
    pub interventions: Vec<String>,
    pub snapshot: Snapshot,
}

impl TransitionRecord {
    pub fn new(
        session_id: Uuid,
        sequence: u64,
        timestamp: DateTime<Utc>,
        previous_tier: SafetyTier,
        tier: SafetyTier,
        rule: Option<&str>,
        snapshot: Snapshot,
    ) -> Self {
        Self {
            session_id,
            sequence,
            timestamp,
            previous_tier,
            tier,
            level: tier.level(),
            alert_level: tier.alert_level(),
            rule: rule.map(str::to_string),
            interventions: tier.interventions().iter().map(|s| s.to_string()).collect(),
            snapshot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::HeadPose;
    use chrono::TimeZone;

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            vision: VisionObservation::new(0.2, false, false, HeadPose::Forward).unwrap(),
            physio: PhysioReading::ok(55.0),
            vehicle: VehicleReading::zero_input(),
        }
    }

    #[test]
    fn test_record_derives_protocol_fields_from_tier() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
        let record = TransitionRecord::new(
            Uuid::nil(),
            1,
            ts,
            SafetyTier::Normal,
            SafetyTier::Tier3Microsleep,
            Some("microsleep"),
            sample_snapshot(),
        );
        assert_eq!(record.level, 3);
        assert_eq!(record.alert_level, AlertLevel::Emergency);
        assert_eq!(record.interventions.len(), 4);
        assert_eq!(record.rule.as_deref(), Some("microsleep"));
    }

    #[test]
    fn test_record_json_shape() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
        let record = TransitionRecord::new(
            Uuid::nil(),
            7,
            ts,
            SafetyTier::Normal,
            SafetyTier::Tier3Microsleep,
            Some("microsleep"),
            sample_snapshot(),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["tier"], "TIER_3_MICROSLEEP");
        assert_eq!(json["previous_tier"], "TIER_NORMAL");
        assert_eq!(json["timestamp"], "2025-03-01T08:30:00Z");
        assert_eq!(json["alert_level"], "emergency");
        assert_eq!(json["snapshot"]["vehicle"]["input_status"], "ZERO_INPUT");
        assert_eq!(json["snapshot"]["physio"]["hrv_status"], "OK");
        assert_eq!(json["snapshot"]["vision"]["head_pose"], "Forward");
    }
}
