//! Safety tiers and their alert protocol

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Escalating driver-state tiers, listed from most to least severe
///
/// `Ord` follows severity: a more dangerous tier compares greater, so
/// `SafetyTier::Tier3Incapacitation > SafetyTier::Normal`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SafetyTier {
    #[serde(rename = "TIER_3_INCAPACITATION")]
    Tier3Incapacitation,
    #[serde(rename = "TIER_3_MICROSLEEP")]
    Tier3Microsleep,
    #[serde(rename = "TIER_2_HIGH_DROWSINESS")]
    Tier2HighDrowsiness,
    #[serde(rename = "TIER_2_ERRATIC_STEERING")]
    Tier2ErraticSteering,
    #[serde(rename = "TIER_2_DISTRACTION")]
    Tier2Distraction,
    #[serde(rename = "TIER_1_EARLY_FATIGUE")]
    Tier1EarlyFatigue,
    #[serde(rename = "TIER_1_PHYSIO_DIP")]
    Tier1PhysioDip,
    #[serde(rename = "TIER_0_MONOTONY")]
    Tier0Monotony,
    #[serde(rename = "TIER_NORMAL")]
    #[default]
    Normal,
}

/// Alert level shown to the driver for a tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Normal,
    Warning,
    Caution,
    Critical,
    Emergency,
}

impl SafetyTier {
    /// All tiers, most severe first
    pub const ALL: [SafetyTier; 9] = [
        SafetyTier::Tier3Incapacitation,
        SafetyTier::Tier3Microsleep,
        SafetyTier::Tier2HighDrowsiness,
        SafetyTier::Tier2ErraticSteering,
        SafetyTier::Tier2Distraction,
        SafetyTier::Tier1EarlyFatigue,
        SafetyTier::Tier1PhysioDip,
        SafetyTier::Tier0Monotony,
        SafetyTier::Normal,
    ];

    /// Severity rank, 8 for the most severe tier down to 0 for `Normal`
    pub fn severity(&self) -> u8 {
        match self {
            Self::Tier3Incapacitation => 8,
            Self::Tier3Microsleep => 7,
            Self::Tier2HighDrowsiness => 6,
            Self::Tier2ErraticSteering => 5,
            Self::Tier2Distraction => 4,
            Self::Tier1EarlyFatigue => 3,
            Self::Tier1PhysioDip => 2,
            Self::Tier0Monotony => 1,
            Self::Normal => 0,
        }
    }

    /// Protocol level: 3 through 0, or -1 when no protocol is active
    pub fn level(&self) -> i8 {
        match self {
            Self::Tier3Incapacitation | Self::Tier3Microsleep => 3,
            Self::Tier2HighDrowsiness | Self::Tier2ErraticSteering | Self::Tier2Distraction => 2,
            Self::Tier1EarlyFatigue | Self::Tier1PhysioDip => 1,
            Self::Tier0Monotony => 0,
            Self::Normal => -1,
        }
    }

    pub fn alert_level(&self) -> AlertLevel {
        match self.level() {
            3 => AlertLevel::Emergency,
            2 => AlertLevel::Critical,
            1 => AlertLevel::Caution,
            0 => AlertLevel::Warning,
            _ => AlertLevel::Normal,
        }
    }

    /// Interventions triggered when this tier is committed
    pub fn interventions(&self) -> &'static [&'static str] {
        match self.alert_level() {
            AlertLevel::Emergency => &[
                "RED ALERT",
                "Driver Acknowledgement Required",
                "Auto Pull Over",
                "SOS Call",
            ],
            AlertLevel::Critical => &["Heavy Haptics", "Voice Prompt", "Take a Break Now"],
            AlertLevel::Caution => &["Gentle Haptics", "Steering Alert", "Stay Alert"],
            AlertLevel::Warning => &["Ambient Light Change", "Coffee Break Suggestion"],
            AlertLevel::Normal => &["System Active"],
        }
    }

    /// Stable identifier used on the output bus
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tier3Incapacitation => "TIER_3_INCAPACITATION",
            Self::Tier3Microsleep => "TIER_3_MICROSLEEP",
            Self::Tier2HighDrowsiness => "TIER_2_HIGH_DROWSINESS",
            Self::Tier2ErraticSteering => "TIER_2_ERRATIC_STEERING",
            Self::Tier2Distraction => "TIER_2_DISTRACTION",
            Self::Tier1EarlyFatigue => "TIER_1_EARLY_FATIGUE",
            Self::Tier1PhysioDip => "TIER_1_PHYSIO_DIP",
            Self::Tier0Monotony => "TIER_0_MONOTONY",
            Self::Normal => "TIER_NORMAL",
        }
    }
}

impl Ord for SafetyTier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl PartialOrd for SafetyTier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for SafetyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_sorted_most_severe_first() {
        for pair in SafetyTier::ALL.windows(2) {
            assert!(pair[0] > pair[1], "{} should outrank {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_severity_is_unique() {
        let mut ranks: Vec<u8> = SafetyTier::ALL.iter().map(|t| t.severity()).collect();
        ranks.dedup();
        assert_eq!(ranks.len(), SafetyTier::ALL.len());
    }

    #[test]
    fn test_wire_identifier_matches_serde() {
        for tier in SafetyTier::ALL {
            let json = serde_json::to_string(&tier).unwrap();
            assert_eq!(json, format!("\"{}\"", tier.as_str()));
            let back: SafetyTier = serde_json::from_str(&json).unwrap();
            assert_eq!(back, tier);
        }
    }

    #[test]
    fn test_levels_and_alerts() {
        assert_eq!(SafetyTier::Tier3Microsleep.level(), 3);
        assert_eq!(SafetyTier::Tier2Distraction.alert_level(), AlertLevel::Critical);
        assert_eq!(SafetyTier::Tier1PhysioDip.alert_level(), AlertLevel::Caution);
        assert_eq!(SafetyTier::Tier0Monotony.alert_level(), AlertLevel::Warning);
        assert_eq!(SafetyTier::Normal.level(), -1);
        assert_eq!(SafetyTier::Normal.interventions(), &["System Active"]);
    }

    #[test]
    fn test_emergency_interventions_include_sos() {
        assert!(SafetyTier::Tier3Incapacitation.interventions().contains(&"SOS Call"));
        assert_eq!(
            SafetyTier::Tier3Incapacitation.interventions(),
            SafetyTier::Tier3Microsleep.interventions()
        );
    }

    #[test]
    fn test_default_is_normal() {
        assert_eq!(SafetyTier::default(), SafetyTier::Normal);
    }
}
