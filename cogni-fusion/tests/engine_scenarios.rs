//! Fusion engine scenario tests
//!
//! Drives the engine cycle by cycle with a manual clock and scripted sensor
//! channels. Covers the literal driving scenarios, the priority and totality
//! properties of the classifier, and debounce behavior.

mod helpers;

use std::time::Duration;

use cogni_common::time::Clock;
use cogni_common::{
    HeadPose, HrvStatus, InputStatus, PhysioReading, SafetyTier, Snapshot, VehicleReading,
    VisionObservation,
};
use cogni_fusion::classifier::{classify, evaluate, RULES};
use cogni_fusion::CycleOutcome;
use helpers::*;

/// Engine past its startup hold, with constant sensor readings
fn settled_engine(physio: PhysioReading, vehicle: VehicleReading) -> TestEngine {
    let t = TestEngine::with_sensors(vec![physio], vec![vehicle], Duration::from_secs(2), None);
    t.advance_ms(2_000);
    t
}

fn committed_tier(outcome: CycleOutcome) -> SafetyTier {
    match outcome {
        CycleOutcome::Committed(record) => record.tier,
        other => panic!("expected a commit, got {:?}", other),
    }
}

// ===== Literal scenarios =====

#[test]
fn scenario_1_microsleep_needs_zero_input() {
    let mut t = settled_engine(hrv_ok(), VehicleReading::zero_input());
    let tier = committed_tier(t.engine.process(vision(0.20, false)));
    assert_eq!(tier, SafetyTier::Tier3Microsleep);
}

#[test]
fn scenario_2_hrv_failure_is_incapacitation() {
    let mut t = settled_engine(PhysioReading::failure(), driving());
    let tier = committed_tier(t.engine.process(vision(0.02, false)));
    assert_eq!(tier, SafetyTier::Tier3Incapacitation);
}

#[test]
fn scenario_3_high_drowsiness() {
    let mut t = settled_engine(hrv_ok(), driving());
    let tier = committed_tier(t.engine.process(vision(0.13, false)));
    assert_eq!(tier, SafetyTier::Tier2HighDrowsiness);
}

#[test]
fn scenario_4_yawning_is_monotony() {
    let mut t = settled_engine(hrv_ok(), driving());
    let tier = committed_tier(t.engine.process(vision(0.05, true)));
    assert_eq!(tier, SafetyTier::Tier0Monotony);
}

#[test]
fn scenario_5_nominal_stays_normal() {
    let mut t = settled_engine(hrv_ok(), driving());
    assert_eq!(
        t.engine.process(vision(0.02, false)),
        CycleOutcome::Unchanged(SafetyTier::Normal)
    );
    assert!(t.reporter.is_empty());
}

#[test]
fn scenario_6_second_change_inside_interval_is_dropped() {
    let mut t = settled_engine(hrv_ok(), driving());
    t.advance_ms(1_000);
    let commit_time = t.clock.now();

    let tier = committed_tier(t.engine.process(vision(0.13, false)));
    assert_eq!(tier, SafetyTier::Tier2HighDrowsiness);

    t.advance_ms(500);
    assert!(matches!(
        t.engine.process(vision(0.05, true)),
        CycleOutcome::Dropped {
            candidate: SafetyTier::Tier0Monotony,
            ..
        }
    ));
    assert_eq!(t.engine.current_tier(), SafetyTier::Tier2HighDrowsiness);
    assert_eq!(t.engine.state().last_transition_time(), commit_time);

    t.advance_ms(1_499);
    assert!(matches!(t.engine.process(vision(0.05, true)), CycleOutcome::Dropped { .. }));
    assert_eq!(t.engine.current_tier(), SafetyTier::Tier2HighDrowsiness);

    // Exactly 2.0 s after the first commit
    t.advance_ms(1);
    let tier = committed_tier(t.engine.process(vision(0.05, true)));
    assert_eq!(tier, SafetyTier::Tier0Monotony);

    let records = t.reporter.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].previous_tier, SafetyTier::Tier2HighDrowsiness);
}

// ===== Classifier properties =====

fn all_snapshots() -> Vec<Snapshot> {
    let perclos = [0.0, 0.05, 0.075, 0.076, 0.10, 0.12, 0.121, 0.15, 0.151, 0.5, 1.0];
    let physio = [
        PhysioReading::ok(60.0),
        PhysioReading::anomaly(),
        PhysioReading::failure(),
    ];
    let vehicle = [
        VehicleReading::normal(0.0, 0.5),
        VehicleReading::erratic(20.0, 0.5),
        VehicleReading::zero_input(),
    ];
    let poses = [
        HeadPose::Forward,
        HeadPose::Left,
        HeadPose::Right,
        HeadPose::Up,
        HeadPose::Down,
    ];

    let mut snapshots = Vec::new();
    for &p in &perclos {
        for yawn in [false, true] {
            for gaze in [false, true] {
                for &pose in &poses {
                    for &physio in &physio {
                        for &vehicle in &vehicle {
                            snapshots.push(Snapshot {
                                vision: VisionObservation::new(p, yawn, gaze, pose).unwrap(),
                                physio,
                                vehicle,
                            });
                        }
                    }
                }
            }
        }
    }
    snapshots
}

#[test]
fn incapacitation_overrides_every_other_signal() {
    for snapshot in all_snapshots() {
        if matches!(
            snapshot.physio.hrv_status,
            HrvStatus::Failure | HrvStatus::Anomaly
        ) {
            assert_eq!(
                classify(&snapshot),
                SafetyTier::Tier3Incapacitation,
                "{:?}",
                snapshot
            );
        }
    }
}

#[test]
fn every_snapshot_maps_to_exactly_one_tier() {
    for snapshot in all_snapshots() {
        let result = evaluate(&snapshot);
        match result.rule {
            None => {
                assert_eq!(result.tier, SafetyTier::Normal);
                assert!(RULES.iter().all(|rule| !(rule.predicate)(&snapshot)));
            }
            Some(name) => {
                let index = RULES.iter().position(|r| r.name == name).unwrap();
                assert_eq!(RULES[index].tier, result.tier);
                // No earlier rule could have claimed the snapshot
                assert!(RULES[..index].iter().all(|rule| !(rule.predicate)(&snapshot)));
            }
        }
    }
}

#[test]
fn physio_dip_is_never_produced() {
    assert!(all_snapshots()
        .iter()
        .all(|s| classify(s) != SafetyTier::Tier1PhysioDip));
}

#[test]
fn zero_input_alone_is_not_escalated() {
    let snapshot = Snapshot {
        vision: vision(0.0, false),
        physio: PhysioReading::ok(60.0),
        vehicle: VehicleReading::zero_input(),
    };
    assert_eq!(snapshot.vehicle.input_status, InputStatus::ZeroInput);
    assert_eq!(classify(&snapshot), SafetyTier::Normal);
}

// ===== Debounce properties =====

#[test]
fn changes_inside_interval_never_mutate_state() {
    let mut t = settled_engine(hrv_ok(), driving());
    committed_tier(t.engine.process(distracted(0.0)));
    let committed = t.engine.state().clone();

    for _ in 0..19 {
        t.advance_ms(100);
        assert!(matches!(t.engine.process(vision(0.0, false)), CycleOutcome::Dropped { .. }));
        assert!(matches!(t.engine.process(vision(0.13, false)), CycleOutcome::Dropped { .. }));
        assert_eq!(t.engine.state(), &committed);
    }
    assert_eq!(t.reporter.len(), 1);
    assert_eq!(t.engine.stats().dropped, 38);
}

#[test]
fn startup_hold_applies_to_the_first_change() {
    let mut t = TestEngine::with_sensors(
        vec![hrv_ok()],
        vec![driving()],
        Duration::from_secs(2),
        None,
    );
    t.advance_ms(1_999);
    assert!(matches!(t.engine.process(vision(0.05, true)), CycleOutcome::Dropped { .. }));
    t.advance_ms(1);
    assert_eq!(committed_tier(t.engine.process(vision(0.05, true))), SafetyTier::Tier0Monotony);
}

#[test]
fn clock_stepping_back_counts_as_no_elapsed_time() {
    let mut t = settled_engine(hrv_ok(), driving());
    let commit_time = t.clock.now();
    committed_tier(t.engine.process(vision(0.13, false)));
    let committed = t.engine.state().clone();

    // Wall clock corrected backwards by an NTP step
    t.clock.set(commit_time - chrono::Duration::seconds(30));
    assert!(matches!(
        t.engine.process(vision(0.05, true)),
        CycleOutcome::Dropped {
            candidate: SafetyTier::Tier0Monotony,
            ..
        }
    ));
    assert_eq!(t.engine.state(), &committed);

    t.clock.set(commit_time + chrono::Duration::seconds(2));
    assert_eq!(committed_tier(t.engine.process(vision(0.05, true))), SafetyTier::Tier0Monotony);
    assert_eq!(t.reporter.len(), 2);
}

#[test]
fn repeating_the_current_tier_is_idempotent() {
    let mut t = settled_engine(hrv_ok(), driving());
    committed_tier(t.engine.process(vision(0.05, true)));
    let committed_at = t.engine.state().last_transition_time();

    for _ in 0..50 {
        t.advance_ms(750);
        assert_eq!(
            t.engine.process(vision(0.05, true)),
            CycleOutcome::Unchanged(SafetyTier::Tier0Monotony)
        );
    }
    assert_eq!(t.engine.state().last_transition_time(), committed_at);
    assert_eq!(t.reporter.len(), 1);
}

#[test]
fn sensor_faults_flow_through_scripted_channels() {
    let mut t = TestEngine::with_sensors(
        vec![hrv_ok(), hrv_ok(), PhysioReading::anomaly()],
        vec![driving(), VehicleReading::erratic(-20.0, 0.5), driving()],
        Duration::from_millis(0),
        None,
    );

    assert_eq!(
        t.engine.process(vision(0.0, false)),
        CycleOutcome::Unchanged(SafetyTier::Normal)
    );
    assert_eq!(
        committed_tier(t.engine.process(vision(0.0, false))),
        SafetyTier::Tier2ErraticSteering
    );
    let record = match t.engine.process(vision(0.0, false)) {
        CycleOutcome::Committed(record) => record,
        other => panic!("expected a commit, got {:?}", other),
    };
    assert_eq!(record.tier, SafetyTier::Tier3Incapacitation);
    assert_eq!(record.previous_tier, SafetyTier::Tier2ErraticSteering);
    assert_eq!(record.snapshot.physio.hrv_status, HrvStatus::Anomaly);
    assert_eq!(record.snapshot.physio.hrv_value, 0.0);
}
