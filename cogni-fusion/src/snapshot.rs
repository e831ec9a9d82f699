//! Snapshot assembly
//!
//! Pairs one vision observation with freshly sampled auxiliary readings.
//! Sampling order is fixed (physio, then vehicle) so scripted and seeded
//! runs replay identically.

use cogni_common::{Snapshot, VisionObservation};

use crate::sources::{PhysioSource, VehicleSource};

/// Assemble the classifier input for one cycle
pub fn assemble<P, V>(vision: VisionObservation, physio: &mut P, vehicle: &mut V) -> Snapshot
where
    P: PhysioSource + ?Sized,
    V: VehicleSource + ?Sized,
{
    let physio = physio.sample_physio();
    let vehicle = vehicle.sample_vehicle();
    Snapshot {
        vision,
        physio,
        vehicle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{ScriptedPhysio, ScriptedVehicle};
    use cogni_common::{HeadPose, PhysioReading, VehicleReading};

    #[test]
    fn test_each_assembly_samples_fresh_readings() {
        let vision = VisionObservation::new(0.05, false, false, HeadPose::Forward).unwrap();
        let mut physio = ScriptedPhysio::new([PhysioReading::ok(45.0), PhysioReading::failure()]);
        let mut vehicle =
            ScriptedVehicle::new([VehicleReading::normal(1.0, 0.4), VehicleReading::zero_input()]);

        let first = assemble(vision, &mut physio, &mut vehicle);
        let second = assemble(vision, &mut physio, &mut vehicle);

        assert_eq!(first.vision, vision);
        assert_eq!(first.physio, PhysioReading::ok(45.0));
        assert_eq!(first.vehicle, VehicleReading::normal(1.0, 0.4));
        assert_eq!(second.physio, PhysioReading::failure());
        assert_eq!(second.vehicle, VehicleReading::zero_input());
    }
}
