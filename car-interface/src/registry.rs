//! Brand interface registry
//!
//! Per-brand variation (parameter derivation, gear code tables, ECU
//! heartbeat addresses) is modeled as one trait with flat concrete
//! implementations, selected by model name. No inheritance chains: a brand
//! either implements the capability set or the model is unsupported.

use crate::fingerprint::{FingerprintSample, ACURA_ILX, HONDA_CIVIC, HONDA_CRV, TOYOTA_RAV4};
use crate::params::{
    ecu_present, scale_rotational_inertia, scale_tire_stiffness, ActuationCurve, CarParams,
    EcuKind, LBS_TO_KG, STD_CARGO_KG,
};
use crate::state::conversions::{KPH_TO_MS, MPH_TO_MS};
use crate::types::{CarInterfaceError, GearShifter, Result};

/// Capability set every supported brand provides
pub trait BrandInterface: Send + Sync {
    /// Brand family name
    fn name(&self) -> &'static str;

    /// Models this brand implementation covers
    fn models(&self) -> &'static [&'static str];

    /// Map the brand's raw gear selector code to a canonical position
    fn decode_gear(&self, code: u8) -> GearShifter;

    /// Heartbeat addresses whose presence on the bus proves the ECU exists
    fn ecu_heartbeats(&self, ecu: EcuKind) -> &'static [u32];

    /// Derive the static tuning record for one of this brand's models
    fn derive_params(&self, model: &str, sample: &FingerprintSample) -> Result<CarParams>;
}

/// Resolve the brand implementation for an identified model
pub fn brand_for(model: &str) -> Result<&'static dyn BrandInterface> {
    for brand in [toyota(), honda()] {
        if brand.models().contains(&model) {
            return Ok(brand);
        }
    }
    Err(CarInterfaceError::UnknownModel(model.to_string()))
}

pub fn toyota() -> &'static dyn BrandInterface {
    static TOYOTA: ToyotaInterface = ToyotaInterface;
    &TOYOTA
}

pub fn honda() -> &'static dyn BrandInterface {
    static HONDA: HondaInterface = HondaInterface;
    &HONDA
}

/// Toyota family
struct ToyotaInterface;

impl BrandInterface for ToyotaInterface {
    fn name(&self) -> &'static str {
        "toyota"
    }

    fn models(&self) -> &'static [&'static str] {
        &[TOYOTA_RAV4]
    }

    fn decode_gear(&self, code: u8) -> GearShifter {
        match code {
            0x20 => GearShifter::Park,
            0x10 => GearShifter::Reverse,
            0x08 => GearShifter::Neutral,
            0x00 => GearShifter::Drive,
            0x01 => GearShifter::Low,
            _ => GearShifter::Unknown,
        }
    }

    fn ecu_heartbeats(&self, ecu: EcuKind) -> &'static [u32] {
        match ecu {
            EcuKind::Camera => &[740],
            EcuKind::DriveSupport => &[835],
        }
    }

    fn derive_params(&self, model: &str, sample: &FingerprintSample) -> Result<CarParams> {
        if !self.models().contains(&model) {
            return Err(CarInterfaceError::UnknownModel(model.to_string()));
        }

        let mass = 3045.0 * LBS_TO_KG + STD_CARGO_KG;
        let wheelbase = 2.70;
        let center_to_front = wheelbase * 0.44;
        let (tire_front, tire_rear) = scale_tire_stiffness(mass, wheelbase, center_to_front);

        // Stop-and-go capable models use a negative enable speed so the
        // gate never triggers; the RAV4 cannot hold at standstill
        let min_enable_speed = match model {
            TOYOTA_RAV4 => 19.0 * MPH_TO_MS,
            _ => -1.0,
        };

        let camera_present = ecu_present(sample, self.ecu_heartbeats(EcuKind::Camera));
        let drive_support_present =
            ecu_present(sample, self.ecu_heartbeats(EcuKind::DriveSupport));
        log::info!(
            "{}: camera ECU present: {}, drive-support ECU present: {}",
            model,
            camera_present,
            drive_support_present
        );

        Ok(CarParams {
            model: model.to_string(),
            brand: self.name().to_string(),
            mass,
            wheelbase,
            center_to_front,
            rotational_inertia: scale_rotational_inertia(mass, wheelbase),
            tire_stiffness_front: tire_front,
            tire_stiffness_rear: tire_rear,
            steer_ratio: 14.5,
            steer_kp: 0.6,
            steer_ki: 0.05,
            steer_kf: 0.00006,
            steer_limit: ActuationCurve::new(
                vec![16.0 * KPH_TO_MS, 45.0 * KPH_TO_MS],
                vec![1.0, 1.0],
            ),
            gas_limit: ActuationCurve::new(vec![0.0], vec![0.5]),
            brake_limit: ActuationCurve::new(vec![5.0, 20.0], vec![1.0, 0.8]),
            long_deadzone: ActuationCurve::new(vec![0.0, 9.0], vec![0.0, 0.15]),
            min_enable_speed,
            camera_present,
            drive_support_present,
            longitudinal_gating: !drive_support_present,
        })
    }
}

/// Honda family (Acura shares the platform)
struct HondaInterface;

impl BrandInterface for HondaInterface {
    fn name(&self) -> &'static str {
        "honda"
    }

    fn models(&self) -> &'static [&'static str] {
        &[ACURA_ILX, HONDA_CIVIC, HONDA_CRV]
    }

    fn decode_gear(&self, code: u8) -> GearShifter {
        match code {
            0x01 => GearShifter::Park,
            0x02 => GearShifter::Reverse,
            0x03 => GearShifter::Neutral,
            0x04 => GearShifter::Drive,
            0x07 => GearShifter::Low,
            _ => GearShifter::Unknown,
        }
    }

    fn ecu_heartbeats(&self, ecu: EcuKind) -> &'static [u32] {
        match ecu {
            EcuKind::Camera => &[0xe4, 0x194],
            // No drive-support unit on this platform
            EcuKind::DriveSupport => &[],
        }
    }

    fn derive_params(&self, model: &str, sample: &FingerprintSample) -> Result<CarParams> {
        let (curb_lbs, wheelbase, front_share, steer_ratio) = match model {
            ACURA_ILX => (3095.0, 2.67, 0.37, 15.3),
            HONDA_CIVIC => (2923.0, 2.70, 0.40, 15.38),
            HONDA_CRV => (3572.0, 2.62, 0.41, 16.0),
            _ => return Err(CarInterfaceError::UnknownModel(model.to_string())),
        };

        let mass = curb_lbs * LBS_TO_KG + STD_CARGO_KG;
        let center_to_front = wheelbase * front_share;
        let (tire_front, tire_rear) = scale_tire_stiffness(mass, wheelbase, center_to_front);

        let min_enable_speed = match model {
            // The CR-V's cruise will not hold below city speed
            HONDA_CRV => 12.0 * MPH_TO_MS,
            _ => -1.0,
        };

        let camera_present = ecu_present(sample, self.ecu_heartbeats(EcuKind::Camera));
        let drive_support_present =
            ecu_present(sample, self.ecu_heartbeats(EcuKind::DriveSupport));
        log::info!(
            "{}: camera ECU present: {}, drive-support ECU present: {}",
            model,
            camera_present,
            drive_support_present
        );

        Ok(CarParams {
            model: model.to_string(),
            brand: self.name().to_string(),
            mass,
            wheelbase,
            center_to_front,
            rotational_inertia: scale_rotational_inertia(mass, wheelbase),
            tire_stiffness_front: tire_front,
            tire_stiffness_rear: tire_rear,
            steer_ratio,
            steer_kp: 0.8,
            steer_ki: 0.24,
            steer_kf: 0.0,
            steer_limit: ActuationCurve::new(vec![0.0], vec![1.0]),
            gas_limit: ActuationCurve::new(vec![0.0], vec![0.6]),
            brake_limit: ActuationCurve::new(vec![0.0], vec![1.0]),
            long_deadzone: ActuationCurve::new(vec![0.0], vec![0.0]),
            min_enable_speed,
            camera_present,
            drive_support_present,
            longitudinal_gating: !drive_support_present,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::FingerprintTable;
    use crate::params::reference;

    #[test]
    fn test_brand_resolution() {
        assert_eq!(brand_for(TOYOTA_RAV4).unwrap().name(), "toyota");
        assert_eq!(brand_for(HONDA_CIVIC).unwrap().name(), "honda");
        assert_eq!(brand_for(ACURA_ILX).unwrap().name(), "honda");
        assert!(matches!(
            brand_for("YUGO GV 1987"),
            Err(CarInterfaceError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_every_known_car_has_a_brand() {
        for model in FingerprintTable::builtin().all_known_cars() {
            assert!(brand_for(&model).is_ok(), "no brand for {}", model);
        }
    }

    #[test]
    fn test_rav4_params() {
        let sample = FingerprintSample::new();
        let params = toyota().derive_params(TOYOTA_RAV4, &sample).unwrap();

        assert_eq!(params.brand, "toyota");
        assert!((params.mass - (3045.0 * LBS_TO_KG + STD_CARGO_KG)).abs() < 1e-9);
        assert_eq!(params.wheelbase, 2.70);
        assert!((params.min_enable_speed - 19.0 * MPH_TO_MS).abs() < 1e-9);
        // Heavier than the reference, so inertia and stiffness scale up
        assert!(params.rotational_inertia > reference::ROTATIONAL_INERTIA);
        assert!(params.tire_stiffness_front > 0.0);
        assert!(params.tire_stiffness_rear > 0.0);
    }

    #[test]
    fn test_ecu_probe_drives_gating() {
        // Empty sample: no drive-support unit seen, this layer gates
        let params = toyota()
            .derive_params(TOYOTA_RAV4, &FingerprintSample::new())
            .unwrap();
        assert!(!params.drive_support_present);
        assert!(params.longitudinal_gating);

        // Heartbeats observed: stock units present, gate belongs to them
        let mut sample = FingerprintSample::new();
        sample.insert(740, 5);
        sample.insert(835, 8);
        let params = toyota().derive_params(TOYOTA_RAV4, &sample).unwrap();
        assert!(params.camera_present);
        assert!(params.drive_support_present);
        assert!(!params.longitudinal_gating);
    }

    #[test]
    fn test_civic_matches_reference_vehicle() {
        let params = honda()
            .derive_params(HONDA_CIVIC, &FingerprintSample::new())
            .unwrap();
        assert!((params.mass - reference::MASS).abs() < 1e-9);
        assert_eq!(params.wheelbase, reference::WHEELBASE);
        assert!((params.tire_stiffness_front - reference::TIRE_STIFFNESS_FRONT).abs() < 1e-6);
    }

    #[test]
    fn test_gear_decode_tables() {
        assert_eq!(toyota().decode_gear(0x00), GearShifter::Drive);
        assert_eq!(toyota().decode_gear(0x10), GearShifter::Reverse);
        assert_eq!(toyota().decode_gear(0x20), GearShifter::Park);
        assert_eq!(toyota().decode_gear(0x55), GearShifter::Unknown);

        assert_eq!(honda().decode_gear(0x04), GearShifter::Drive);
        assert_eq!(honda().decode_gear(0x02), GearShifter::Reverse);
        assert_eq!(honda().decode_gear(0x00), GearShifter::Unknown);
    }

    #[test]
    fn test_brand_rejects_foreign_model() {
        let err = toyota()
            .derive_params(HONDA_CIVIC, &FingerprintSample::new())
            .unwrap_err();
        assert!(matches!(err, CarInterfaceError::UnknownModel(_)));
    }
}
