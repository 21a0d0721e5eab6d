//! Static per-model tuning parameters
//!
//! `CarParams` is derived once per identified model and consumed by the
//! downstream planning/control layers. Physical constants are scaled from a
//! single well-characterized reference vehicle by mass and wheelbase ratio;
//! optional-ECU presence is probed from the fingerprint sample collected
//! during identification.

use crate::fingerprint::FingerprintSample;
use serde::{Deserialize, Serialize};

/// Standard extra cargo assumed on top of curb weight, in kg
pub const STD_CARGO_KG: f64 = 136.0;

/// Pounds to kilograms
pub const LBS_TO_KG: f64 = 1.0 / 2.205;

/// Reference vehicle physical constants (Civic-class sedan)
///
/// Unknown models scale from these by mass and wheelbase ratio so every car
/// starts with approximately similar dynamic behavior.
pub mod reference {
    use super::{LBS_TO_KG, STD_CARGO_KG};

    pub const MASS: f64 = 2923.0 * LBS_TO_KG + STD_CARGO_KG;
    pub const WHEELBASE: f64 = 2.70;
    pub const CENTER_TO_FRONT: f64 = WHEELBASE * 0.4;
    pub const ROTATIONAL_INERTIA: f64 = 2500.0;
    pub const TIRE_STIFFNESS_FRONT: f64 = 85400.0;
    pub const TIRE_STIFFNESS_REAR: f64 = 90000.0;
}

/// Optional ECUs whose presence is probed from bus traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EcuKind {
    /// Forward camera unit
    Camera,
    /// Drive-support (radar cruise) unit
    DriveSupport,
}

/// Piecewise-linear limit curve over speed
///
/// Breakpoints must be sorted ascending. Evaluation clamps to the end
/// values outside the breakpoint range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuationCurve {
    pub breakpoints: Vec<f64>,
    pub values: Vec<f64>,
}

impl ActuationCurve {
    pub fn new(breakpoints: Vec<f64>, values: Vec<f64>) -> Self {
        debug_assert_eq!(breakpoints.len(), values.len());
        Self {
            breakpoints,
            values,
        }
    }

    /// Linear interpolation with clamped ends
    pub fn value_at(&self, x: f64) -> f64 {
        let bp = &self.breakpoints;
        let v = &self.values;
        if bp.is_empty() {
            return 0.0;
        }
        if x <= bp[0] {
            return v[0];
        }
        if x >= bp[bp.len() - 1] {
            return v[v.len() - 1];
        }
        for i in 1..bp.len() {
            if x <= bp[i] {
                let t = (x - bp[i - 1]) / (bp[i] - bp[i - 1]);
                return v[i - 1] + t * (v[i] - v[i - 1]);
            }
        }
        v[v.len() - 1]
    }
}

/// Static tuning record for one identified model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarParams {
    /// Identified model name (fingerprint table key)
    pub model: String,
    /// Brand family the model resolves to
    pub brand: String,

    /// Total mass including standard cargo, kg
    pub mass: f64,
    /// Wheelbase, m
    pub wheelbase: f64,
    /// Distance from center of gravity to front axle, m
    pub center_to_front: f64,
    /// Yaw rotational inertia, kg m^2
    pub rotational_inertia: f64,
    /// Front/rear lateral tire stiffness, N/rad
    pub tire_stiffness_front: f64,
    pub tire_stiffness_rear: f64,

    /// Steering rack ratio
    pub steer_ratio: f64,
    pub steer_kp: f64,
    pub steer_ki: f64,
    pub steer_kf: f64,

    /// Actuation limits versus speed
    pub steer_limit: ActuationCurve,
    pub gas_limit: ActuationCurve,
    pub brake_limit: ActuationCurve,
    /// Longitudinal PID deadzone versus speed
    pub long_deadzone: ActuationCurve,

    /// Minimum speed to engage, m/s. Stop-and-go capable models use a
    /// negative value so the gate never triggers.
    pub min_enable_speed: f64,

    /// Stock forward camera observed on the bus
    pub camera_present: bool,
    /// Stock drive-support unit observed on the bus
    pub drive_support_present: bool,
    /// This layer owns the longitudinal enable gate (stock drive-support
    /// unit absent)
    pub longitudinal_gating: bool,
}

/// Scale the reference rotational inertia by mass and wheelbase squared
pub fn scale_rotational_inertia(mass: f64, wheelbase: f64) -> f64 {
    reference::ROTATIONAL_INERTIA * mass * wheelbase * wheelbase
        / (reference::MASS * reference::WHEELBASE * reference::WHEELBASE)
}

/// Scale the reference tire stiffnesses by mass and center-of-gravity
/// position, returning (front, rear)
pub fn scale_tire_stiffness(mass: f64, wheelbase: f64, center_to_front: f64) -> (f64, f64) {
    let center_to_rear = wheelbase - center_to_front;
    let ref_center_to_rear = reference::WHEELBASE - reference::CENTER_TO_FRONT;

    let front = reference::TIRE_STIFFNESS_FRONT * (mass / reference::MASS)
        * (center_to_rear / wheelbase)
        / (ref_center_to_rear / reference::WHEELBASE);
    let rear = reference::TIRE_STIFFNESS_REAR * (mass / reference::MASS)
        * (center_to_front / wheelbase)
        / (reference::CENTER_TO_FRONT / reference::WHEELBASE);
    (front, rear)
}

/// True if any of the ECU's heartbeat addresses was observed in the
/// identification sample
pub fn ecu_present(sample: &FingerprintSample, heartbeats: &[u32]) -> bool {
    heartbeats.iter().any(|addr| sample.contains_key(addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actuation_curve_interpolation() {
        let curve = ActuationCurve::new(vec![5.0, 20.0], vec![1.0, 0.8]);
        assert_eq!(curve.value_at(0.0), 1.0);
        assert_eq!(curve.value_at(5.0), 1.0);
        assert!((curve.value_at(12.5) - 0.9).abs() < 1e-9);
        assert_eq!(curve.value_at(20.0), 0.8);
        assert_eq!(curve.value_at(50.0), 0.8);
    }

    #[test]
    fn test_actuation_curve_single_point() {
        let curve = ActuationCurve::new(vec![0.0], vec![0.5]);
        assert_eq!(curve.value_at(-1.0), 0.5);
        assert_eq!(curve.value_at(10.0), 0.5);
    }

    #[test]
    fn test_reference_sized_car_scales_to_reference() {
        let j = scale_rotational_inertia(reference::MASS, reference::WHEELBASE);
        assert!((j - reference::ROTATIONAL_INERTIA).abs() < 1e-9);

        let (front, rear) = scale_tire_stiffness(
            reference::MASS,
            reference::WHEELBASE,
            reference::CENTER_TO_FRONT,
        );
        assert!((front - reference::TIRE_STIFFNESS_FRONT).abs() < 1e-6);
        assert!((rear - reference::TIRE_STIFFNESS_REAR).abs() < 1e-6);
    }

    #[test]
    fn test_heavier_car_scales_up() {
        let j = scale_rotational_inertia(reference::MASS * 1.2, reference::WHEELBASE);
        assert!(j > reference::ROTATIONAL_INERTIA);

        let (front, rear) =
            scale_tire_stiffness(reference::MASS * 1.2, 2.9, 2.9 * 0.44);
        assert!(front > 0.0 && rear > 0.0);
    }

    #[test]
    fn test_ecu_present_probes_sample() {
        let mut sample = FingerprintSample::new();
        sample.insert(740, 5);
        assert!(ecu_present(&sample, &[740]));
        assert!(!ecu_present(&sample, &[835]));
        assert!(ecu_present(&sample, &[835, 740]));
        assert!(!ecu_present(&sample, &[]));
    }
}
