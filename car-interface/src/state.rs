//! Vehicle state normalization
//!
//! Stateless transform from a decoded-signal snapshot to the canonical
//! [`VehicleState`], plus the fixed-gain speed filter whose two floats of
//! state are owned by the facade. The normalizer itself retains no history;
//! every previous-value comparison happens in the event engine against
//! [`crate::events::CycleMemory`].

use crate::registry::BrandInterface;
use crate::types::{CruiseState, SignalSnapshot, VehicleState, WheelSpeeds};

/// Fixed unit conversion constants
pub mod conversions {
    pub const KPH_TO_MS: f64 = 1.0 / 3.6;
    pub const MS_TO_KPH: f64 = 3.6;
    pub const MPH_TO_MS: f64 = 0.447;
    pub const MS_TO_MPH: f64 = 1.0 / 0.447;
}

/// Control cycle period in seconds (100 Hz loop)
pub const CYCLE_DT: f64 = 0.01;

/// Below this speed the vehicle counts as standing still (m/s)
pub const STANDSTILL_SPEED: f64 = 0.001;

// Steady-state Kalman gains for the constant-acceleration speed model at
// CYCLE_DT. Precomputed offline; the filter never re-solves them.
const SPEED_GAIN: f64 = 0.122_876_73;
const ACCEL_GAIN: f64 = 0.296_663_09;

/// Measurement deviation (m/s) beyond which the filter snaps to the
/// measurement instead of tracking through it
const RESET_DEVIATION: f64 = 2.0;

/// Fixed-gain one-dimensional Kalman filter over wheel-speed measurements
///
/// Tracks speed and its derivative. One `update` per control cycle.
#[derive(Debug, Clone)]
pub struct SpeedFilter {
    speed: f64,
    accel: f64,
    initialized: bool,
}

impl SpeedFilter {
    pub fn new() -> Self {
        Self {
            speed: 0.0,
            accel: 0.0,
            initialized: false,
        }
    }

    /// Snap the filter to a known speed with zero acceleration
    pub fn reset(&mut self, speed: f64) {
        self.speed = speed;
        self.accel = 0.0;
        self.initialized = true;
    }

    /// Advance one cycle with a raw speed measurement, returning the
    /// filtered (speed, accel) estimate
    pub fn update(&mut self, measured: f64) -> (f64, f64) {
        if !self.initialized || (measured - self.speed).abs() > RESET_DEVIATION {
            self.reset(measured);
            return (self.speed, self.accel);
        }

        let predicted = self.speed + CYCLE_DT * self.accel;
        let innovation = measured - predicted;
        self.speed = predicted + SPEED_GAIN * innovation;
        self.accel += ACCEL_GAIN * innovation;
        (self.speed, self.accel)
    }
}

impl Default for SpeedFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a decoded-signal snapshot into the canonical vehicle state
///
/// Pure per-cycle transform: fixed scaling and unit conversions only. The
/// returned state carries the raw speed in both speed fields; the facade
/// overwrites `speed`/`accel` from its [`SpeedFilter`].
pub fn normalize(snapshot: &SignalSnapshot, brand: &dyn BrandInterface) -> VehicleState {
    use conversions::KPH_TO_MS;

    let wheel_speeds = WheelSpeeds {
        fl: snapshot.wheel_speed_fl * KPH_TO_MS,
        fr: snapshot.wheel_speed_fr * KPH_TO_MS,
        rl: snapshot.wheel_speed_rl * KPH_TO_MS,
        rr: snapshot.wheel_speed_rr * KPH_TO_MS,
    };
    let speed_raw = wheel_speeds.mean();

    VehicleState {
        speed: speed_raw,
        speed_raw,
        accel: 0.0,
        wheel_speeds,
        standstill: speed_raw < STANDSTILL_SPEED,

        gear: brand.decode_gear(snapshot.gear_code),

        gas: snapshot.gas_counter as f64 / 256.0,
        gas_pressed: snapshot.pedal_gas > 0,
        brake: snapshot.user_brake,
        brake_pressed: snapshot.brake_signal != 0,

        steering_angle: snapshot.steering_angle,
        steering_rate: snapshot.steering_rate,
        steering_pressed: snapshot.steer_override,
        steering_fault: snapshot.steer_fault,

        cruise: CruiseState {
            enabled: snapshot.cruise_status != 0,
            available: snapshot.main_on,
            speed: snapshot.cruise_speed * KPH_TO_MS,
        },

        left_blinker: snapshot.left_blinker,
        right_blinker: snapshot.right_blinker,
        doors_closed: snapshot.doors_closed,
        seatbelt_latched: snapshot.seatbelt_latched,
        esp_disabled: snapshot.esp_disabled,
        low_speed_lockout: snapshot.low_speed_lockout,

        comm_valid: snapshot.comm_valid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::toyota;
    use crate::types::GearShifter;

    fn snapshot_at_kph(kph: f64) -> SignalSnapshot {
        SignalSnapshot {
            wheel_speed_fl: kph,
            wheel_speed_fr: kph,
            wheel_speed_rl: kph,
            wheel_speed_rr: kph,
            comm_valid: true,
            doors_closed: true,
            seatbelt_latched: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_gas_fraction_scaling() {
        let mut snapshot = snapshot_at_kph(0.0);
        snapshot.gas_counter = 128;
        let state = normalize(&snapshot, toyota());
        assert!((state.gas - 0.5).abs() < 1e-9);
        assert!(!state.gas_pressed);

        snapshot.pedal_gas = 1;
        let state = normalize(&snapshot, toyota());
        assert!(state.gas_pressed);
    }

    #[test]
    fn test_wheel_speed_conversion_and_standstill() {
        let state = normalize(&snapshot_at_kph(36.0), toyota());
        assert!((state.speed_raw - 10.0).abs() < 1e-9);
        assert!(!state.standstill);

        let state = normalize(&snapshot_at_kph(0.0), toyota());
        assert_eq!(state.speed_raw, 0.0);
        assert!(state.standstill);
    }

    #[test]
    fn test_cruise_state_mapping() {
        let mut snapshot = snapshot_at_kph(50.0);
        snapshot.cruise_status = 6;
        snapshot.cruise_speed = 72.0;
        snapshot.main_on = true;
        let state = normalize(&snapshot, toyota());
        assert!(state.cruise.enabled);
        assert!(state.cruise.available);
        assert!((state.cruise.speed - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_steering_passes_through_unscaled() {
        let mut snapshot = snapshot_at_kph(10.0);
        snapshot.steering_angle = -12.5;
        snapshot.steering_rate = 3.25;
        let state = normalize(&snapshot, toyota());
        assert_eq!(state.steering_angle, -12.5);
        assert_eq!(state.steering_rate, 3.25);
    }

    #[test]
    fn test_unknown_gear_code() {
        let mut snapshot = snapshot_at_kph(0.0);
        snapshot.gear_code = 0xff;
        let state = normalize(&snapshot, toyota());
        assert_eq!(state.gear, GearShifter::Unknown);
    }

    #[test]
    fn test_speed_filter_tracks_constant_speed() {
        let mut filter = SpeedFilter::new();
        let mut speed = 0.0;
        for _ in 0..200 {
            let (v, _) = filter.update(10.0);
            speed = v;
        }
        assert!((speed - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_speed_filter_estimates_accel() {
        let mut filter = SpeedFilter::new();
        filter.reset(0.0);
        let mut accel = 0.0;
        // Ramp at 1 m/s^2, well below the reset deviation per cycle
        for cycle in 1..=400 {
            let measured = cycle as f64 * CYCLE_DT;
            let (_, a) = filter.update(measured);
            accel = a;
        }
        assert!((accel - 1.0).abs() < 0.1);
    }

    #[test]
    fn test_speed_filter_resets_on_large_jump() {
        let mut filter = SpeedFilter::new();
        filter.reset(0.0);
        let (v, a) = filter.update(20.0);
        assert_eq!(v, 20.0);
        assert_eq!(a, 0.0);
    }
}
