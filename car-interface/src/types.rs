//! Core types for the car interface library
//!
//! This module defines the fundamental types exchanged between the
//! fingerprint matcher, the state normalizer, the safety event engine and
//! the facade. All per-cycle values (`VehicleState`, `EventRecord`,
//! `ButtonEvent`) are plain data recomputed in full every cycle - nothing in
//! here carries history.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Result type for car interface operations
pub type Result<T> = std::result::Result<T, CarInterfaceError>;

/// Errors that can occur in the car interface layer
///
/// Safety conditions are never reported through this enum - they are
/// `EventRecord`s. Errors here are structural: identification failure,
/// bad reference data, or a rejected actuation command.
#[derive(Debug, thiserror::Error)]
pub enum CarInterfaceError {
    #[error("all fingerprint candidates eliminated after {frames} frames")]
    FingerprintEliminated { frames: usize },

    #[error("fingerprint unresolved after {frames} frames: {candidates:?}")]
    FingerprintAmbiguous {
        frames: usize,
        candidates: Vec<String>,
    },

    #[error("unknown car model: {0}")]
    UnknownModel(String),

    #[error("failed to parse fingerprint extension: {0}")]
    ExtensionParse(String),

    #[error("actuation channel rejected command: {0}")]
    Actuation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw CAN frame as observed on the vehicle bus
///
/// Only the fields needed for fingerprinting are carried: the payload bytes
/// themselves are decoded elsewhere and enter this layer as a
/// [`SignalSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanFrame {
    /// Message address (11-bit or 29-bit identifier)
    pub address: u32,
    /// Source/bus index. 0 is the main vehicle bus; non-zero sources are
    /// echoes or ECU-presence probes and never distinguish models.
    pub source: u8,
    /// Number of payload bytes in the frame
    pub payload_len: u8,
}

impl CanFrame {
    pub fn new(address: u32, source: u8, payload_len: u8) -> Self {
        Self {
            address,
            source,
            payload_len,
        }
    }
}

/// Gear shifter position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GearShifter {
    Park,
    Reverse,
    Neutral,
    Drive,
    Low,
    /// Raw gear code not present in the brand's decode table
    Unknown,
}

impl fmt::Display for GearShifter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GearShifter::Park => "park",
            GearShifter::Reverse => "reverse",
            GearShifter::Neutral => "neutral",
            GearShifter::Drive => "drive",
            GearShifter::Low => "low",
            GearShifter::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Speed of each wheel in m/s
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelSpeeds {
    pub fl: f64,
    pub fr: f64,
    pub rl: f64,
    pub rr: f64,
}

impl WheelSpeeds {
    /// Mean of the four wheel speeds
    pub fn mean(&self) -> f64 {
        (self.fl + self.fr + self.rl + self.rr) / 4.0
    }
}

/// Cruise control state as reported by the powertrain control module
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CruiseState {
    /// Cruise is actively engaged
    pub enabled: bool,
    /// Main cruise switch is on, cruise may be engaged
    pub available: bool,
    /// Target speed in m/s
    pub speed: f64,
}

/// Canonical per-cycle vehicle state
///
/// Produced once per control cycle by the normalizer (speed/accel refined by
/// the facade's speed filter) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    /// Filtered vehicle speed in m/s
    pub speed: f64,
    /// Unfiltered vehicle speed in m/s (mean of wheel speeds)
    pub speed_raw: f64,
    /// Longitudinal acceleration estimate in m/s^2
    pub accel: f64,
    pub wheel_speeds: WheelSpeeds,
    /// Vehicle is not moving
    pub standstill: bool,

    pub gear: GearShifter,

    /// Gas pedal position as a fraction of full travel
    pub gas: f64,
    pub gas_pressed: bool,
    /// Driver brake input amount (brand units, pass-through)
    pub brake: f64,
    pub brake_pressed: bool,

    /// Steering wheel angle in degrees
    pub steering_angle: f64,
    /// Steering wheel rate in degrees per second
    pub steering_rate: f64,
    /// Driver is overriding the steering actuator
    pub steering_pressed: bool,
    /// Steering assist reports a fault
    pub steering_fault: bool,

    pub cruise: CruiseState,

    pub left_blinker: bool,
    pub right_blinker: bool,
    pub doors_closed: bool,
    pub seatbelt_latched: bool,
    /// Stability control has been switched off
    pub esp_disabled: bool,
    /// Steering rack refuses assist below its mechanical speed threshold
    pub low_speed_lockout: bool,

    /// All expected bus messages were seen recently
    pub comm_valid: bool,
}

/// Decoded-signal snapshot handed in by the signal bus collaborator
///
/// Raw counters and brand-unit values, one set per cycle. The normalizer
/// turns this into a [`VehicleState`]; nothing here is interpreted further
/// upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalSnapshot {
    /// Wheel speeds in km/h as reported on the bus
    pub wheel_speed_fl: f64,
    pub wheel_speed_fr: f64,
    pub wheel_speed_rl: f64,
    pub wheel_speed_rr: f64,

    /// Raw gas pedal counter (0..=255 over full travel)
    pub gas_counter: u16,
    /// Gas pedal switch counter, non-zero while the pedal is touched
    pub pedal_gas: u16,
    /// Driver brake input amount (brand units)
    pub user_brake: f64,
    /// Raw brake switch signal, non-zero while braking
    pub brake_signal: u8,

    /// Raw gear selector code (brand specific)
    pub gear_code: u8,

    /// Steering wheel angle in degrees
    pub steering_angle: f64,
    /// Steering wheel rate in degrees per second
    pub steering_rate: f64,
    pub steer_override: bool,
    pub steer_fault: bool,
    pub low_speed_lockout: bool,

    /// Cruise status word, non-zero when cruise is engaged
    pub cruise_status: u8,
    /// Cruise target speed in km/h
    pub cruise_speed: f64,
    /// Main cruise switch
    pub main_on: bool,

    pub left_blinker: bool,
    pub right_blinker: bool,
    pub doors_closed: bool,
    pub seatbelt_latched: bool,
    pub esp_disabled: bool,

    /// All expected bus messages were seen recently
    pub comm_valid: bool,
}

/// Safety/control event kinds
///
/// Closed enumeration: every condition the engine can report. Events gate
/// enable/disable decisions downstream; this layer only enumerates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    CommIssue,
    WrongGear,
    DoorOpen,
    SeatbeltNotLatched,
    EspDisabled,
    WrongCarMode,
    ReverseGear,
    SteerTempUnavailable,
    LowSpeedLockout,
    SpeedTooLow,
    ManualRestart,
    PcmEnable,
    PcmDisable,
    PedalPressed,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::CommIssue => "commIssue",
            EventKind::WrongGear => "wrongGear",
            EventKind::DoorOpen => "doorOpen",
            EventKind::SeatbeltNotLatched => "seatbeltNotLatched",
            EventKind::EspDisabled => "espDisabled",
            EventKind::WrongCarMode => "wrongCarMode",
            EventKind::ReverseGear => "reverseGear",
            EventKind::SteerTempUnavailable => "steerTempUnavailable",
            EventKind::LowSpeedLockout => "lowSpeedLockout",
            EventKind::SpeedTooLow => "speedTooLow",
            EventKind::ManualRestart => "manualRestart",
            EventKind::PcmEnable => "pcmEnable",
            EventKind::PcmDisable => "pcmDisable",
            EventKind::PedalPressed => "pedalPressed",
        };
        write!(f, "{}", name)
    }
}

/// Bit-set of event type flags
///
/// Flags classify how an event affects the enable state machine downstream.
/// Several flags may be set on one event; conflicting combinations across a
/// cycle are not prioritized here.
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventFlags(u8);

impl EventFlags {
    /// Blocks engaging while present
    pub const NO_ENTRY: EventFlags = EventFlags(1 << 0);
    /// Disengage with a grace period
    pub const SOFT_DISABLE: EventFlags = EventFlags(1 << 1);
    /// Disengage immediately
    pub const IMMEDIATE_DISABLE: EventFlags = EventFlags(1 << 2);
    /// Driver-initiated disengage
    pub const USER_DISABLE: EventFlags = EventFlags(1 << 3);
    /// Engage request
    pub const ENABLE: EventFlags = EventFlags(1 << 4);
    /// Driver alert only
    pub const WARNING: EventFlags = EventFlags(1 << 5);
    /// Keep controls primed without engaging
    pub const PRE_ENABLE: EventFlags = EventFlags(1 << 6);

    pub const fn empty() -> Self {
        EventFlags(0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every flag in `other` is set in `self`
    pub const fn contains(self, other: EventFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for EventFlags {
    type Output = EventFlags;

    fn bitor(self, rhs: EventFlags) -> EventFlags {
        EventFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for EventFlags {
    fn bitor_assign(&mut self, rhs: EventFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for EventFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(EventFlags, &str); 7] = [
            (EventFlags::NO_ENTRY, "NO_ENTRY"),
            (EventFlags::SOFT_DISABLE, "SOFT_DISABLE"),
            (EventFlags::IMMEDIATE_DISABLE, "IMMEDIATE_DISABLE"),
            (EventFlags::USER_DISABLE, "USER_DISABLE"),
            (EventFlags::ENABLE, "ENABLE"),
            (EventFlags::WARNING, "WARNING"),
            (EventFlags::PRE_ENABLE, "PRE_ENABLE"),
        ];
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }
        if first {
            write!(f, "(empty)")?;
        }
        Ok(())
    }
}

/// One safety/control event for the current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub kind: EventKind,
    pub flags: EventFlags,
}

impl EventRecord {
    pub fn new(kind: EventKind, flags: EventFlags) -> Self {
        Self { kind, flags }
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{:?}]", self.kind, self.flags)
    }
}

/// Driver control surfaces reported as button transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ButtonKind {
    LeftBlinker,
    RightBlinker,
}

impl fmt::Display for ButtonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ButtonKind::LeftBlinker => "leftBlinker",
            ButtonKind::RightBlinker => "rightBlinker",
        };
        write!(f, "{}", name)
    }
}

/// Button transition event, emitted on either edge with no debounce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonEvent {
    pub kind: ButtonKind,
    pub pressed: bool,
}

/// Actuator targets forwarded to the actuation channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Actuators {
    /// Steering torque fraction, -1.0..=1.0
    pub steer: f64,
    /// Gas fraction, 0.0..=1.0
    pub gas: f64,
    /// Brake fraction, 0.0..=1.0
    pub brake: f64,
}

/// Alert flags forwarded to the actuation channel for HUD display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertFlags {
    pub visual_alert: bool,
    pub audible_alert: bool,
}

/// Per-cycle command from the controls layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarCommand {
    /// Assisted driving is currently engaged
    pub enabled: bool,
    pub actuators: Actuators,
    /// Request the powertrain to drop out of cruise
    pub cruise_cancel: bool,
    pub alerts: AlertFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_flags_combine_and_contain() {
        let flags = EventFlags::NO_ENTRY | EventFlags::SOFT_DISABLE;
        assert!(flags.contains(EventFlags::NO_ENTRY));
        assert!(flags.contains(EventFlags::SOFT_DISABLE));
        assert!(!flags.contains(EventFlags::IMMEDIATE_DISABLE));
        assert!(flags.contains(EventFlags::NO_ENTRY | EventFlags::SOFT_DISABLE));
        assert!(EventFlags::empty().is_empty());
    }

    #[test]
    fn test_event_flags_debug_names() {
        let flags = EventFlags::NO_ENTRY | EventFlags::USER_DISABLE;
        assert_eq!(format!("{:?}", flags), "NO_ENTRY|USER_DISABLE");
        assert_eq!(format!("{:?}", EventFlags::empty()), "(empty)");
    }

    #[test]
    fn test_event_kind_display() {
        assert_eq!(format!("{}", EventKind::CommIssue), "commIssue");
        assert_eq!(
            format!("{}", EventKind::SeatbeltNotLatched),
            "seatbeltNotLatched"
        );
        assert_eq!(format!("{}", EventKind::PcmEnable), "pcmEnable");
    }

    #[test]
    fn test_wheel_speeds_mean() {
        let speeds = WheelSpeeds {
            fl: 10.0,
            fr: 10.0,
            rl: 12.0,
            rr: 8.0,
        };
        assert_eq!(speeds.mean(), 10.0);
    }

    #[test]
    fn test_can_frame_roundtrip_json() {
        let frame = CanFrame::new(1024, 0, 5);
        let json = serde_json::to_string(&frame).unwrap();
        let back: CanFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(frame, back);
    }
}
