//! Safety event derivation
//!
//! The per-cycle event engine: a pure function of the current vehicle state,
//! the previous cycle's latched memory, the driver command and the static
//! capability params. Every rule is evaluated independently each cycle;
//! nothing is latched across cycles except through [`CycleMemory`], and no
//! event persists implicitly. The engine enumerates conditions, it does not
//! prioritize them - disable-decision aggregation is a downstream concern.

use crate::params::CarParams;
use crate::state::STANDSTILL_SPEED;
use crate::types::{
    ButtonEvent, ButtonKind, CarCommand, EventFlags, EventKind, EventRecord, GearShifter,
    VehicleState,
};

/// Consecutive invalid-communication cycles before commIssue fires
pub const COMM_INVALID_THRESHOLD: u32 = 5;

/// Commanded gas above this margin cancels a too-slow engagement. Margin
/// avoids false cancellation from actuator dribble while stopping.
pub const GAS_CANCEL_MARGIN: f64 = 0.1;

/// Values latched from the immediately preceding cycle
///
/// Owned exclusively by the facade and advanced exactly once at the end of
/// every cycle, regardless of which events fired. Edge detection always
/// compares against these, never against older history.
#[derive(Debug, Clone, Default)]
pub struct CycleMemory {
    pub left_blinker: bool,
    pub right_blinker: bool,
    pub gas_pressed: bool,
    pub brake_pressed: bool,
    pub cruise_enabled: bool,
    /// Consecutive cycles with invalid communication, as of last cycle
    pub comm_invalid_count: u32,
    /// Cycles completed so far
    pub cycle: u64,
}

impl CycleMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalid-communication streak including the current cycle. Resets to
    /// zero the cycle communication becomes valid again.
    fn comm_invalid_streak(&self, comm_valid: bool) -> u32 {
        if comm_valid {
            0
        } else {
            self.comm_invalid_count + 1
        }
    }

    /// Latch the current cycle's values. Called unconditionally at end of
    /// cycle.
    pub fn advance(&mut self, state: &VehicleState) {
        self.comm_invalid_count = self.comm_invalid_streak(state.comm_valid);
        self.left_blinker = state.left_blinker;
        self.right_blinker = state.right_blinker;
        self.gas_pressed = state.gas_pressed;
        self.brake_pressed = state.brake_pressed;
        self.cruise_enabled = state.cruise.enabled;
        self.cycle += 1;
    }
}

/// Derive the cycle's safety/control events and button transitions
///
/// Pure: reads `memory`, never writes it. Rules marked with
/// `params.longitudinal_gating` only apply when this layer owns the
/// longitudinal gate (stock drive-support ECU absent).
pub fn compute_events(
    state: &VehicleState,
    memory: &CycleMemory,
    command: &CarCommand,
    params: &CarParams,
) -> (Vec<EventRecord>, Vec<ButtonEvent>) {
    let mut events = Vec::new();
    let gated = params.longitudinal_gating;

    if memory.comm_invalid_streak(state.comm_valid) >= COMM_INVALID_THRESHOLD {
        events.push(EventRecord::new(
            EventKind::CommIssue,
            EventFlags::NO_ENTRY | EventFlags::IMMEDIATE_DISABLE,
        ));
    }
    if state.gear != GearShifter::Drive && gated {
        events.push(EventRecord::new(
            EventKind::WrongGear,
            EventFlags::NO_ENTRY | EventFlags::SOFT_DISABLE,
        ));
    }
    if !state.doors_closed {
        events.push(EventRecord::new(
            EventKind::DoorOpen,
            EventFlags::NO_ENTRY | EventFlags::SOFT_DISABLE,
        ));
    }
    if !state.seatbelt_latched {
        events.push(EventRecord::new(
            EventKind::SeatbeltNotLatched,
            EventFlags::NO_ENTRY | EventFlags::SOFT_DISABLE,
        ));
    }
    if state.esp_disabled && gated {
        events.push(EventRecord::new(
            EventKind::EspDisabled,
            EventFlags::NO_ENTRY | EventFlags::SOFT_DISABLE,
        ));
    }
    if !state.cruise.available && gated {
        events.push(EventRecord::new(
            EventKind::WrongCarMode,
            EventFlags::NO_ENTRY | EventFlags::USER_DISABLE,
        ));
    }
    if state.gear == GearShifter::Reverse && gated {
        events.push(EventRecord::new(
            EventKind::ReverseGear,
            EventFlags::NO_ENTRY | EventFlags::IMMEDIATE_DISABLE,
        ));
    }
    if state.steering_fault {
        events.push(EventRecord::new(
            EventKind::SteerTempUnavailable,
            EventFlags::NO_ENTRY | EventFlags::WARNING,
        ));
    }
    if state.low_speed_lockout {
        events.push(EventRecord::new(
            EventKind::LowSpeedLockout,
            EventFlags::NO_ENTRY,
        ));
    }
    if state.speed < params.min_enable_speed && gated {
        events.push(EventRecord::new(EventKind::SpeedTooLow, EventFlags::NO_ENTRY));
        if command.actuators.gas > GAS_CANCEL_MARGIN {
            events.push(EventRecord::new(
                EventKind::SpeedTooLow,
                EventFlags::IMMEDIATE_DISABLE,
            ));
        }
        if state.speed < STANDSTILL_SPEED {
            // The driver has to get the car moving again themselves
            events.push(EventRecord::new(EventKind::ManualRestart, EventFlags::WARNING));
        }
    }

    // Engage on the powertrain's rising edge, report disengaged otherwise
    if state.cruise.enabled && !memory.cruise_enabled {
        events.push(EventRecord::new(EventKind::PcmEnable, EventFlags::ENABLE));
    } else if !state.cruise.enabled {
        events.push(EventRecord::new(
            EventKind::PcmDisable,
            EventFlags::USER_DISABLE,
        ));
    }

    // Disable on pedal rising edges, or on brake held while the car moves
    if (state.gas_pressed && !memory.gas_pressed)
        || (state.brake_pressed && (!memory.brake_pressed || state.speed > STANDSTILL_SPEED))
    {
        events.push(EventRecord::new(
            EventKind::PedalPressed,
            EventFlags::NO_ENTRY | EventFlags::USER_DISABLE,
        ));
    }
    if state.gas_pressed {
        events.push(EventRecord::new(
            EventKind::PedalPressed,
            EventFlags::PRE_ENABLE,
        ));
    }

    let mut buttons = Vec::new();
    if state.left_blinker != memory.left_blinker {
        buttons.push(ButtonEvent {
            kind: ButtonKind::LeftBlinker,
            pressed: state.left_blinker,
        });
    }
    if state.right_blinker != memory.right_blinker {
        buttons.push(ButtonEvent {
            kind: ButtonKind::RightBlinker,
            pressed: state.right_blinker,
        });
    }

    (events, buttons)
}
