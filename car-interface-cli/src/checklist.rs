//! Manual state-observation checklist
//!
//! For bench-testing a new car port: the operator works through the car's
//! controls in a fixed order (buckle/unbuckle, pedals, steering, blinkers,
//! doors) while the harness replays or streams cycles and confirms that
//! each expected observation actually shows up in the derived output.

use car_interface::{ButtonKind, CycleOutput, EventKind};

type Check = fn(&CycleOutput) -> bool;

const STEPS: &[(&str, Check)] = &[
    ("seatbeltNotLatched event", |out| {
        out.events
            .iter()
            .any(|e| e.kind == EventKind::SeatbeltNotLatched)
    }),
    ("gas pressed", |out| out.state.gas_pressed),
    ("brake pressed", |out| out.state.brake_pressed),
    ("steering override", |out| out.state.steering_pressed),
    ("leftBlinker button", |out| {
        out.button_events
            .iter()
            .any(|b| b.kind == ButtonKind::LeftBlinker && b.pressed)
    }),
    ("rightBlinker button", |out| {
        out.button_events
            .iter()
            .any(|b| b.kind == ButtonKind::RightBlinker && b.pressed)
    }),
    ("doorOpen event", |out| {
        out.events.iter().any(|e| e.kind == EventKind::DoorOpen)
    }),
];

/// Tracks progress through the observation steps
pub struct Checklist {
    position: usize,
}

impl Checklist {
    pub fn new() -> Self {
        Self { position: 0 }
    }

    /// Feed one cycle's output; returns the step names completed by it.
    /// A single cycle may satisfy several consecutive steps.
    pub fn observe(&mut self, out: &CycleOutput) -> Vec<&'static str> {
        let mut completed = Vec::new();
        while let Some((name, check)) = STEPS.get(self.position) {
            if !check(out) {
                break;
            }
            completed.push(*name);
            self.position += 1;
        }
        completed
    }

    /// Step currently waited on, if any remain
    pub fn current(&self) -> Option<&'static str> {
        STEPS.get(self.position).map(|(name, _)| *name)
    }

    pub fn is_done(&self) -> bool {
        self.position >= STEPS.len()
    }

    pub fn total() -> usize {
        STEPS.len()
    }
}

impl Default for Checklist {
    fn default() -> Self {
        Self::new()
    }
}
