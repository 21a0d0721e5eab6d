//! Car Interface Library
//!
//! Vehicle identification and per-cycle state/event derivation for a
//! driver-assistance stack.
//!
//! # Architecture
//!
//! This library is intentionally minimal and focused on two jobs:
//! - Identifying an unknown vehicle model from observed bus traffic by
//!   fingerprint elimination
//! - Turning each cycle's decoded-signal snapshot into a canonical
//!   [`VehicleState`] plus the safety/control events that gate whether
//!   assisted driving may engage
//!
//! The library does NOT:
//! - Decode raw CAN payloads (signals arrive as a [`SignalSnapshot`])
//! - Encode actuator wire formats (commands leave through an
//!   [`ActuationChannel`])
//! - Aggregate events into an enable/disable decision
//!
//! All higher-level functionality lives in the controls layer; the manual
//! debug harness is in car-interface-cli.
//!
//! # Example Usage
//!
//! ```no_run
//! use car_interface::{CanFrame, CarCommand, CarInterface, FingerprintTable, SignalSnapshot};
//! # use car_interface::{Actuators, AlertFlags};
//! # struct NullChannel;
//! # impl car_interface::ActuationChannel for NullChannel {
//! #     fn send(&mut self, _: u64, _: &Actuators, _: &AlertFlags, _: bool) -> car_interface::Result<()> {
//! #         Ok(())
//! #     }
//! # }
//!
//! // Identify the vehicle from startup bus traffic
//! let table = FingerprintTable::load(None).unwrap();
//! let frames = vec![CanFrame::new(36, 0, 8)];
//! let ident = table.identify(frames, 100).unwrap();
//!
//! // Run the control loop
//! let mut interface = CarInterface::from_identification(&ident, NullChannel).unwrap();
//! let snapshot = SignalSnapshot::default();
//! let command = CarCommand::default();
//! let out = interface.update(&snapshot, &command);
//! for event in &out.events {
//!     println!("{}", event);
//! }
//! interface.apply(&command).unwrap();
//! ```

// Public modules
pub mod events;
pub mod fingerprint;
pub mod interface;
pub mod params;
pub mod registry;
pub mod state;
pub mod types;

// Re-export main types for convenience
pub use events::{compute_events, CycleMemory, COMM_INVALID_THRESHOLD};
pub use fingerprint::{CandidateSet, FingerprintSample, FingerprintTable, Identification};
pub use interface::{ActuationChannel, CarInterface, CycleOutput};
pub use params::{ActuationCurve, CarParams, EcuKind};
pub use registry::{brand_for, BrandInterface};
pub use state::{normalize, SpeedFilter};
pub use types::{
    Actuators, AlertFlags, ButtonEvent, ButtonKind, CanFrame, CarCommand, CarInterfaceError,
    CruiseState, EventFlags, EventKind, EventRecord, GearShifter, Result, SignalSnapshot,
    VehicleState, WheelSpeeds,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: the built-in table knows the supported models
        let table = FingerprintTable::builtin();
        assert_eq!(table.all_known_cars().len(), 4);
    }
}
