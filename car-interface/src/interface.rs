//! Car interface facade
//!
//! Composes the normalizer, the speed filter and the event engine into the
//! two entry points the control loop calls once per cycle: `update` then
//! `apply`. One facade instance owns all mutable per-cycle state
//! ([`CycleMemory`], the speed filter, the actuation frame counter); cycles
//! execute strictly sequentially, so no locking is involved.

use crate::events::{compute_events, CycleMemory};
use crate::fingerprint::Identification;
use crate::params::CarParams;
use crate::registry::{brand_for, BrandInterface};
use crate::state::{normalize, SpeedFilter};
use crate::types::{
    Actuators, AlertFlags, ButtonEvent, CarCommand, EventRecord, Result, SignalSnapshot,
    VehicleState,
};

/// Output collaborator accepting actuator targets and alert flags
///
/// Wire encoding is out of scope here; implementations bridge to the real
/// actuation hardware or to a test recorder.
pub trait ActuationChannel {
    fn send(
        &mut self,
        frame: u64,
        actuators: &Actuators,
        alerts: &AlertFlags,
        cruise_cancel: bool,
    ) -> Result<()>;
}

/// Result of one `update` call: the canonical state plus the cycle's events
#[derive(Debug, Clone)]
pub struct CycleOutput {
    pub state: VehicleState,
    pub events: Vec<EventRecord>,
    pub button_events: Vec<ButtonEvent>,
}

/// Per-vehicle facade over the identification result
pub struct CarInterface<C> {
    brand: &'static dyn BrandInterface,
    params: CarParams,
    memory: CycleMemory,
    speed_filter: SpeedFilter,
    /// Frames pushed to the actuation channel so far
    apply_frame: u64,
    channel: C,
}

impl<C: ActuationChannel> CarInterface<C> {
    /// Build a facade from already-derived params
    pub fn new(params: CarParams, channel: C) -> Result<Self> {
        let brand = brand_for(&params.model)?;
        Ok(Self {
            brand,
            params,
            memory: CycleMemory::new(),
            speed_filter: SpeedFilter::new(),
            apply_frame: 0,
            channel,
        })
    }

    /// Build a facade straight from a successful identification
    pub fn from_identification(ident: &Identification, channel: C) -> Result<Self> {
        let brand = brand_for(&ident.model)?;
        let params = brand.derive_params(&ident.model, &ident.sample)?;
        Self::new(params, channel)
    }

    pub fn params(&self) -> &CarParams {
        &self.params
    }

    pub fn memory(&self) -> &CycleMemory {
        &self.memory
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Run one control cycle over a fresh signal snapshot
    ///
    /// Normalizes the snapshot, refines speed/accel through the filter,
    /// derives the cycle's events against last cycle's memory, then latches
    /// the memory. Must be called exactly once per cycle before `apply`.
    pub fn update(&mut self, snapshot: &SignalSnapshot, command: &CarCommand) -> CycleOutput {
        let mut state = normalize(snapshot, self.brand);
        let (speed, accel) = self.speed_filter.update(state.speed_raw);
        state.speed = speed;
        state.accel = accel;

        let (events, button_events) = compute_events(&state, &self.memory, command, &self.params);
        if !events.is_empty() {
            log::debug!(
                "cycle {}: {} event(s)",
                self.memory.cycle,
                events.len()
            );
        }
        self.memory.advance(&state);

        CycleOutput {
            state,
            events,
            button_events,
        }
    }

    /// Forward the command to the actuation channel
    ///
    /// Channel failures propagate; the frame counter only advances on a
    /// frame the channel accepted.
    pub fn apply(&mut self, command: &CarCommand) -> Result<()> {
        self.channel.send(
            self.apply_frame,
            &command.actuators,
            &command.alerts,
            command.cruise_cancel,
        )?;
        self.apply_frame += 1;
        Ok(())
    }
}
