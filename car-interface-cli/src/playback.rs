//! Recorded input loading
//!
//! The harness replays two kinds of JSON recordings: raw frame logs for the
//! identification phase and per-cycle signal snapshots (optionally paired
//! with a controls command) for the driving phase.

use anyhow::{Context, Result};
use car_interface::{CanFrame, CarCommand, SignalSnapshot};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One control cycle of recorded input
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackCycle {
    pub snapshot: SignalSnapshot,
    /// Controls command for the cycle; defaults to all-off
    #[serde(default)]
    pub command: CarCommand,
}

/// Load a JSON frame log (array of frames) for identification
pub fn load_frames(path: &Path) -> Result<Vec<CanFrame>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read frame log: {:?}", path))?;
    let frames: Vec<CanFrame> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse frame log: {:?}", path))?;
    log::info!("loaded {} frames from {:?}", frames.len(), path);
    Ok(frames)
}

/// Load a JSON snapshot playback (array of cycles)
pub fn load_playback(path: &Path) -> Result<Vec<PlaybackCycle>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read playback: {:?}", path))?;
    let cycles: Vec<PlaybackCycle> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse playback: {:?}", path))?;
    log::info!("loaded {} cycles from {:?}", cycles.len(), path);
    Ok(cycles)
}
