//! Vehicle model fingerprinting
//!
//! Identifies an unknown vehicle model from observed bus traffic by
//! elimination: every model has a reference table of bus address -> expected
//! payload length, and a candidate survives a frame only if its table agrees
//! with what was observed. The table is process-wide, loaded once at startup
//! (optionally merged with a private extension file) and never mutated
//! afterwards.
//!
//! The matcher has no internal timeout. Identification must be bounded by
//! the caller; [`FingerprintTable::identify`] packages that bound as an
//! explicit frame budget. Eliminating every candidate is a legitimate
//! outcome (unknown or malformed vehicle) and is surfaced as an error, never
//! guessed around.

use crate::types::{CanFrame, CarInterfaceError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

mod data;

pub use data::{ACURA_ILX, HONDA_CIVIC, HONDA_CRV, TOYOTA_RAV4};

/// Set of model names still compatible with the traffic observed so far.
/// Shrinks monotonically across elimination calls.
pub type CandidateSet = BTreeSet<String>;

/// Addresses observed during identification with their payload lengths,
/// used afterwards to probe optional-ECU presence.
pub type FingerprintSample = BTreeMap<u32, u8>;

/// Outcome of a successful identification phase
#[derive(Debug, Clone)]
pub struct Identification {
    /// The single surviving model name
    pub model: String,
    /// Main-bus traffic observed while identifying
    pub sample: FingerprintSample,
    /// Frames consumed before the model resolved
    pub frames: usize,
}

/// Immutable model -> (address -> expected payload length) reference table
#[derive(Debug, Clone)]
pub struct FingerprintTable {
    cars: HashMap<String, HashMap<u32, u8>>,
}

impl FingerprintTable {
    /// Table with only the compiled-in reference data
    pub fn builtin() -> Self {
        let cars = data::BUILTIN_FINGERPRINTS
            .iter()
            .map(|(name, entries)| (name.to_string(), entries.iter().copied().collect()))
            .collect();
        Self { cars }
    }

    /// Load the table, merging an optional JSON extension file
    ///
    /// The extension maps model names to `{ "address": length }` objects and
    /// may add new models or override entries of compiled-in ones. A missing
    /// file is not an error (the extension is private and optional); a
    /// malformed one is.
    pub fn load(extension: Option<&Path>) -> Result<Self> {
        let mut table = Self::builtin();
        if let Some(path) = extension {
            if path.exists() {
                let text = fs::read_to_string(path)?;
                table.merge_extension(&text)?;
                log::info!("merged fingerprint extension from {:?}", path);
            } else {
                log::debug!("no fingerprint extension at {:?}", path);
            }
        }
        Ok(table)
    }

    /// Merge extension JSON into the table
    ///
    /// Addresses are JSON object keys, so they arrive as strings; decimal
    /// and `0x` hex forms are accepted.
    pub fn merge_extension(&mut self, text: &str) -> Result<()> {
        let parsed: HashMap<String, HashMap<String, u8>> = serde_json::from_str(text)
            .map_err(|e| CarInterfaceError::ExtensionParse(e.to_string()))?;

        for (model, entries) in parsed {
            let fingerprint = self.cars.entry(model).or_default();
            for (key, len) in entries {
                let address = parse_address(&key)?;
                fingerprint.insert(address, len);
            }
        }
        Ok(())
    }

    /// Names of all models in the table, sorted
    pub fn all_known_cars(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cars.keys().cloned().collect();
        names.sort();
        names
    }

    /// Reference fingerprint for one model
    pub fn model_fingerprint(&self, model: &str) -> Option<&HashMap<u32, u8>> {
        self.cars.get(model)
    }

    /// Drop every candidate that could not have sent `frame`
    ///
    /// Frames with a non-zero source are echoes or ECU-presence probes and
    /// never distinguish models: the candidate set is returned unchanged.
    /// Otherwise a candidate survives iff its table records `frame.address`
    /// with exactly `frame.payload_len`. An address missing from a table is
    /// a normal elimination, not an error.
    pub fn eliminate_incompatible(
        &self,
        frame: &CanFrame,
        candidates: &CandidateSet,
    ) -> CandidateSet {
        if frame.source != 0 {
            return candidates.clone();
        }
        candidates
            .iter()
            .filter(|name| {
                self.cars
                    .get(name.as_str())
                    .and_then(|fp| fp.get(&frame.address))
                    .map(|len| *len == frame.payload_len)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Run bounded identification over a frame stream
    ///
    /// Consumes at most `max_frames` frames and stops as soon as exactly one
    /// candidate remains. Zero survivors or an exhausted budget with more
    /// than one survivor are identification failures; the control loop must
    /// not start on either.
    pub fn identify<I>(&self, frames: I, max_frames: usize) -> Result<Identification>
    where
        I: IntoIterator<Item = CanFrame>,
    {
        let mut candidates: CandidateSet = self.all_known_cars().into_iter().collect();
        let mut sample = FingerprintSample::new();
        let mut seen = 0usize;

        log::info!(
            "identifying vehicle: {} candidates, budget {} frames",
            candidates.len(),
            max_frames
        );

        for frame in frames.into_iter().take(max_frames) {
            seen += 1;
            if frame.source == 0 {
                sample.insert(frame.address, frame.payload_len);
            }
            candidates = self.eliminate_incompatible(&frame, &candidates);

            if candidates.is_empty() {
                log::warn!("all candidates eliminated after {} frames", seen);
                return Err(CarInterfaceError::FingerprintEliminated { frames: seen });
            }
            if candidates.len() == 1 {
                let model = candidates.into_iter().next().unwrap();
                log::info!("identified {} after {} frames", model, seen);
                return Ok(Identification {
                    model,
                    sample,
                    frames: seen,
                });
            }
        }

        Err(CarInterfaceError::FingerprintAmbiguous {
            frames: seen,
            candidates: candidates.into_iter().collect(),
        })
    }
}

fn parse_address(key: &str) -> Result<u32> {
    let parsed = match key.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => key.parse::<u32>(),
    };
    parsed.map_err(|_| {
        CarInterfaceError::ExtensionParse(format!("invalid address key: {:?}", key))
    })
}
