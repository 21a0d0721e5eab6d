//! Configuration loading and parsing

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main harness configuration (loaded from config.toml)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub identify: IdentifyConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    /// JSON frame log for the identification phase
    #[serde(default)]
    pub frame_log: Option<PathBuf>,
    /// JSON snapshot playback for the driving phase
    #[serde(default)]
    pub playback: Option<PathBuf>,
    /// Private fingerprint extension file
    #[serde(default)]
    pub extra_fingerprints: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdentifyConfig {
    /// Frame budget for identification
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,
    /// Skip identification and assume this model
    #[serde(default)]
    pub model: Option<String>,
}

impl Default for IdentifyConfig {
    fn default() -> Self {
        Self {
            max_frames: default_max_frames(),
            model: None,
        }
    }
}

fn default_max_frames() -> usize {
    1000
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Write the session report here instead of stdout
    #[serde(default)]
    pub report: Option<PathBuf>,
    /// Step through the manual observation checklist
    #[serde(default)]
    pub checklist: bool,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
