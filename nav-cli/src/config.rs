//! Config file loading: TOML or JSON, selected by file extension — a file
//! is optional, every field defaults per its own crate.

use std::path::Path;

use anyhow::{bail, Context, Result};
use nav_env::{EnvConfig, RewardConfig};
use nav_mask::MaskConfig;
use nav_normalize::NormalizerConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default)]
    pub env: EnvConfig,
    #[serde(default)]
    pub reward: RewardConfig,
    #[serde(default)]
    pub mask: MaskConfig,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
}

impl DemoConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&text).with_context(|| format!("parsing TOML config {}", path.display())),
            Some("json") => serde_json::from_str(&text).with_context(|| format!("parsing JSON config {}", path.display())),
            other => bail!("unsupported config extension {other:?}, expected .toml or .json"),
        }
    }
}
