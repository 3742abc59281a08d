/// Tuning constants shared by all pipelines.
///
/// Changing any value changes every ciphertext, so encrypt and decrypt must
/// run with the same settings. Missing JSON fields fall back to defaults.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logistic_burn_in: usize,
    pub hopfield_burn_in: usize,
    /// Fractional memory length of the Hopfield iteration.
    pub hopfield_memory_window: usize,
    pub lasm_burn_in: usize,
    pub scl_burn_in: usize,
    pub chen_burn_in: usize,
    pub bulban_burn_in: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logistic_burn_in: 1000,
            hopfield_burn_in: 1024,
            hopfield_memory_window: 256,
            lasm_burn_in: 1024,
            scl_burn_in: 50,
            chen_burn_in: 50,
            bulban_burn_in: 64,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse settings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Self::from_json(&text)
    }
}
