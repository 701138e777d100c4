use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::question::QuizMode;
use crate::quran::{DEFAULT_API_BASE, DEFAULT_EDITION};
use crate::range::RangePreset;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub api_base: Option<String>,
    pub edition: Option<String>,
    pub mode: Option<String>,
    pub range: Option<String>,
    pub custom_min: Option<String>,
    pub custom_max: Option<String>,
    pub timer_seconds: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    pub fn edition(&self) -> &str {
        self.edition.as_deref().unwrap_or(DEFAULT_EDITION)
    }

    /// Saved quiz mode; unknown tags fall back to the default mode
    pub fn quiz_mode(&self) -> QuizMode {
        self.mode
            .as_deref()
            .and_then(QuizMode::from_str)
            .unwrap_or_default()
    }

    pub fn range_preset(&self) -> RangePreset {
        self.range
            .as_deref()
            .and_then(RangePreset::from_str)
            .unwrap_or_default()
    }

    pub fn timer_seconds(&self) -> u64 {
        self.timer_seconds.unwrap_or(0)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("quran-flashcards").join("config.json"))
    }
}
