//! Application Configuration
//!
//! Recognizer settings, jurisdiction rule tables and OCR backend selection,
//! stored in TOML format. Every section is optional in the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::plate::PlateRules;

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Candidate search settings
    pub recognizer: RecognizerConfig,
    /// Ignore list and ambiguity table
    pub rules: PlateRules,
    /// OCR backend settings
    pub ocr: OcrSettings,
}

/// Candidate search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Minimum fragment confidence for the pair and single-token strategies (0.0 - 1.0)
    pub min_confidence: f64,
    /// Maximum horizontal gap between fragments of one group, in pixels.
    /// Kept for compatibility; fragments are currently treated individually.
    pub max_horizontal_gap: f32,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            max_horizontal_gap: 40.0,
        }
    }
}

/// OCR backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackend {
    /// External detector program
    #[default]
    Command,
    /// `<image>.json` files saved next to each image
    Sidecar,
}

/// OCR backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Backend to use
    pub backend: OcrBackend,
    /// Detector program (command backend only)
    pub program: Option<String>,
    /// Extra arguments placed before `--image`
    pub args: Vec<String>,
    /// Language passed to the detector
    pub language: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            backend: OcrBackend::Command,
            program: None,
            args: Vec::new(),
            language: "es".to_string(),
        }
    }
}

impl AppConfig {
    /// Clamp values into their valid ranges
    pub fn sanitized(mut self) -> Self {
        let confidence = self.recognizer.min_confidence;
        self.recognizer.min_confidence = if confidence.is_nan() {
            RecognizerConfig::default().min_confidence
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(config.sanitized())
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load configuration from `path` when it exists, defaults otherwise
pub fn load_or_default(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let config = load_config(path)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    } else {
        info!("Using default configuration");
        Ok(AppConfig::default())
    }
}
