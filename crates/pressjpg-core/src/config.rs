//! Compressor settings.
//!
//! Settings arrive from the presentation layer as JSON (or, in the browser,
//! as a plain JS object). Every field has a default, so `{}` is a valid
//! configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::DEFAULT_HEIC_QUALITY_PERCENT;
use crate::tier::{Quality, Tier};

/// Errors from loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON could not be parsed into settings.
    #[error("Invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its allowed range.
    #[error("Invalid setting {field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}

/// Settings for the batch orchestrator and engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressorConfig {
    /// Tier applied to newly submitted files.
    pub tier: Tier,
    /// Hand each result to the delivery sink as soon as it is ready.
    pub auto_download: bool,
    /// Delay between consecutive deliveries of "download all".
    pub download_stagger_ms: u64,
    /// Quality of the HEIC to JPEG conversion step, in (0, 1].
    pub heic_conversion_quality: f32,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            tier: Tier::default(),
            auto_download: true,
            download_stagger_ms: 300,
            heic_conversion_quality: f32::from(DEFAULT_HEIC_QUALITY_PERCENT) / 100.0,
        }
    }
}

impl CompressorConfig {
    /// Parse and validate settings from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let q = self.heic_conversion_quality;
        if !(q > 0.0 && q <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "heicConversionQuality",
                reason: format!("{} is not in (0, 1]", q),
            });
        }
        Ok(())
    }

    /// Builder-style tier override.
    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    /// Builder-style auto-download override.
    pub fn with_auto_download(mut self, enabled: bool) -> Self {
        self.auto_download = enabled;
        self
    }

    /// Builder-style stagger override.
    pub fn with_download_stagger(mut self, stagger: Duration) -> Self {
        self.download_stagger_ms = u64::try_from(stagger.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn download_stagger(&self) -> Duration {
        Duration::from_millis(self.download_stagger_ms)
    }

    pub fn heic_quality(&self) -> Quality {
        Quality::from_fraction(self.heic_conversion_quality)
    }
}
