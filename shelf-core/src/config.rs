//! Pipeline configuration

use crate::error::{Result, ShelfError};
use crate::image::{
    GateOptions, RetryPolicy, BOOK_COVER_FALLBACKS, DEFAULT_PROVIDER_HOSTS, DEFAULT_QUALITY,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for the image pipeline. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub retry: RetryPolicy,
    pub gate: GateOptions,
    pub default_quality: u8,
    pub provider_hosts: Vec<String>,
    pub fallback_images: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            gate: GateOptions::default(),
            default_quality: DEFAULT_QUALITY,
            provider_hosts: DEFAULT_PROVIDER_HOSTS.iter().map(|s| s.to_string()).collect(),
            fallback_images: BOOK_COVER_FALLBACKS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Parse from a JSON document
    pub fn from_json(data: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.default_quality > 100 {
            return Err(ShelfError::Config(format!(
                "default_quality must be 0-100, got {}",
                self.default_quality
            )));
        }
        if self.fallback_images.is_empty() {
            return Err(ShelfError::Config("fallback_images is empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.gate.threshold) {
            return Err(ShelfError::Config(format!(
                "gate.threshold must be 0-1, got {}",
                self.gate.threshold
            )));
        }
        Ok(())
    }
}
