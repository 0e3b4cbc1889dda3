//! Synthesizer configuration

use serde::{Deserialize, Serialize};

/// Configuration for global deduplication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Minimum similarity ratio (0.0-1.0) for two supporting texts of the
    /// same chapter to count as duplicates. `1.0` means normalized equality;
    /// lower values enable character-level fuzzy matching.
    pub similarity_threshold: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 1.0,
        }
    }
}

impl SynthesisConfig {
    /// Fuzzy preset: near-identical quotes are merged
    pub fn fuzzy() -> Self {
        Self {
            similarity_threshold: 0.9,
        }
    }

    /// Whether fuzzy matching is enabled
    pub fn is_fuzzy(&self) -> bool {
        self.similarity_threshold < 1.0
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.5..=1.0).contains(&self.similarity_threshold) {
            return Err("similarity_threshold must be between 0.5 and 1.0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
