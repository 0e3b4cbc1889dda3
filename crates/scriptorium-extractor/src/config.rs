//! Configuration for the Chunker and the Extractor

use serde::{Deserialize, Serialize};

/// Configuration for the Chunker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Maximum unit size (bytes of UTF-8 text)
    pub max_unit_chars: usize,

    /// Detected headings closer than this to the previous one are ignored
    pub min_boundary_gap: usize,
}

impl ChunkerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_unit_chars < 64 {
            return Err("max_unit_chars must be at least 64".to_string());
        }
        Ok(())
    }

    /// Aggressive preset: small units for small-context models
    pub fn aggressive() -> Self {
        Self {
            max_unit_chars: 6_000,
            ..Self::default()
        }
    }

    /// Lenient preset: large units for long-context models
    pub fn lenient() -> Self {
        Self {
            max_unit_chars: 24_000,
            ..Self::default()
        }
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_unit_chars: 12_000,
            min_boundary_gap: 50,
        }
    }
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum unit text sent in an extraction prompt (bytes)
    pub prompt_text_limit: usize,

    /// Supporting-text excerpt length in the chain prompt (chars)
    pub chain_excerpt_chars: usize,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.prompt_text_limit == 0 {
            return Err("prompt_text_limit must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Aggressive preset: shorter prompts
    pub fn aggressive() -> Self {
        Self {
            prompt_text_limit: 6_000,
            chain_excerpt_chars: 100,
        }
    }

    /// Lenient preset: more context per prompt
    pub fn lenient() -> Self {
        Self {
            prompt_text_limit: 24_000,
            chain_excerpt_chars: 400,
        }
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

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            prompt_text_limit: 12_000,
            chain_excerpt_chars: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs_are_valid() {
        assert!(ChunkerConfig::default().validate().is_ok());
        assert!(ChunkerConfig::aggressive().validate().is_ok());
        assert!(ChunkerConfig::lenient().validate().is_ok());
        assert!(ExtractorConfig::default().validate().is_ok());
        assert!(ExtractorConfig::aggressive().validate().is_ok());
        assert!(ExtractorConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_unit_size() {
        let config = ChunkerConfig {
            max_unit_chars: 10,
            ..ChunkerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::lenient();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }
}
