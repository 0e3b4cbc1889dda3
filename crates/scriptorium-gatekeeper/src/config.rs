//! Gatekeeper configuration

use serde::{Deserialize, Serialize};

/// Configuration for validation rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject theses whose supporting text cannot be found in their unit
    pub verify_supporting_text: bool,

    /// Minimum supporting text length in chars (0 disables the check)
    pub min_supporting_text_chars: usize,

    /// Confidence assigned to theses that omit one
    pub default_confidence: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            verify_supporting_text: true,
            min_supporting_text_chars: 0,
            default_confidence: 0.8,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (structural checks only)
    pub fn permissive() -> Self {
        Self {
            verify_supporting_text: false,
            ..Self::default()
        }
    }

    /// Create a strict configuration
    pub fn strict() -> Self {
        Self {
            verify_supporting_text: true,
            min_supporting_text_chars: 20,
            default_confidence: 0.5,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.default_confidence) {
            return Err("default_confidence must be between 0.0 and 1.0".to_string());
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidationConfig::default();
        assert!(config.verify_supporting_text);
        assert_eq!(config.default_confidence, 0.8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_permissive_config() {
        let config = ValidationConfig::permissive();
        assert!(!config.verify_supporting_text);
        assert_eq!(config.min_supporting_text_chars, 0);
    }

    #[test]
    fn test_strict_config() {
        let config = ValidationConfig::strict();
        assert_eq!(config.min_supporting_text_chars, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_default_confidence() {
        let config = ValidationConfig {
            default_confidence: 1.5,
            ..ValidationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ValidationConfig::from_toml("verify_supporting_text = false").unwrap();
        assert!(!config.verify_supporting_text);
        assert_eq!(config.default_confidence, 0.8);
    }
}
