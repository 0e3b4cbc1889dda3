//! Configuration for the generation gateway and backend selection

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry and timeout policy of the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Attempts per call site, shared by timeouts and schema failures
    pub max_attempts: u32,

    /// Maximum time for a single generation call (seconds)
    pub timeout_secs: u64,

    /// Delay before the second attempt (milliseconds), doubled after each failure
    pub backoff_ms: u64,
}

impl GatewayConfig {
    /// Get the per-call timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Aggressive preset: fail fast
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 2,
            timeout_secs: 60,
            backoff_ms: 250,
        }
    }

    /// Lenient preset: slow local models
    pub fn lenient() -> Self {
        Self {
            max_attempts: 5,
            timeout_secs: 900,
            backoff_ms: 2_000,
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

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_secs: 300,
            backoff_ms: 1_000,
        }
    }
}

/// Which generation backend to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Local Ollama server
    Ollama {
        /// API endpoint
        endpoint: String,
        /// Model name
        model: String,
        /// Sampling temperature
        #[serde(default)]
        temperature: Option<f64>,
    },
    /// OpenAI-compatible chat completions API
    OpenAi {
        /// API base URL
        base_url: String,
        /// Environment variable holding the API key
        api_key_env: String,
        /// Model name
        model: String,
        /// Sampling temperature
        #[serde(default)]
        temperature: Option<f64>,
    },
    /// Scripted mock returning a fixed response
    Mock {
        /// Response to every prompt
        response: String,
    },
}

impl BackendConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let (model, temperature) = match self {
            BackendConfig::Ollama {
                endpoint,
                model,
                temperature,
            } => {
                if endpoint.trim().is_empty() {
                    return Err("endpoint must not be empty".to_string());
                }
                (model, temperature)
            }
            BackendConfig::OpenAi {
                base_url,
                api_key_env,
                model,
                temperature,
            } => {
                if base_url.trim().is_empty() {
                    return Err("base_url must not be empty".to_string());
                }
                if api_key_env.trim().is_empty() {
                    return Err("api_key_env must not be empty".to_string());
                }
                (model, temperature)
            }
            BackendConfig::Mock { .. } => return Ok(()),
        };
        if model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if let Some(t) = temperature {
            if !(0.0..=2.0).contains(t) {
                return Err("temperature must be between 0.0 and 2.0".to_string());
            }
        }
        Ok(())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Ollama {
            endpoint: crate::ollama::DEFAULT_ENDPOINT.to_string(),
            model: "qwen3:14b".to_string(),
            temperature: Some(0.1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GatewayConfig::default().validate().is_ok());
        assert!(GatewayConfig::aggressive().validate().is_ok());
        assert!(GatewayConfig::lenient().validate().is_ok());
        assert!(BackendConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_attempts() {
        let config = GatewayConfig {
            max_attempts: 0,
            ..GatewayConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_doubles() {
        let config = GatewayConfig::default();
        assert_eq!(config.backoff(1), Duration::from_millis(1_000));
        assert_eq!(config.backoff(2), Duration::from_millis(2_000));
        assert_eq!(config.backoff(3), Duration::from_millis(4_000));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = GatewayConfig::lenient();
        let toml_str = config.to_toml().unwrap();
        assert_eq!(GatewayConfig::from_toml(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = GatewayConfig::from_toml("max_attempts = 5").unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.timeout_secs, 300);
    }

    #[test]
    fn test_backend_config_from_toml() {
        let config: BackendConfig = toml::from_str(
            r#"
            kind = "open_ai"
            base_url = "https://api.openai.com/v1"
            api_key_env = "OPENAI_API_KEY"
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();
        assert!(matches!(config, BackendConfig::OpenAi { ref model, .. } if model == "gpt-4o-mini"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backend_rejects_bad_temperature() {
        let config = BackendConfig::Ollama {
            endpoint: "http://localhost:11434".into(),
            model: "m".into(),
            temperature: Some(3.0),
        };
        assert!(config.validate().is_err());
    }
}
