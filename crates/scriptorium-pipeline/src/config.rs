//! Configuration for a pipeline run
//!
//! Collects the settings of every stage in one document so a run can be
//! described by a single TOML file.

use scriptorium_extractor::{ChunkerConfig, ExtractorConfig};
use scriptorium_gatekeeper::ValidationConfig;
use scriptorium_llm::{BackendConfig, GatewayConfig};
use scriptorium_synthesizer::SynthesisConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the pipeline
///
/// # Examples
///
/// ```
/// use scriptorium_pipeline::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.max_concurrency, 4);
///
/// // One unit at a time, for rate-limited backends
/// let config = PipelineConfig::sequential();
/// assert_eq!(config.max_concurrency, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of unit extractions in flight
    pub max_concurrency: usize,

    /// Root directory of the unit cache
    pub cache_dir: PathBuf,

    /// Where to write the knowledge base as JSON, if anywhere
    pub output_path: Option<PathBuf>,

    /// Generation backend
    pub backend: BackendConfig,

    /// Chunking
    pub chunker: ChunkerConfig,

    /// Prompt construction
    pub extractor: ExtractorConfig,

    /// Retry and timeout policy of every generation call
    pub gateway: GatewayConfig,

    /// Record validation
    pub validation: ValidationConfig,

    /// Deduplication and resolution
    pub synthesis: SynthesisConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            cache_dir: PathBuf::from(".scriptorium/cache"),
            output_path: None,
            backend: BackendConfig::default(),
            chunker: ChunkerConfig::default(),
            extractor: ExtractorConfig::default(),
            gateway: GatewayConfig::default(),
            validation: ValidationConfig::default(),
            synthesis: SynthesisConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Sequential preset: one generation call at a time, lenient timeouts
    pub fn sequential() -> Self {
        Self {
            max_concurrency: 1,
            gateway: GatewayConfig::lenient(),
            ..Self::default()
        }
    }

    /// Validate this configuration and every nested one
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".to_string());
        }
        if self.cache_dir.as_os_str().is_empty() {
            return Err("cache_dir must not be empty".to_string());
        }
        self.backend
            .validate()
            .map_err(|e| format!("backend: {}", e))?;
        self.chunker
            .validate()
            .map_err(|e| format!("chunker: {}", e))?;
        self.extractor
            .validate()
            .map_err(|e| format!("extractor: {}", e))?;
        self.gateway
            .validate()
            .map_err(|e| format!("gateway: {}", e))?;
        self.validation
            .validate()
            .map_err(|e| format!("validation: {}", e))?;
        self.synthesis
            .validate()
            .map_err(|e| format!("synthesis: {}", e))?;
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
