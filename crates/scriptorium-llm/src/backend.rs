//! Backend selection
//!
//! [`Backend`] wraps the concrete providers behind one type so the pipeline
//! can be built from configuration without generics leaking to callers.

use crate::{BackendConfig, LlmError, MockProvider, OllamaProvider, OpenAiProvider};
use async_trait::async_trait;
use scriptorium_domain::traits::LlmProvider;
use tracing::info;

/// A provider chosen at runtime
#[derive(Debug, Clone)]
pub enum Backend {
    /// Local Ollama server
    Ollama(OllamaProvider),
    /// OpenAI-compatible API
    OpenAi(OpenAiProvider),
    /// Scripted mock
    Mock(MockProvider),
}

impl Backend {
    /// Build the backend described by `config`
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Configuration`] when the configuration is invalid
    /// or the API key variable is not set.
    pub fn from_config(config: &BackendConfig) -> Result<Self, LlmError> {
        config.validate().map_err(LlmError::Configuration)?;
        let backend = match config {
            BackendConfig::Ollama {
                endpoint,
                model,
                temperature,
            } => {
                let mut provider = OllamaProvider::new(endpoint.clone(), model.clone());
                if let Some(t) = temperature {
                    provider = provider.with_temperature(*t);
                }
                Backend::Ollama(provider)
            }
            BackendConfig::OpenAi {
                base_url,
                api_key_env,
                model,
                temperature,
            } => {
                let mut provider = OpenAiProvider::from_env(api_key_env, model.clone())?
                    .with_base_url(base_url.clone());
                if let Some(t) = temperature {
                    provider = provider.with_temperature(*t);
                }
                Backend::OpenAi(provider)
            }
            BackendConfig::Mock { response } => Backend::Mock(MockProvider::new(response.clone())),
        };
        info!("Using generation backend {}", backend.model_name());
        Ok(backend)
    }
}

#[async_trait]
impl LlmProvider for Backend {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        match self {
            Backend::Ollama(p) => p.model_name(),
            Backend::OpenAi(p) => p.model_name(),
            Backend::Mock(p) => p.model_name(),
        }
    }

    async fn generate(&self, system: &str, prompt: &str) -> Result<String, Self::Error> {
        match self {
            Backend::Ollama(p) => p.generate(system, prompt).await,
            Backend::OpenAi(p) => p.generate(system, prompt).await,
            Backend::Mock(p) => p.generate(system, prompt).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend_from_config() {
        let backend = Backend::from_config(&BackendConfig::Mock {
            response: "{}".to_string(),
        })
        .unwrap();
        assert_eq!(backend.model_name(), "mock");
        assert_eq!(backend.generate("", "x").await.unwrap(), "{}");
    }

    #[test]
    fn test_ollama_backend_from_default_config() {
        let backend = Backend::from_config(&BackendConfig::default()).unwrap();
        assert!(matches!(backend, Backend::Ollama(_)));
        assert_eq!(backend.model_name(), "qwen3:14b");
    }

    #[test]
    fn test_openai_backend_requires_key() {
        let config = BackendConfig::OpenAi {
            base_url: "https://api.openai.com/v1".into(),
            api_key_env: "SCRIPTORIUM_TEST_MISSING_KEY".into(),
            model: "gpt-4o".into(),
            temperature: None,
        };
        assert!(matches!(
            Backend::from_config(&config),
            Err(LlmError::Configuration(_))
        ));
    }
}
