//! Ollama Provider Implementation
//!
//! Talks to a local Ollama instance through its chat API, asking for JSON
//! output. Each call is a single request: timeouts and retries are owned by
//! the [`GenerationGateway`](crate::GenerationGateway).
//!
//! # Examples
//!
//! ```no_run
//! use scriptorium_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "qwen3:14b");
//! ```

use crate::LlmError;
use async_trait::async_trait;
use scriptorium_domain::traits::LlmProvider;
use serde::{Deserialize, Serialize};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Ollama API provider for local LLM inference
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    temperature: Option<f64>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f64,
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

#[derive(Deserialize)]
struct OllamaChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "qwen3:14b")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: None,
            client: reqwest::Client::new(),
        }
    }

    /// Create a provider against the default local endpoint
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.endpoint)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, system: &str, prompt: &str) -> Result<String, Self::Error> {
        let request = OllamaChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
            format: "json",
            options: self.temperature.map(|temperature| ChatOptions { temperature }),
        };

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        Ok(body.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_provider_creation() {
        let provider = OllamaProvider::new("http://localhost:11434/", "llama3");
        assert_eq!(provider.endpoint, "http://localhost:11434");
        assert_eq!(provider.model_name(), "llama3");
        assert_eq!(provider.chat_url(), "http://localhost:11434/api/chat");
        assert!(provider.temperature.is_none());
    }

    #[test]
    fn test_ollama_provider_default_endpoint() {
        let provider = OllamaProvider::default_endpoint("mistral").with_temperature(0.1);
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.temperature, Some(0.1));
    }

    #[test]
    fn test_request_shape() {
        let request = OllamaChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            stream: false,
            format: "json",
            options: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["format"], "json");
        assert_eq!(value["stream"], false);
        assert!(value.get("options").is_none());
    }

    // Integration tests (requires running Ollama)
    #[tokio::test]
    #[ignore]
    async fn test_ollama_generate_integration() {
        let provider = OllamaProvider::default_endpoint("llama3");
        let result = provider
            .generate("Answer in JSON.", r#"Return {"ok": true}"#)
            .await;
        if let Ok(response) = result {
            assert!(!response.is_empty());
        }
    }

    #[tokio::test]
    async fn test_ollama_error_handling() {
        // Unroutable port
        let provider = OllamaProvider::new("http://127.0.0.1:1", "llama3");
        let result = provider.generate("sys", "test").await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }
}
