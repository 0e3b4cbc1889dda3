//! OpenAI-compatible provider
//!
//! Uses the chat completions endpoint with the `json_object` response
//! format. Works with any server exposing the same API (vLLM, LM Studio,
//! proxies) through `base_url`.

use crate::LlmError;
use async_trait::async_trait;
use scriptorium_domain::traits::LlmProvider;
use serde::{Deserialize, Serialize};

/// Default OpenAI API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default environment variable holding the API key
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Chat completions provider
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    response_format: ResponseFormat,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

impl OpenAiProvider {
    /// Create a provider with an explicit API key
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.0,
            client: reqwest::Client::new(),
        }
    }

    /// Create a provider reading the API key from an environment variable
    pub fn from_env(var: &str, model: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = std::env::var(var)
            .map_err(|_| LlmError::Configuration(format!("{} not set", var)))?;
        Ok(Self::new(api_key, model))
    }

    /// Set a custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the sampling temperature (default 0.0)
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, system: &str, prompt: &str) -> Result<String, Self::Error> {
        let request = ChatRequest {
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
            temperature: self.temperature,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Communication(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("No content in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let provider = OpenAiProvider::new("sk-test", "gpt-4o-mini")
            .with_base_url("http://localhost:8000/v1/")
            .with_temperature(0.2);
        assert_eq!(provider.base_url, "http://localhost:8000/v1");
        assert_eq!(provider.model_name(), "gpt-4o-mini");
        assert_eq!(provider.temperature, 0.2);
    }

    #[test]
    fn test_from_env_missing_key() {
        let result = OpenAiProvider::from_env("SCRIPTORIUM_TEST_UNSET_KEY", "gpt-4o");
        assert!(matches!(result, Err(LlmError::Configuration(_))));
    }

    #[test]
    fn test_request_asks_for_json() {
        let request = ChatRequest {
            model: "m",
            messages: vec![],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
    }
}
