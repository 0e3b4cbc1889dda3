//! Generation Gateway
//!
//! Wraps a provider with the retry-with-repair loop: every response is
//! cleaned up, parsed, and checked against the expected [`Schema`]. A
//! mismatch, a timeout or a provider error consumes one attempt out of a
//! shared budget. A schema mismatch also appends a repair instruction to
//! the next attempt.
//!
//! The gateway never touches the cache.

use crate::json::extract_json;
use crate::{GatewayConfig, GenerationError};
use scriptorium_domain::traits::LlmProvider;
use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

/// JSON kind expected for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    /// A string
    String,
    /// A number
    Number,
    /// A boolean
    Boolean,
    /// An array
    Array,
    /// An object
    Object,
}

impl JsonType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            JsonType::String => value.is_string(),
            JsonType::Number => value.is_number(),
            JsonType::Boolean => value.is_boolean(),
            JsonType::Array => value.is_array(),
            JsonType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Boolean => "boolean",
            JsonType::Array => "array",
            JsonType::Object => "object",
        })
    }
}

/// A top-level field of a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Key name
    pub name: String,
    /// Expected kind
    pub kind: JsonType,
    /// Whether the key must be present and non-null
    pub required: bool,
}

/// Expected shape of a generation response
///
/// Only the top level is checked here. Record-level soundness is the
/// validator's job.
///
/// # Examples
///
/// ```
/// use scriptorium_llm::{JsonType, Schema};
/// use serde_json::json;
///
/// let schema = Schema::new("unit_extraction")
///     .required("theses", JsonType::Array)
///     .optional("citations", JsonType::Array);
///
/// assert!(schema.check(&json!({"theses": []})).is_ok());
/// assert!(schema.check(&json!({"citations": []})).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
}

impl Schema {
    /// Create an empty object schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a required field
    pub fn required(mut self, name: impl Into<String>, kind: JsonType) -> Self {
        self.fields.push(Field {
            name: name.into(),
            kind,
            required: true,
        });
        self
    }

    /// Add an optional field
    pub fn optional(mut self, name: impl Into<String>, kind: JsonType) -> Self {
        self.fields.push(Field {
            name: name.into(),
            kind,
            required: false,
        });
        self
    }

    /// Schema name, used in logs and errors
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields of the schema
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Check a parsed response against the schema
    pub fn check(&self, value: &Value) -> Result<(), String> {
        let object = value
            .as_object()
            .ok_or_else(|| "expected a JSON object at the top level".to_string())?;
        for field in &self.fields {
            match object.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(format!("missing required field '{}'", field.name));
                }
                None | Some(Value::Null) => {}
                Some(v) if !field.kind.matches(v) => {
                    return Err(format!(
                        "field '{}' should be {} but is {}",
                        field.name,
                        field.kind,
                        kind_of(v)
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// One-line description for prompts and repair instructions
    pub fn describe(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|f| {
                format!(
                    "\"{}\" ({}, {})",
                    f.name,
                    f.kind,
                    if f.required { "required" } else { "optional" }
                )
            })
            .collect();
        format!("a single JSON object with keys {}", fields.join(", "))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A prompt: system instruction plus user message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// System instruction
    pub system: String,
    /// User message
    pub user: String,
}

impl Prompt {
    /// Create a prompt
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// A successful, schema-conforming generation
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    /// Parsed payload
    pub value: Value,
    /// Raw response text of the successful attempt
    pub raw: String,
    /// Attempts used, including the successful one
    pub attempts: u32,
}

enum Failure {
    Timeout,
    Schema(String),
    Provider(String),
}

/// Schema-enforcing wrapper around a provider
pub struct GenerationGateway<P: LlmProvider> {
    provider: P,
    config: GatewayConfig,
}

impl<P: LlmProvider> GenerationGateway<P> {
    /// Create a gateway
    pub fn new(provider: P, config: GatewayConfig) -> Self {
        Self { provider, config }
    }

    /// Borrow the wrapped provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Borrow the configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Generate a response matching `schema`
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationError`] describing the last failure once
    /// `max_attempts` attempts have failed.
    pub async fn generate(
        &self,
        prompt: &Prompt,
        schema: &Schema,
    ) -> Result<Generated, GenerationError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last = Failure::Provider("no attempt made".to_string());

        for attempt in 1..=max_attempts {
            let user = match &last {
                Failure::Schema(detail) if attempt > 1 => repair_prompt(&prompt.user, schema, detail),
                _ => prompt.user.clone(),
            };

            let outcome = tokio::time::timeout(
                self.config.timeout(),
                self.provider.generate(&prompt.system, &user),
            )
            .await;

            last = match outcome {
                Err(_) => {
                    warn!(
                        "Generation '{}' timed out after {}s (attempt {}/{})",
                        schema.name(),
                        self.config.timeout_secs,
                        attempt,
                        max_attempts
                    );
                    Failure::Timeout
                }
                Ok(Err(e)) => {
                    warn!(
                        "Provider error on '{}' (attempt {}/{}): {}",
                        schema.name(),
                        attempt,
                        max_attempts,
                        e
                    );
                    Failure::Provider(e.to_string())
                }
                Ok(Ok(raw)) => match extract_json(&raw).and_then(|v| schema.check(&v).map(|_| v)) {
                    Ok(value) => {
                        debug!(
                            "Generation '{}' succeeded on attempt {}",
                            schema.name(),
                            attempt
                        );
                        return Ok(Generated {
                            value,
                            raw,
                            attempts: attempt,
                        });
                    }
                    Err(detail) => {
                        warn!(
                            "Response for '{}' rejected (attempt {}/{}): {}",
                            schema.name(),
                            attempt,
                            max_attempts,
                            detail
                        );
                        Failure::Schema(detail)
                    }
                },
            };

            if attempt < max_attempts {
                tokio::time::sleep(self.config.backoff(attempt)).await;
            }
        }

        Err(match last {
            Failure::Timeout => GenerationError::Timeout {
                attempts: max_attempts,
                timeout_secs: self.config.timeout_secs,
            },
            Failure::Schema(detail) => GenerationError::Schema {
                schema: schema.name().to_string(),
                attempts: max_attempts,
                detail,
            },
            Failure::Provider(message) => GenerationError::Provider {
                attempts: max_attempts,
                message,
            },
        })
    }
}

fn repair_prompt(user: &str, schema: &Schema, detail: &str) -> String {
    format!(
        "{}\n\nYour previous answer was rejected: {}.\nAnswer again with {} and nothing else.",
        user,
        detail,
        schema.describe()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;
    use serde_json::json;
    use std::time::Duration;

    fn schema() -> Schema {
        Schema::new("test")
            .required("theses", JsonType::Array)
            .optional("citations", JsonType::Array)
    }

    fn config() -> GatewayConfig {
        GatewayConfig {
            max_attempts: 3,
            timeout_secs: 5,
            backoff_ms: 0,
        }
    }

    #[test]
    fn test_schema_check_messages() {
        let s = schema();
        assert_eq!(
            s.check(&json!([])).unwrap_err(),
            "expected a JSON object at the top level"
        );
        assert_eq!(
            s.check(&json!({"theses": null})).unwrap_err(),
            "missing required field 'theses'"
        );
        assert_eq!(
            s.check(&json!({"theses": "x"})).unwrap_err(),
            "field 'theses' should be array but is string"
        );
        assert!(s.check(&json!({"theses": [], "citations": null})).is_ok());
        assert!(s.check(&json!({"theses": [], "citations": 3})).is_err());
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            schema().describe(),
            r#"a single JSON object with keys "theses" (array, required), "citations" (array, optional)"#
        );
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let provider = MockProvider::new(r#"{"theses": []}"#);
        let gateway = GenerationGateway::new(provider.clone(), config());
        let result = gateway
            .generate(&Prompt::new("sys", "user"), &schema())
            .await
            .unwrap();
        assert_eq!(result.value, json!({"theses": []}));
        assert_eq!(result.attempts, 1);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_repair_after_schema_failure() {
        let provider = MockProvider::new(r#"{"theses": []}"#);
        provider.queue_response(r#"{"wrong": 1}"#);
        let gateway = GenerationGateway::new(provider.clone(), config());

        let result = gateway
            .generate(&Prompt::new("sys", "extract"), &schema())
            .await
            .unwrap();
        assert_eq!(result.attempts, 2);

        let prompts = provider.prompts();
        assert_eq!(prompts[0], "extract");
        assert!(prompts[1].starts_with("extract"));
        assert!(prompts[1].contains("missing required field 'theses'"));
    }

    #[tokio::test]
    async fn test_schema_budget_exhausted() {
        let provider = MockProvider::new("not json at all");
        let gateway = GenerationGateway::new(provider.clone(), config());
        let err = gateway
            .generate(&Prompt::new("sys", "user"), &schema())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Schema { attempts: 3, .. }));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_share_the_budget() {
        let provider = MockProvider::default();
        provider.add_delay("slow", Duration::from_secs(3_600), r#"{"theses": []}"#);
        let gateway = GenerationGateway::new(provider.clone(), config());

        let err = gateway
            .generate(&Prompt::new("sys", "slow unit"), &schema())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GenerationError::Timeout {
                attempts: 3,
                timeout_secs: 5
            }
        );
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_provider_error_then_success() {
        let provider = MockProvider::new(r#"{"theses": [{"statement": "x"}]}"#);
        provider.queue_error("connection reset");
        let gateway = GenerationGateway::new(provider.clone(), config());

        let result = gateway
            .generate(&Prompt::new("sys", "user"), &schema())
            .await
            .unwrap();
        assert_eq!(result.attempts, 2);
        // No repair text after a transport failure
        assert_eq!(provider.prompts()[1], "user");
    }

    #[tokio::test]
    async fn test_provider_budget_exhausted() {
        let provider = MockProvider::default();
        provider.add_error("user");
        let gateway = GenerationGateway::new(provider, config());
        let err = gateway
            .generate(&Prompt::new("sys", "user"), &schema())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Provider { attempts: 3, .. }));
    }
}
