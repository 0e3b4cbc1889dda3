//! Scriptorium LLM Provider Layer
//!
//! Pluggable generation backends and the generation gateway.
//!
//! # Architecture
//!
//! This crate implements the `LlmProvider` trait from `scriptorium-domain`
//! for several backends and wraps any of them in a [`GenerationGateway`]
//! that enforces a response schema, a per-call timeout, and a bounded
//! retry-with-repair budget.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted mock for testing
//! - `OllamaProvider`: Local Ollama chat API
//! - `OpenAiProvider`: OpenAI-compatible chat completions
//! - `Backend`: Any of the above, selected from a `BackendConfig`
//!
//! # Examples
//!
//! ```
//! use scriptorium_llm::{GatewayConfig, GenerationGateway, JsonType, MockProvider, Prompt, Schema};
//!
//! let provider = MockProvider::new(r#"<think>ok</think>{"theses": []}"#);
//! let gateway = GenerationGateway::new(provider, GatewayConfig::default());
//! let schema = Schema::new("demo").required("theses", JsonType::Array);
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let generated = rt.block_on(gateway.generate(&Prompt::new("sys", "text"), &schema)).unwrap();
//! assert_eq!(generated.attempts, 1);
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod json;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use backend::Backend;
pub use config::{BackendConfig, GatewayConfig};
pub use error::{GenerationError, LlmError};
pub use gateway::{Field, Generated, GenerationGateway, JsonType, Prompt, Schema};
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
