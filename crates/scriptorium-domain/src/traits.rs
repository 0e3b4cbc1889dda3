//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and its
//! infrastructure. Implementations live in other crates.

use crate::{CacheEntry, CacheKey};
use async_trait::async_trait;
use std::fmt::Display;

/// Trait for text generation backends
///
/// Implemented by the infrastructure layer (scriptorium-llm). A provider
/// makes exactly one request per call; retries belong to the caller.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for provider operations
    type Error: Display + Send + Sync + 'static;

    /// Name of the model behind this provider
    fn model_name(&self) -> &str;

    /// Generate a completion for a system instruction and a user prompt
    ///
    /// Providers that support it are asked for a JSON-only answer.
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, Self::Error>;
}

/// Trait for storing phase results keyed by `(unit_id, phase)`
///
/// Implemented by the infrastructure layer (scriptorium-store)
#[async_trait]
pub trait UnitCache: Send + Sync {
    /// Error type for cache operations
    type Error: Display + Send + Sync + 'static;

    /// Load an entry, `None` when absent
    async fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>, Self::Error>;

    /// Store an entry, replacing any previous one under the same key
    async fn store(&self, entry: &CacheEntry) -> Result<(), Self::Error>;

    /// Remove an entry if present
    async fn remove(&self, key: &CacheKey) -> Result<(), Self::Error>;
}
