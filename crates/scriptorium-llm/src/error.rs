//! Error types for providers and the generation gateway

use thiserror::Error;

/// Errors raised by a single provider request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response envelope from the backend
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Backend misconfigured (missing key, bad endpoint)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Failure of a gateway call after its retry budget is spent
///
/// Timeouts, schema mismatches and provider errors share one budget; the
/// variant reports the kind of the last failed attempt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// Every attempt ended with the last one timing out
    #[error("Generation timed out after {attempts} attempt(s) ({timeout_secs}s per call)")]
    Timeout {
        /// Attempts made
        attempts: u32,
        /// Per-call timeout in seconds
        timeout_secs: u64,
    },

    /// The response never matched the expected schema
    #[error("Generation response failed schema '{schema}' after {attempts} attempt(s): {detail}")]
    Schema {
        /// Schema name
        schema: String,
        /// Attempts made
        attempts: u32,
        /// Last mismatch
        detail: String,
    },

    /// The provider kept failing
    #[error("Provider failed after {attempts} attempt(s): {message}")]
    Provider {
        /// Attempts made
        attempts: u32,
        /// Last provider error
        message: String,
    },
}

impl GenerationError {
    /// Number of attempts that were made
    pub fn attempts(&self) -> u32 {
        match self {
            GenerationError::Timeout { attempts, .. }
            | GenerationError::Schema { attempts, .. }
            | GenerationError::Provider { attempts, .. } => *attempts,
        }
    }

    /// Whether the last attempt timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, GenerationError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_display() {
        let err = GenerationError::Timeout {
            attempts: 3,
            timeout_secs: 300,
        };
        assert_eq!(
            err.to_string(),
            "Generation timed out after 3 attempt(s) (300s per call)"
        );
        assert!(err.is_timeout());
        assert_eq!(err.attempts(), 3);
    }
}
