//! Error types for pipeline runs

use scriptorium_domain::Phase;
use scriptorium_extractor::ExtractorError;
use scriptorium_llm::LlmError;
use scriptorium_store::CacheError;
use scriptorium_synthesizer::SynthesisError;
use thiserror::Error;

/// Errors that stop a run without producing a knowledge base
///
/// Unit-level generation failures never appear here; they are recorded as
/// omissions in the run report.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The generation backend could not be set up
    #[error("Backend error: {0}")]
    Backend(#[from] LlmError),

    /// The text could not be cut into units
    #[error("Chunking failed: {0}")]
    Chunking(ExtractorError),

    /// Every unit failed extraction
    #[error("No unit survived extraction ({failed} failed)")]
    NoSurvivingUnits {
        /// Units that failed
        failed: usize,
    },

    /// A global phase could not produce its output
    #[error("Global phase {phase} failed: {source}")]
    GlobalPhase {
        /// The phase that failed
        phase: Phase,
        /// Underlying failure
        source: ExtractorError,
    },

    /// A unit moved to a state it cannot reach from its current one
    #[error("Invalid unit state transition: {0}")]
    InvalidTransition(String),

    /// Synthesis failed
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// Phase input or output could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The knowledge base could not be written
    #[error("Export failed: {0}")]
    Export(#[from] CacheError),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}
