//! Error types for the Extractor

use scriptorium_llm::GenerationError;
use thiserror::Error;

/// Errors that can occur during chunking or extraction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractorError {
    /// The generation gateway gave up
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A boundary marker points outside the text or inside a character
    #[error("Invalid boundary at byte {offset} (text length {len})")]
    InvalidBoundary {
        /// Offending offset
        offset: usize,
        /// Text length in bytes
        len: usize,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
