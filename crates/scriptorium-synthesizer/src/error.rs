//! Synthesizer error types

use scriptorium_domain::Relation;
use thiserror::Error;

/// A chain that could not be attached to the final thesis set
///
/// Resolution failures drop the chain and never halt synthesis.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainResolutionError {
    /// An endpoint names no known thesis
    #[error("Chain {from} -> {to}: unknown endpoint '{missing}'")]
    UnknownEndpoint {
        /// Source id as generated
        from: String,
        /// Target id as generated
        to: String,
        /// The endpoint that failed to resolve
        missing: String,
    },

    /// Both endpoints resolve to the same final thesis
    #[error("Chain {from} -> {to} collapses onto thesis {thesis}")]
    SelfLoop {
        /// Source id as generated
        from: String,
        /// Target id as generated
        to: String,
        /// Final id both endpoints map to
        thesis: String,
    },

    /// Same endpoints and relation as an earlier chain
    #[error("Chain {from} -> {to} ({relation}) repeats an earlier chain")]
    Duplicate {
        /// Source id as generated
        from: String,
        /// Target id as generated
        to: String,
        /// Relation
        relation: Relation,
    },
}

/// Errors that prevent a knowledge base from being produced
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    /// The assembled knowledge base violates its own invariants
    #[error("Knowledge base failed integrity check: {}", .0.join("; "))]
    Integrity(Vec<String>),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
