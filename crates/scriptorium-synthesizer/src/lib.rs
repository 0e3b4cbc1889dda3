//! Scriptorium Synthesizer
//!
//! Turns validated per-unit candidates plus the chain and correlation phase
//! outputs into the frozen knowledge base.
//!
//! Synthesis:
//! 1. Orders candidates by unit sequence
//! 2. Collapses duplicate supporting text within each chapter, keeping the
//!    most confident candidate
//! 3. Reissues ids as `<part>.<chapter>.<n>`
//! 4. Resolves chain endpoints, citation groups and cross references
//!    against the final ids, dropping anything that does not resolve

#![warn(missing_docs)]

mod config;
mod error;
mod report;
mod synthesizer;

pub use config::SynthesisConfig;
pub use error::{ChainResolutionError, SynthesisError};
pub use report::SynthesisReport;
pub use synthesizer::{normalize, similarity, Synthesis, Synthesizer};
