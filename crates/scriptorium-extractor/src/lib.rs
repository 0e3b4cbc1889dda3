//! Scriptorium Extractor
//!
//! Splits a document into units and turns each unit into raw thesis and
//! citation records through the generation gateway.
//!
//! # Architecture
//!
//! ```text
//! Text → Chunker → Units → Extractor → Gateway → Raw records → Gatekeeper
//! ```
//!
//! Units in the trailing notes section are also scanned by pattern, and
//! the citations found there are merged into the generator's records.
//!
//! After every unit is validated, the same Extractor runs the two global
//! phases: chain extraction over all candidate theses and thematic
//! correlation of all citations.
//!
//! # Example Usage
//!
//! ```no_run
//! use scriptorium_extractor::{Chunker, ChunkerConfig, Extractor, ExtractorConfig};
//! use scriptorium_llm::{GatewayConfig, MockProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let chunker = Chunker::new(ChunkerConfig::default());
//! let units = chunker.chunk_detected("## Chapter 1\nIn the beginning was the Word.\n")?;
//!
//! let provider = MockProvider::new(r#"{"theses": []}"#);
//! let extractor = Extractor::new(provider, GatewayConfig::default(), ExtractorConfig::default());
//!
//! for unit in &units {
//!     let extraction = extractor.extract_unit(unit).await?;
//!     println!("{}: {} theses", unit.id, extraction.parsed.theses.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod error;
mod extractor;
mod notes;
pub mod parser;
pub mod prompt;

#[cfg(test)]
mod tests;

pub use chunking::{Boundary, BoundaryKind, Chunker, Outline};
pub use config::{ChunkerConfig, ExtractorConfig};
pub use error::ExtractorError;
pub use extractor::{collect_citations, Extraction, Extractor};
pub use notes::harvest_notes;
