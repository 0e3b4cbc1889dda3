//! Scriptorium Domain Layer
//!
//! This crate defines the data model shared by every stage of the
//! extraction pipeline, and the trait interfaces the infrastructure
//! crates implement.
//!
//! ## Key Concepts
//!
//! - **Unit**: An immutable slice of the source document, tagged with its
//!   part, chapter and position
//! - **Thesis**: A claim extracted from a unit, first as a candidate with a
//!   local id, then as a final thesis with a hierarchical id
//! - **Citation**: A biblical, scholarly or footnote reference
//! - **Chain**: A directed logical relation between two theses
//! - **Knowledge Base**: The frozen output of a run
//!
//! ## Architecture
//!
//! - Pure data and small invariants only
//! - Generation and caching are reached through the traits in [`traits`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod chain;
pub mod citation;
pub mod confidence;
pub mod knowledge_base;
pub mod record;
pub mod thesis;
pub mod traits;
pub mod unit;

// Re-exports for convenience
pub use cache::{CacheEntry, CacheKey, Phase};
pub use chain::{CandidateChain, Chain, Relation};
pub use citation::{Citation, CitationGroup, CitationType, CrossReference};
pub use confidence::Confidence;
pub use knowledge_base::KnowledgeBase;
pub use record::{
    ChainAnalysis, CorrelationAnalysis, RawCitation, RawThesis, RawUnitAnalysis, ThemeGroup,
    UnitAnalysis,
};
pub use thesis::{CandidateThesis, ReasoningType, Thesis, ThesisId, ThesisType};
pub use traits::{LlmProvider, UnitCache};
pub use unit::{content_hash, Chapter, Unit, UnitId, TRAILING_CHAPTER_TAG};
