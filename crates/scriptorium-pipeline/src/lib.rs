//! Scriptorium Pipeline
//!
//! The phase orchestrator: drives a document from raw text to a frozen
//! knowledge base.
//!
//! # Overview
//!
//! A run goes through five phases:
//! - **Extraction**: every unit is sent to the generator, validated, and
//!   cached. Units run concurrently up to `max_concurrency`; a unit whose
//!   retry budget runs out is recorded as an omission and left out.
//! - **Chains**: logical relations between all surviving candidate theses
//! - **Correlation**: thematic grouping of all surviving citations
//! - **Synthesis**: deduplication, final ids, and resolution of chains and
//!   groups against the final theses
//! - **Summary**: an executive summary over the final theses; a failed call
//!   leaves it empty rather than failing the run
//!
//! The global phases start only after every unit has finished, and always
//! see the units in document order.
//!
//! # Resuming
//!
//! Each unit's validated output is cached under its id together with a hash
//! of its text. A second run over the same text and cache issues no
//! generation calls at all and produces the same knowledge base. Entries that
//! are unreadable or no longer match their unit are regenerated.
//!
//! # Usage
//!
//! ```no_run
//! use scriptorium_pipeline::{Pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::from_toml(
//!         r#"
//! max_concurrency = 2
//! cache_dir = ".scriptorium/cache"
//! output_path = "knowledge_base.json"
//!
//! [backend]
//! kind = "ollama"
//! endpoint = "http://localhost:11434"
//! model = "qwen3:14b"
//! "#,
//!     )?;
//!
//!     let pipeline = Pipeline::from_config(config)?;
//!     let text = std::fs::read_to_string("book.md")?;
//!     let output = pipeline.run(&text).await?;
//!
//!     println!("Excluded units: {}", output.report.excluded_units());
//!     println!("{}", output.report.summary());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod pipeline;
mod report;
mod state;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::{Pipeline, RunOutput};
pub use report::{QualityReport, RunReport, LOW_CONFIDENCE};
pub use state::{UnitOmission, UnitState};
