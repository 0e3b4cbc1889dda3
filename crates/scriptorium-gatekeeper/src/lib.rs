//! Scriptorium Gatekeeper
//!
//! Validates raw records extracted from a unit before they reach the
//! synthesizer.
//!
//! The Gatekeeper provides:
//! - Rejection of records missing required fields or with unusable references
//! - Reclassification of bare note markers as footnotes
//! - Normalization of biblical references against the canonical abbreviations
//! - Flagging of duplicate supporting text within a unit
//!
//! # Examples
//!
//! ```no_run
//! use scriptorium_gatekeeper::{ValidationConfig, Validator};
//!
//! let validator = Validator::new(ValidationConfig::default());
//! // let validated = validator.validate(&unit, &raw_records);
//! ```

#![warn(missing_docs)]

pub mod bible;
mod config;
mod error;
mod validator;

pub use config::ValidationConfig;
pub use error::ValidationError;
pub use validator::{is_traceable, Diagnostic, Finding, ValidatedUnit, Validator};
