//! Gatekeeper error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Record-level validation failures
///
/// A record that fails validation is dropped with a diagnostic and never
/// retried.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// A required field is absent or blank
    #[error("Missing required field '{field}'")]
    MissingField {
        /// Field name
        field: String,
    },

    /// A citation without a usable reference
    #[error("Citation has an empty reference")]
    EmptyReference,

    /// Citation type outside biblical/scholarly/footnote
    #[error("Unknown citation type '{value}'")]
    UnknownCitationType {
        /// Offending value
        value: String,
    },

    /// A biblical reference that fails the canonical grammar
    #[error("Unparseable biblical reference '{reference}'")]
    UnparseableBiblicalReference {
        /// Offending reference
        reference: String,
    },

    /// Confidence that is not a number in [0, 1]
    #[error("Invalid confidence '{value}'")]
    InvalidConfidence {
        /// Offending value, as text
        value: String,
    },

    /// Supporting text shorter than the configured minimum
    #[error("Supporting text has {len} chars, minimum is {min}")]
    SupportingTextTooShort {
        /// Actual length
        len: usize,
        /// Required length
        min: usize,
    },

    /// Supporting text that cannot be found in the unit
    #[error("Supporting text not found in source unit")]
    SupportingTextNotFound,
}

impl ValidationError {
    /// Stable snake_case name used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::MissingField { .. } => "missing_field",
            ValidationError::EmptyReference => "empty_reference",
            ValidationError::UnknownCitationType { .. } => "unknown_citation_type",
            ValidationError::UnparseableBiblicalReference { .. } => "unparseable_biblical_reference",
            ValidationError::InvalidConfidence { .. } => "invalid_confidence",
            ValidationError::SupportingTextTooShort { .. } => "supporting_text_too_short",
            ValidationError::SupportingTextNotFound => "supporting_text_not_found",
        }
    }
}
