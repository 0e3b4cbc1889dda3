//! Citation module - references supporting theses, and their thematic groups

use crate::ThesisId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a citation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationType {
    /// A canonical scripture reference (e.g. "Jo 3:16")
    Biblical,
    /// An author or work cited in the text
    Scholarly,
    /// A footnote or marginal-note marker
    Footnote,
}

impl CitationType {
    /// Lowercase name used in prompts and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            CitationType::Biblical => "biblical",
            CitationType::Scholarly => "scholarly",
            CitationType::Footnote => "footnote",
        }
    }
}

impl fmt::Display for CitationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CitationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "biblical" => Ok(CitationType::Biblical),
            "scholarly" => Ok(CitationType::Scholarly),
            "footnote" => Ok(CitationType::Footnote),
            other => Err(format!("Unknown citation type '{}'", other)),
        }
    }
}

/// A reference to an internal or external source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// The reference itself ("Jo 3:16", "C.S. Lewis", "12")
    pub reference: String,

    /// Kind of citation
    pub citation_type: CitationType,

    /// Quoted text, when the source quotes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Author (non-biblical kinds only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Cited work (non-biblical kinds only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work: Option<String>,

    /// How the reference is used in the argument (non-biblical kinds only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Citation {
    /// Create a citation with only a reference and a kind
    pub fn new(reference: impl Into<String>, citation_type: CitationType) -> Self {
        Self {
            reference: reference.into(),
            citation_type,
            text: None,
            author: None,
            work: None,
            context: None,
        }
    }

    /// Identity used to deduplicate citations across units
    pub fn key(&self) -> String {
        format!("{}:{}", self.citation_type, self.reference.to_lowercase())
    }
}

/// A thematic cluster of citations
///
/// Every citation belongs to at most one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationGroup {
    /// Theme name
    pub theme: String,

    /// What ties the members together
    #[serde(default)]
    pub description: String,

    /// Member citations, without duplicates
    pub members: Vec<Citation>,

    /// Final theses that rely on these citations
    #[serde(default)]
    pub related_thesis_ids: Vec<ThesisId>,
}

/// A thematic link from one citation to others
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    /// The anchoring reference
    pub primary: String,

    /// References connected to it
    pub related: Vec<String>,

    /// Explanation of the connection
    #[serde(default)]
    pub connection: String,
}
