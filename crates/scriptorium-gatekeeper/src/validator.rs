//! Record validation logic

use crate::bible;
use crate::{ValidationConfig, ValidationError};
use regex::Regex;
use scriptorium_domain::{
    CandidateThesis, Citation, CitationType, Confidence, RawCitation, RawThesis, RawUnitAnalysis,
    ReasoningType, ThesisType, Unit, UnitAnalysis, UnitId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info};

/// Bare note markers: `12`, `[3]`, `(4)`, `7.`, `*`, `†`, superscript digits
static NOTE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[\[(]?\d{1,4}[\])]?\.?|[*†‡§¶]{1,3}|[⁰¹²³⁴⁵⁶⁷⁸⁹]{1,4})$").expect("valid regex")
});

/// What the validator found about one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "finding", rename_all = "snake_case")]
pub enum Finding {
    /// The record was dropped
    Rejected {
        /// Why
        error: ValidationError,
    },

    /// A citation changed type
    Reclassified {
        /// Citation reference after validation
        reference: String,
        /// Type before
        from: CitationType,
        /// Type after
        to: CitationType,
    },

    /// A biblical reference was rewritten to canonical form
    Normalized {
        /// Reference before
        from: String,
        /// Reference after
        to: String,
    },

    /// An unrecognized optional value was replaced by its default
    Defaulted {
        /// Field name
        field: String,
        /// Rejected value
        value: String,
    },

    /// Two theses of the unit quote the same supporting text
    DuplicateSupportingText {
        /// Local id of the earlier thesis
        first: String,
    },
}

/// A diagnostic attached to one record of one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Unit the record came from
    pub unit_id: UnitId,
    /// Human-readable record location, e.g. `thesis 2 citation 1`
    pub record: String,
    /// What was found
    pub finding: Finding,
}

impl Diagnostic {
    /// Stable snake_case kind used to aggregate diagnostics
    pub fn kind(&self) -> &'static str {
        match &self.finding {
            Finding::Rejected { error } => error.kind(),
            Finding::Reclassified { .. } => "reclassified",
            Finding::Normalized { .. } => "normalized",
            Finding::Defaulted { .. } => "defaulted",
            Finding::DuplicateSupportingText { .. } => "duplicate_supporting_text",
        }
    }

    /// Whether the record was dropped
    pub fn is_rejection(&self) -> bool {
        matches!(self.finding, Finding::Rejected { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: ", self.unit_id, self.record)?;
        match &self.finding {
            Finding::Rejected { error } => write!(f, "dropped ({})", error),
            Finding::Reclassified {
                reference,
                from,
                to,
            } => write!(f, "'{}' reclassified {} -> {}", reference, from, to),
            Finding::Normalized { from, to } => write!(f, "'{}' normalized to '{}'", from, to),
            Finding::Defaulted { field, value } => {
                write!(f, "unknown {} '{}' replaced by default", field, value)
            }
            Finding::DuplicateSupportingText { first } => {
                write!(f, "same supporting text as {}", first)
            }
        }
    }
}

/// Validated records of one unit with the diagnostics produced on the way
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedUnit {
    /// Records that passed
    pub analysis: UnitAnalysis,
    /// Everything dropped, repaired or flagged
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidatedUnit {
    /// Number of dropped records
    pub fn rejected(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_rejection()).count()
    }
}

/// The Validator checks raw records before they reach the synthesizer
///
/// Validation is pure: the same unit and raw records always produce the
/// same result, and validating already-valid records changes nothing.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new Validator with the given configuration
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Create a Validator with default configuration
    pub fn default_config() -> Self {
        Self::new(ValidationConfig::default())
    }

    /// Borrow the configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate the raw records extracted from `unit`
    pub fn validate(&self, unit: &Unit, raw: &RawUnitAnalysis) -> ValidatedUnit {
        let mut diagnostics = Vec::new();
        let mut theses: Vec<CandidateThesis> = Vec::new();

        for (index, raw_thesis) in raw.theses.iter().enumerate() {
            let record = format!("thesis {}", index + 1);
            match self.validate_thesis(unit, raw_thesis, &record, &mut diagnostics) {
                Ok(mut thesis) => {
                    thesis.id = CandidateThesis::local_id(&unit.id, theses.len() + 1);
                    theses.push(thesis);
                }
                Err(error) => {
                    debug!("{} {} rejected: {}", unit.id, record, error);
                    diagnostics.push(rejected(&unit.id, record, error));
                }
            }
        }

        flag_duplicate_supporting_text(&unit.id, &theses, &mut diagnostics);

        let mut citations = Vec::new();
        for (index, raw_citation) in raw.citations.iter().enumerate() {
            let record = format!("citation {}", index + 1);
            match validate_citation(&unit.id, raw_citation, &record, &mut diagnostics) {
                Ok(citation) => citations.push(citation),
                Err(error) => diagnostics.push(rejected(&unit.id, record, error)),
            }
        }

        let validated = ValidatedUnit {
            analysis: UnitAnalysis {
                unit_id: unit.id.clone(),
                unit_ordinal: unit.ordinal,
                part: unit.part,
                chapter: unit.chapter,
                theses,
                citations,
            },
            diagnostics,
        };

        if !validated.diagnostics.is_empty() {
            info!(
                "Validation of {}: {} theses, {} citations kept, {} dropped, {} diagnostics",
                unit.id,
                validated.analysis.theses.len(),
                validated.analysis.citations.len(),
                validated.rejected(),
                validated.diagnostics.len()
            );
        }
        validated
    }

    fn validate_thesis(
        &self,
        unit: &Unit,
        raw: &RawThesis,
        record: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<CandidateThesis, ValidationError> {
        let statement = required(&raw.statement, "statement")?;
        let supporting_text = required(&raw.supporting_text, "supporting_text")?;

        let len = supporting_text.chars().count();
        if len < self.config.min_supporting_text_chars {
            return Err(ValidationError::SupportingTextTooShort {
                len,
                min: self.config.min_supporting_text_chars,
            });
        }
        if self.config.verify_supporting_text && !is_traceable(&supporting_text, &unit.text) {
            return Err(ValidationError::SupportingTextNotFound);
        }

        let confidence = self.confidence(raw.confidence.as_ref())?;

        let thesis_type = parse_or_default::<ThesisType>(
            &unit.id,
            record,
            "thesis_type",
            raw.thesis_type.as_deref(),
            diagnostics,
        );
        let reasoning_type = parse_or_default::<ReasoningType>(
            &unit.id,
            record,
            "reasoning_type",
            raw.reasoning_type.as_deref(),
            diagnostics,
        );

        let mut citations = Vec::new();
        for (index, raw_citation) in raw.citations.iter().enumerate() {
            let citation_record = format!("{} citation {}", record, index + 1);
            match validate_citation(&unit.id, raw_citation, &citation_record, diagnostics) {
                Ok(citation) => citations.push(citation),
                Err(error) => diagnostics.push(rejected(&unit.id, citation_record, error)),
            }
        }

        Ok(CandidateThesis {
            id: String::new(),
            unit_id: unit.id.clone(),
            unit_ordinal: unit.ordinal,
            part: unit.part,
            chapter: unit.chapter,
            statement,
            description: optional(&raw.description).unwrap_or_default(),
            thesis_type,
            supporting_text,
            reasoning_type,
            confidence,
            citations,
        })
    }

    fn confidence(&self, value: Option<&Value>) -> Result<Confidence, ValidationError> {
        let Some(value) = value else {
            return Ok(Confidence::new(self.config.default_confidence));
        };
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        number
            .and_then(|n| Confidence::try_new(n).ok())
            .ok_or_else(|| ValidationError::InvalidConfidence {
                value: value.to_string(),
            })
    }
}

fn validate_citation(
    unit_id: &UnitId,
    raw: &RawCitation,
    record: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Citation, ValidationError> {
    let reference = optional(&raw.reference).ok_or(ValidationError::EmptyReference)?;

    let declared = match optional(&raw.citation_type) {
        Some(value) => Some(
            value
                .parse::<CitationType>()
                .map_err(|_| ValidationError::UnknownCitationType { value })?,
        ),
        None => None,
    };

    let mut citation = Citation {
        reference,
        citation_type: CitationType::Scholarly,
        text: optional(&raw.text),
        author: optional(&raw.author),
        work: optional(&raw.work),
        context: optional(&raw.context),
    };

    let (citation_type, normalized) = if NOTE_MARKER.is_match(&citation.reference) {
        (CitationType::Footnote, None)
    } else {
        match declared {
            Some(CitationType::Footnote) => (CitationType::Footnote, None),
            Some(CitationType::Biblical) => {
                let normalized = bible::normalize(&citation.reference).ok_or_else(|| {
                    ValidationError::UnparseableBiblicalReference {
                        reference: citation.reference.clone(),
                    }
                })?;
                (CitationType::Biblical, Some(normalized))
            }
            // Verse-level form only: chapter-only shapes collide with too many author-year strings
            other => match bible::parse(&citation.reference).filter(|r| r.has_verse()) {
                Some(parsed) => (CitationType::Biblical, Some(parsed.to_string())),
                None => (other.unwrap_or(CitationType::Scholarly), None),
            },
        }
    };

    if let Some(normalized) = normalized {
        if normalized != citation.reference {
            diagnostics.push(Diagnostic {
                unit_id: unit_id.clone(),
                record: record.to_string(),
                finding: Finding::Normalized {
                    from: citation.reference.clone(),
                    to: normalized.clone(),
                },
            });
            citation.reference = normalized;
        }
    }

    if let Some(from) = declared.filter(|d| *d != citation_type) {
        diagnostics.push(Diagnostic {
            unit_id: unit_id.clone(),
            record: record.to_string(),
            finding: Finding::Reclassified {
                reference: citation.reference.clone(),
                from,
                to: citation_type,
            },
        });
    }
    citation.citation_type = citation_type;

    if citation_type == CitationType::Biblical {
        citation.author = None;
        citation.work = None;
        citation.context = None;
    }
    Ok(citation)
}

fn flag_duplicate_supporting_text(
    unit_id: &UnitId,
    theses: &[CandidateThesis],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for thesis in theses {
        match seen.get(thesis.supporting_text.as_str()) {
            Some(first) => diagnostics.push(Diagnostic {
                unit_id: unit_id.clone(),
                record: thesis.id.clone(),
                finding: Finding::DuplicateSupportingText {
                    first: (*first).to_string(),
                },
            }),
            None => {
                seen.insert(&thesis.supporting_text, &thesis.id);
            }
        }
    }
}

fn parse_or_default<T>(
    unit_id: &UnitId,
    record: &str,
    field: &str,
    value: Option<&str>,
    diagnostics: &mut Vec<Diagnostic>,
) -> T
where
    T: std::str::FromStr + Default,
{
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return T::default();
    };
    value.parse().unwrap_or_else(|_| {
        diagnostics.push(Diagnostic {
            unit_id: unit_id.clone(),
            record: record.to_string(),
            finding: Finding::Defaulted {
                field: field.to_string(),
                value: value.to_string(),
            },
        });
        T::default()
    })
}

fn required(value: &Option<String>, field: &str) -> Result<String, ValidationError> {
    optional(value).ok_or_else(|| ValidationError::MissingField {
        field: field.to_string(),
    })
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn rejected(unit_id: &UnitId, record: String, error: ValidationError) -> Diagnostic {
    Diagnostic {
        unit_id: unit_id.clone(),
        record,
        finding: Finding::Rejected { error },
    }
}

/// Whether `quote` can be found in `source`
///
/// Comparison ignores case, punctuation and whitespace runs. Elided quotes
/// (`...` or `…`) match when every fragment appears in order.
pub fn is_traceable(quote: &str, source: &str) -> bool {
    let source = normalize_text(source);
    let quote = quote.replace('…', "...");
    let mut position = 0;
    for fragment in quote.split("...") {
        let fragment = normalize_text(fragment);
        if fragment.is_empty() {
            continue;
        }
        match source[position..].find(&fragment) {
            Some(found) => position += found + fragment.len(),
            None => return false,
        }
    }
    true
}

fn normalize_text(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
