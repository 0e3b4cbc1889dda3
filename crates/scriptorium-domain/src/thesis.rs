//! Thesis module - the claims extracted from the source

use crate::{Chapter, Citation, Confidence, UnitId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Final hierarchical identifier of a thesis: `<part>.<chapter>.<n>`
///
/// `n` counts from 1 within each chapter in unit-sequence order, so an id is
/// derivable purely from position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ThesisId {
    /// Part index
    pub part: u32,
    /// Chapter position
    pub chapter: Chapter,
    /// Position within the chapter, starting at 1
    pub index: u32,
}

impl ThesisId {
    /// Create a new thesis id
    pub fn new(part: u32, chapter: Chapter, index: u32) -> Self {
        Self { part, chapter, index }
    }
}

impl fmt::Display for ThesisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.part, self.chapter, self.index)
    }
}

impl FromStr for ThesisId {
    type Err = String;

    /// Parse a thesis id
    ///
    /// # Examples
    ///
    /// ```
    /// use scriptorium_domain::{Chapter, ThesisId};
    ///
    /// let id: ThesisId = "2.5.3".parse().unwrap();
    /// assert_eq!(id, ThesisId::new(2, Chapter::Numbered(5), 3));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(format!("Invalid thesis id '{}'", s));
        }
        let part = parts[0]
            .parse::<u32>()
            .map_err(|_| format!("Invalid part in thesis id '{}'", s))?;
        let chapter = parts[1].parse::<Chapter>()?;
        let index = parts[2]
            .parse::<u32>()
            .map_err(|_| format!("Invalid index in thesis id '{}'", s))?;
        if index == 0 {
            return Err(format!("Thesis index must start at 1 in '{}'", s));
        }
        Ok(Self { part, chapter, index })
    }
}

impl From<ThesisId> for String {
    fn from(id: ThesisId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ThesisId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Role of a thesis in the argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThesisType {
    /// Central argument of the chapter
    Main,
    /// Supports a main thesis
    Supporting,
    /// Logical premise
    Premise,
    /// Derived conclusion
    Conclusion,
}

impl Default for ThesisType {
    fn default() -> Self {
        ThesisType::Main
    }
}

impl FromStr for ThesisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "main" => Ok(ThesisType::Main),
            "supporting" => Ok(ThesisType::Supporting),
            "premise" => Ok(ThesisType::Premise),
            "conclusion" => Ok(ThesisType::Conclusion),
            other => Err(format!("Unknown thesis type '{}'", other)),
        }
    }
}

/// Kind of inference (Peirce's taxonomy)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningType {
    /// Necessary conclusion from premises
    Deductive,
    /// Generalization from evidence
    Inductive,
    /// Best explanation of the observations
    Abductive,
}

impl Default for ReasoningType {
    fn default() -> Self {
        ReasoningType::Deductive
    }
}

impl FromStr for ReasoningType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deductive" => Ok(ReasoningType::Deductive),
            "inductive" => Ok(ReasoningType::Inductive),
            "abductive" => Ok(ReasoningType::Abductive),
            other => Err(format!("Unknown reasoning type '{}'", other)),
        }
    }
}

/// A validated thesis from a single unit, before global synthesis
///
/// Its id is local to the run (`<unit>.T<n>`) and is replaced by a
/// [`ThesisId`] during synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateThesis {
    /// Local id, `<unit id>.T<position>`
    pub id: String,

    /// Unit the thesis was extracted from
    pub unit_id: UnitId,

    /// Ordinal of that unit
    pub unit_ordinal: usize,

    /// Part index of the unit
    pub part: u32,

    /// Chapter of the unit
    pub chapter: Chapter,

    /// Short statement of the thesis
    pub statement: String,

    /// Longer explanation of the argument
    pub description: String,

    /// Role in the argument
    pub thesis_type: ThesisType,

    /// Literal excerpt of the unit supporting the statement
    pub supporting_text: String,

    /// Kind of inference
    pub reasoning_type: ReasoningType,

    /// Confidence of the extraction
    pub confidence: Confidence,

    /// Citations attached to this thesis
    pub citations: Vec<Citation>,
}

impl CandidateThesis {
    /// Build the local id of the thesis at `position` (1-based) in a unit
    pub fn local_id(unit_id: &UnitId, position: usize) -> String {
        format!("{}.T{}", unit_id, position)
    }
}

/// A thesis in the final knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thesis {
    /// Hierarchical id
    pub id: ThesisId,

    /// Part index
    pub part: u32,

    /// Chapter position
    pub chapter: Chapter,

    /// Unit the supporting text was taken from
    pub source_unit: UnitId,

    /// Short statement of the thesis
    pub statement: String,

    /// Longer explanation of the argument
    pub description: String,

    /// Role in the argument
    pub thesis_type: ThesisType,

    /// Literal excerpt of the source unit
    pub supporting_text: String,

    /// Kind of inference
    pub reasoning_type: ReasoningType,

    /// Confidence of the extraction
    pub confidence: Confidence,

    /// Citations attached to this thesis
    pub citations: Vec<Citation>,
}

impl Thesis {
    /// Promote a candidate to its final form under the given id
    pub fn from_candidate(id: ThesisId, candidate: CandidateThesis) -> Self {
        Self {
            id,
            part: candidate.part,
            chapter: candidate.chapter,
            source_unit: candidate.unit_id,
            statement: candidate.statement,
            description: candidate.description,
            thesis_type: candidate.thesis_type,
            supporting_text: candidate.supporting_text,
            reasoning_type: candidate.reasoning_type,
            confidence: candidate.confidence,
            citations: candidate.citations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thesis_id_display() {
        let id = ThesisId::new(1, Chapter::Numbered(2), 3);
        assert_eq!(id.to_string(), "1.2.3");
        let notes = ThesisId::new(0, Chapter::Trailing, 1);
        assert_eq!(notes.to_string(), "0.N.1");
    }

    #[test]
    fn test_thesis_id_parse_rejects_garbage() {
        assert!("1.2".parse::<ThesisId>().is_err());
        assert!("a.2.3".parse::<ThesisId>().is_err());
        assert!("1.2.0".parse::<ThesisId>().is_err());
        assert!("1.x.1".parse::<ThesisId>().is_err());
    }

    #[test]
    fn test_thesis_id_ordering_follows_position() {
        let a = ThesisId::new(1, Chapter::Numbered(2), 9);
        let b = ThesisId::new(1, Chapter::Numbered(3), 1);
        assert!(a < b);
    }

    #[test]
    fn test_local_id() {
        let unit = UnitId::from_ordinal(4);
        assert_eq!(CandidateThesis::local_id(&unit, 2), "U4.T2");
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("Main".parse::<ThesisType>().unwrap(), ThesisType::Main);
        assert_eq!("abductive".parse::<ReasoningType>().unwrap(), ReasoningType::Abductive);
        assert!("weird".parse::<ThesisType>().is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Round-trip through string representation preserves the id
        #[test]
        fn test_thesis_id_string_roundtrip(part in 0u32..50, chapter in 0u32..200, index in 1u32..500, trailing: bool) {
            let chapter = if trailing { Chapter::Trailing } else { Chapter::Numbered(chapter) };
            let id = ThesisId::new(part, chapter, index);
            let parsed: ThesisId = id.to_string().parse().map_err(TestCaseError::fail)?;
            prop_assert_eq!(id, parsed);
        }
    }
}
