//! Unit module - the immutable text slices every phase consumes

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Stable identifier of a unit, derived from its position in the document
///
/// Ids are positional (`U<ordinal>`), so identical input always yields
/// identical ids. Cache entries are keyed by them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    /// Build the id for the unit at the given document ordinal
    ///
    /// # Examples
    ///
    /// ```
    /// use scriptorium_domain::UnitId;
    ///
    /// assert_eq!(UnitId::from_ordinal(7).as_str(), "U7");
    /// ```
    pub fn from_ordinal(ordinal: usize) -> Self {
        Self(format!("U{}", ordinal))
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chapter position of a unit
///
/// Numbered chapters come from chapter markers (front matter is chapter 0).
/// Trailing material after the last chapter, such as end-notes, gets the
/// `Trailing` sentinel, which never collides with a numbered chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Chapter {
    /// A numbered chapter (0 for front matter)
    Numbered(u32),
    /// Trailing material without a chapter marker
    Trailing,
}

/// Textual form of the trailing-chapter sentinel
pub const TRAILING_CHAPTER_TAG: &str = "N";

impl Chapter {
    /// Whether this is the trailing sentinel
    pub fn is_trailing(&self) -> bool {
        matches!(self, Chapter::Trailing)
    }
}

impl Default for Chapter {
    fn default() -> Self {
        Chapter::Numbered(0)
    }
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chapter::Numbered(n) => write!(f, "{}", n),
            Chapter::Trailing => f.write_str(TRAILING_CHAPTER_TAG),
        }
    }
}

impl FromStr for Chapter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == TRAILING_CHAPTER_TAG {
            return Ok(Chapter::Trailing);
        }
        s.parse::<u32>()
            .map(Chapter::Numbered)
            .map_err(|_| format!("Invalid chapter '{}'", s))
    }
}

impl From<Chapter> for String {
    fn from(chapter: Chapter) -> Self {
        chapter.to_string()
    }
}

impl TryFrom<String> for Chapter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// An immutable slice of the source document
///
/// Created once by the chunker and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Positional identifier
    pub id: UnitId,

    /// Part index (0 when the unit is outside any part)
    pub part: u32,

    /// Chapter position
    pub chapter: Chapter,

    /// Index of this unit within its chapter, starting at 0
    pub chunk: u32,

    /// Position of this unit in the whole document, starting at 0
    pub ordinal: usize,

    /// Heading the unit was cut from
    pub title: String,

    /// The unit text, exactly as it appears in the source
    pub text: String,

    /// Byte range of `text` in the source (always on char boundaries)
    pub char_range: Range<usize>,
}

impl Unit {
    /// SHA-256 of the unit text, hex encoded
    pub fn content_hash(&self) -> String {
        content_hash(&self.text)
    }

    /// Whether the unit holds only whitespace
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Length of the unit text in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the unit text is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// SHA-256 of arbitrary text, hex encoded
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(text: &str) -> Unit {
        Unit {
            id: UnitId::from_ordinal(0),
            part: 1,
            chapter: Chapter::Numbered(2),
            chunk: 0,
            ordinal: 0,
            title: "Chapter 2".to_string(),
            text: text.to_string(),
            char_range: 0..text.len(),
        }
    }

    #[test]
    fn test_chapter_display_and_parse() {
        assert_eq!(Chapter::Numbered(5).to_string(), "5");
        assert_eq!(Chapter::Trailing.to_string(), "N");
        assert_eq!("5".parse::<Chapter>().unwrap(), Chapter::Numbered(5));
        assert_eq!("N".parse::<Chapter>().unwrap(), Chapter::Trailing);
        assert!("five".parse::<Chapter>().is_err());
    }

    #[test]
    fn test_trailing_sorts_after_numbered() {
        assert!(Chapter::Trailing > Chapter::Numbered(u32::MAX));
    }

    #[test]
    fn test_chapter_serializes_as_string() {
        let json = serde_json::to_string(&Chapter::Trailing).unwrap();
        assert_eq!(json, "\"N\"");
        let back: Chapter = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(back, Chapter::Numbered(12));
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = unit("Some text");
        let b = unit("Some text");
        let c = unit("Other text");
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), c.content_hash());
        assert_eq!(a.content_hash().len(), 64);
    }

    #[test]
    fn test_blank_unit() {
        assert!(unit("  \n\n ").is_blank());
        assert!(!unit("text").is_blank());
    }
}
