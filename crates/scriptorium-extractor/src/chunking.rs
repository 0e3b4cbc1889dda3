//! Hierarchical chunking of normalized text into units
//!
//! The text is first cut at part and chapter boundaries, then any section
//! larger than the size bound is subdivided at paragraph breaks, line breaks,
//! whitespace, or as a last resort at a character boundary. Units cover the
//! text exactly: no gaps, no overlaps, and concatenating their texts gives
//! back the input.

use crate::config::ChunkerConfig;
use crate::error::ExtractorError;
use regex::Regex;
use scriptorium_domain::{Chapter, Unit, UnitId};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::{debug, info};

static MARKDOWN_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,3}[ \t]+(.+?)[ \t]*\r?$").expect("valid regex"));
static PART_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:part|parte)\s+([0-9]+|[ivx]+|one|two|three|four|five|six|um|dois|tr[eê]s|quatro|cinco|seis)\b",
    )
    .expect("valid regex")
});
static CHAPTER_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:chapter|cap[ií]tulo|cap\.?)\s+([0-9]+|[ivxlc]+)\b").expect("valid regex")
});
static NAMED_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:preface|pref[aá]cio|foreword|prologue|pr[oó]logo|introduction|introdu[cç][aã]o|conclusion|conclus[aã]o|epilogue|ep[ií]logo|appendix|ap[eê]ndice)\b",
    )
    .expect("valid regex")
});
static TRAILING_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:notes|notas|endnotes|end notes)[\s.:]*$").expect("valid regex")
});

/// Longest line considered as a plain-text heading
const MAX_HEADING_LINE: usize = 100;

/// What a boundary opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    /// A part heading; its text is merged into the chapter that follows
    Part(u32),
    /// A chapter
    Chapter(u32),
    /// Trailing material such as end-notes
    Trailing,
}

/// A part or chapter marker at a byte offset of the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    /// Byte offset where the section starts
    pub offset: usize,
    /// What the boundary opens
    pub kind: BoundaryKind,
    /// Heading text
    pub title: String,
}

impl Boundary {
    /// Create a boundary
    pub fn new(offset: usize, kind: BoundaryKind, title: impl Into<String>) -> Self {
        Self {
            offset,
            kind,
            title: title.into(),
        }
    }
}

/// Ordered boundary markers of a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    boundaries: Vec<Boundary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Heading {
    Part(u32),
    Chapter(Option<u32>),
    Trailing,
}

impl Outline {
    /// Build an outline from externally supplied markers
    pub fn new(mut boundaries: Vec<Boundary>) -> Self {
        boundaries.sort_by_key(|b| b.offset);
        Self { boundaries }
    }

    /// Boundaries in offset order
    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    /// Whether no boundary was found
    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Number of boundaries
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    /// Derive an outline from the headings of the text
    ///
    /// Markdown headings are used when present. If none of them names a
    /// part, chapter or known section, every markdown heading becomes a
    /// chapter in order. Without markdown headings, short plain lines that
    /// look like headings are used. Headings closer than `min_gap` bytes to
    /// the previous one are dropped, unless the previous one is a part.
    pub fn detect(text: &str, min_gap: usize) -> Self {
        let markdown: Vec<(usize, String)> = MARKDOWN_HEADING
            .captures_iter(text)
            .filter_map(|c| {
                let whole = c.get(0)?;
                let title = c.get(1)?.as_str().trim().to_string();
                Some((whole.start(), title))
            })
            .collect();

        let mut found: Vec<(usize, Heading, String)> = if markdown.is_empty() {
            plain_headings(text)
        } else {
            let classified: Vec<(usize, Heading, String)> = markdown
                .iter()
                .filter_map(|(offset, title)| classify(title).map(|h| (*offset, h, title.clone())))
                .collect();
            if classified.is_empty() {
                markdown
                    .into_iter()
                    .enumerate()
                    .map(|(i, (offset, title))| (offset, Heading::Chapter(Some(i as u32 + 1)), title))
                    .collect()
            } else {
                classified
            }
        };
        found.sort_by_key(|(offset, _, _)| *offset);

        let mut kept: Vec<(usize, Heading, String)> = Vec::with_capacity(found.len());
        for entry in found {
            let too_close = kept.last().is_some_and(|(prev, heading, _)| {
                !matches!(heading, Heading::Part(_)) && entry.0 - prev < min_gap
            });
            if too_close {
                debug!("Ignoring heading '{}' at {}: too close to previous", entry.2, entry.0);
                continue;
            }
            kept.push(entry);
        }

        let mut last_chapter = 0;
        let mut seen_chapter = false;
        let boundaries = kept
            .into_iter()
            .map(|(offset, heading, title)| {
                let kind = match heading {
                    Heading::Part(p) => BoundaryKind::Part(p),
                    Heading::Chapter(Some(n)) => {
                        last_chapter = n;
                        seen_chapter = true;
                        BoundaryKind::Chapter(n)
                    }
                    Heading::Chapter(None) if seen_chapter => {
                        last_chapter += 1;
                        BoundaryKind::Chapter(last_chapter)
                    }
                    Heading::Chapter(None) => BoundaryKind::Chapter(0),
                    Heading::Trailing => BoundaryKind::Trailing,
                };
                Boundary::new(offset, kind, title)
            })
            .collect();

        Self { boundaries }
    }
}

fn plain_headings(text: &str) -> Vec<(usize, Heading, String)> {
    let mut offset = 0;
    let mut found = Vec::new();
    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_HEADING_LINE {
            continue;
        }
        if let Some(heading) = classify(trimmed) {
            let lead = line.len() - line.trim_start().len();
            found.push((start + lead, heading, trimmed.to_string()));
        }
    }
    found
}

fn classify(title: &str) -> Option<Heading> {
    let title = title.trim();
    if let Some(c) = PART_HEADING.captures(title) {
        return c.get(1).and_then(|m| parse_number(m.as_str())).map(Heading::Part);
    }
    if let Some(c) = CHAPTER_HEADING.captures(title) {
        return Some(Heading::Chapter(c.get(1).and_then(|m| parse_number(m.as_str()))));
    }
    if TRAILING_HEADING.is_match(title) {
        return Some(Heading::Trailing);
    }
    if NAMED_HEADING.is_match(title) {
        return Some(Heading::Chapter(None));
    }
    None
}

fn parse_number(token: &str) -> Option<u32> {
    let lower = token.to_lowercase();
    if let Ok(n) = lower.parse::<u32>() {
        return Some(n);
    }
    let word = match lower.as_str() {
        "one" | "um" => Some(1),
        "two" | "dois" => Some(2),
        "three" | "tres" | "três" => Some(3),
        "four" | "quatro" => Some(4),
        "five" | "cinco" => Some(5),
        "six" | "seis" => Some(6),
        _ => None,
    };
    word.or_else(|| parse_roman(&lower))
}

fn parse_roman(token: &str) -> Option<u32> {
    let mut total = 0u32;
    let mut prev = 0u32;
    for c in token.chars().rev() {
        let value = match c {
            'i' => 1,
            'v' => 5,
            'x' => 10,
            'l' => 50,
            'c' => 100,
            _ => return None,
        };
        if value < prev {
            total = total.checked_sub(value)?;
        } else {
            total += value;
            prev = value;
        }
    }
    (total > 0).then_some(total)
}

#[derive(Debug, Clone)]
struct Section {
    range: Range<usize>,
    part: u32,
    chapter: Chapter,
    title: String,
}

/// Splits text into hierarchical units
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a new chunker
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Borrow the configuration
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk text using an outline detected from its headings
    pub fn chunk_detected(&self, text: &str) -> Result<Vec<Unit>, ExtractorError> {
        let outline = Outline::detect(text, self.config.min_boundary_gap);
        info!("Detected {} boundaries", outline.len());
        self.chunk(text, &outline)
    }

    /// Chunk text along the given outline
    ///
    /// # Errors
    ///
    /// Returns [`ExtractorError::InvalidBoundary`] if a boundary lies past the
    /// end of the text or inside a multi-byte character, and
    /// [`ExtractorError::Config`] if the configuration is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use scriptorium_extractor::{Boundary, BoundaryKind, Chunker, Outline};
    ///
    /// let text = "Preface.\n## Chapter 1\nBody.\n";
    /// let outline = Outline::new(vec![Boundary::new(9, BoundaryKind::Chapter(1), "Chapter 1")]);
    /// let units = Chunker::default().chunk(text, &outline).unwrap();
    ///
    /// assert_eq!(units.len(), 2);
    /// assert_eq!(units[1].id.as_str(), "U1");
    /// assert_eq!(units.iter().map(|u| u.text.as_str()).collect::<String>(), text);
    /// ```
    pub fn chunk(&self, text: &str, outline: &Outline) -> Result<Vec<Unit>, ExtractorError> {
        self.config.validate().map_err(ExtractorError::Config)?;
        for boundary in outline.boundaries() {
            if boundary.offset > text.len() || !text.is_char_boundary(boundary.offset) {
                return Err(ExtractorError::InvalidBoundary {
                    offset: boundary.offset,
                    len: text.len(),
                });
            }
        }
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let sections = merge_blank_sections(text, sections(text, outline));

        let mut units: Vec<Unit> = Vec::new();
        let mut chunk_counters: HashMap<(u32, Chapter), u32> = HashMap::new();
        for section in sections {
            let pieces = split_range(text, section.range.clone(), self.config.max_unit_chars);
            let total = pieces.len();
            debug!(
                "Section '{}' (part {}, chapter {}): {} bytes, {} unit(s)",
                section.title,
                section.part,
                section.chapter,
                section.range.len(),
                total
            );
            for (k, range) in pieces.into_iter().enumerate() {
                let counter = chunk_counters
                    .entry((section.part, section.chapter))
                    .or_insert(0);
                let ordinal = units.len();
                units.push(Unit {
                    id: UnitId::from_ordinal(ordinal),
                    part: section.part,
                    chapter: section.chapter,
                    chunk: *counter,
                    ordinal,
                    title: if total > 1 {
                        format!("{} ({}/{})", section.title, k + 1, total)
                    } else {
                        section.title.clone()
                    },
                    text: text[range.clone()].to_string(),
                    char_range: range,
                });
                *counter += 1;
            }
        }

        info!("Created {} units from {} bytes of text", units.len(), text.len());
        Ok(units)
    }
}

fn sections(text: &str, outline: &Outline) -> Vec<Section> {
    let boundaries = outline.boundaries();
    let mut sections = Vec::new();

    let first = boundaries.first().map(|b| b.offset).unwrap_or(text.len());
    if first > 0 {
        sections.push(Section {
            range: 0..first,
            part: 0,
            chapter: Chapter::Numbered(0),
            title: if boundaries.is_empty() {
                "Full text".to_string()
            } else {
                "Front matter".to_string()
            },
        });
    }

    let mut current_part = 0;
    let mut pending_part: Option<(usize, String)> = None;
    for (i, boundary) in boundaries.iter().enumerate() {
        let end = boundaries.get(i + 1).map(|b| b.offset).unwrap_or(text.len());
        match boundary.kind {
            BoundaryKind::Part(p) => {
                current_part = p;
                if pending_part.is_none() {
                    pending_part = Some((boundary.offset, boundary.title.clone()));
                }
                // A part with no chapter after it stands on its own
                if i + 1 == boundaries.len() {
                    if let Some((start, title)) = pending_part.take() {
                        sections.push(Section {
                            range: start..end,
                            part: p,
                            chapter: Chapter::Numbered(0),
                            title,
                        });
                    }
                }
            }
            BoundaryKind::Chapter(c) => {
                let start = pending_part.take().map(|(s, _)| s).unwrap_or(boundary.offset);
                sections.push(Section {
                    range: start..end,
                    part: current_part,
                    chapter: Chapter::Numbered(c),
                    title: boundary.title.clone(),
                });
            }
            BoundaryKind::Trailing => {
                let start = pending_part.take().map(|(s, _)| s).unwrap_or(boundary.offset);
                sections.push(Section {
                    range: start..end,
                    part: 0,
                    chapter: Chapter::Trailing,
                    title: boundary.title.clone(),
                });
            }
        }
    }
    sections
}

/// Fold whitespace-only sections into the next section, or the previous one
/// at the end of the text
fn merge_blank_sections(text: &str, sections: Vec<Section>) -> Vec<Section> {
    let mut merged: Vec<Section> = Vec::with_capacity(sections.len());
    let mut carry: Option<Range<usize>> = None;

    for mut section in sections {
        if text[section.range.clone()].trim().is_empty() {
            carry = Some(match carry {
                Some(c) => c.start..section.range.end,
                None => section.range.clone(),
            });
            continue;
        }
        if let Some(c) = carry.take() {
            section.range.start = c.start;
        }
        merged.push(section);
    }

    if let Some(c) = carry {
        match merged.last_mut() {
            Some(last) => last.range.end = c.end,
            None => merged.push(Section {
                range: c,
                part: 0,
                chapter: Chapter::Numbered(0),
                title: "Full text".to_string(),
            }),
        }
    }
    merged
}

/// Split a range into pieces of at most `max` bytes, preferring natural breaks
fn split_range(text: &str, range: Range<usize>, max: usize) -> Vec<Range<usize>> {
    let mut pieces = Vec::new();
    let mut pos = range.start;
    while range.end - pos > max {
        let limit = floor_char_boundary(text, pos + max);
        let window = &text[pos..limit];
        let cut = best_cut(window)
            .map(|c| pos + c)
            .unwrap_or(if limit > pos {
                limit
            } else {
                ceil_char_boundary(text, pos + 1)
            });
        pieces.push(pos..cut);
        pos = cut;
    }
    if pos < range.end {
        pieces.push(pos..range.end);
    }
    pieces
}

fn best_cut(window: &str) -> Option<usize> {
    window
        .rfind("\n\n")
        .map(|i| i + 2)
        .or_else(|| window.rfind('\n').map(|i| i + 1))
        .or_else(|| {
            window
                .char_indices()
                .rev()
                .find(|(_, c)| c.is_whitespace())
                .map(|(i, c)| i + c.len_utf8())
        })
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = String> {
        prop_oneof![
            (1u32..20).prop_map(|n| format!("## Chapter {}\n", n)),
            (1u32..5).prop_map(|n| format!("## Part {}\n", n)),
            Just("## Notes\n".to_string()),
            "[a-zé ,.]{0,200}\n\n",
            "[a-z\n ]{0,120}",
        ]
    }

    proptest! {
        /// Property: units tile the text exactly and respect the size bound
        #[test]
        fn test_units_round_trip(
            segments in prop::collection::vec(segment(), 0..20),
            max in 64usize..300,
        ) {
            let text: String = segments.concat();
            let chunker = Chunker::new(ChunkerConfig { max_unit_chars: max, min_boundary_gap: 20 });
            let units = chunker.chunk_detected(&text).map_err(|e| TestCaseError::fail(e.to_string()))?;

            let mut expected_start = 0;
            for (i, unit) in units.iter().enumerate() {
                prop_assert_eq!(unit.ordinal, i);
                prop_assert_eq!(unit.char_range.start, expected_start);
                prop_assert!(unit.len() <= max);
                prop_assert!(!unit.is_empty());
                prop_assert_eq!(&text[unit.char_range.clone()], unit.text.as_str());
                expected_start = unit.char_range.end;
            }
            prop_assert_eq!(expected_start, text.len());
            let joined: String = units.iter().map(|u| u.text.as_str()).collect();
            prop_assert_eq!(joined, text);
        }
    }
}
