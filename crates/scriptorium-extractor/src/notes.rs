//! Deterministic citation harvesting from end-notes
//!
//! Notes sections follow a few rigid shapes: a numbered line holding one or
//! more scripture references, or a bibliographic entry in the
//! `SURNAME, I. Title. Publisher, Year` form. Both are recovered by pattern
//! so they do not depend on the generator noticing them.

use regex::Regex;
use scriptorium_domain::{RawCitation, Unit};
use std::collections::HashSet;
use std::sync::LazyLock;

static NOTE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*-?\s*(\d{1,4})[.)]?\s+(.+?)\s*$").expect("valid regex")
});
static SCRIPTURE_LEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[1-3]\s*)?\p{L}+\.?\s+\d+[.:]\d+").expect("valid regex")
});
static SCHOLARLY_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\p{Lu}{2,}(?:[ -]\p{Lu}{2,})*),\s+(\p{Lu}[\w.\s]*?)\.\s+(.+?)\.\s+(.+?,\s*\d{4})")
        .expect("valid regex")
});
static NOTES_CHAPTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*#*\s*(?:chapter|cap[ií]tulo|cap\.)\s+(\d+)\b").expect("valid regex")
});

/// Harvest citations from a trailing unit
///
/// Returns nothing for units inside a numbered chapter.
pub fn harvest_notes(unit: &Unit) -> Vec<RawCitation> {
    if !unit.chapter.is_trailing() {
        return Vec::new();
    }

    let mut citations = Vec::new();
    let mut seen = HashSet::new();
    let mut chapter: Option<&str> = None;

    for line in unit.text.lines() {
        if let Some(caps) = NOTES_CHAPTER.captures(line) {
            chapter = caps.get(1).map(|m| m.as_str());
            continue;
        }

        let mut scholarly = false;
        for caps in SCHOLARLY_ENTRY.captures_iter(line) {
            scholarly = true;
            let author = format!("{}, {}.", &caps[1], caps[2].trim());
            let work = caps[3].trim().to_string();
            let reference = format!("{} {}. {}", author, work, caps[4].trim());
            if seen.insert(reference.to_lowercase()) {
                citations.push(RawCitation {
                    reference: Some(reference),
                    citation_type: Some("scholarly".to_string()),
                    author: Some(author),
                    work: Some(work),
                    context: Some("Bibliographic note".to_string()),
                    ..Default::default()
                });
            }
        }
        if scholarly {
            continue;
        }

        let Some(caps) = NOTE_LINE.captures(line) else {
            continue;
        };
        let body = caps[2].trim_end_matches('.').trim();
        if !SCRIPTURE_LEAD.is_match(body) {
            continue;
        }
        if seen.insert(body.to_lowercase()) {
            let context = match chapter {
                Some(n) => format!("Note {}, chapter {}", &caps[1], n),
                None => format!("Note {}", &caps[1]),
            };
            citations.push(RawCitation {
                reference: Some(body.to_string()),
                citation_type: Some("footnote".to_string()),
                context: Some(context),
                ..Default::default()
            });
        }
    }

    citations
}
