//! Lenient conversion of generator JSON into raw records
//!
//! Models drift from the requested keys in small, predictable ways: a
//! `title` instead of a `statement`, a bare string instead of a citation
//! object, numbers where strings were asked for. The parser absorbs that
//! drift and leaves every semantic decision to the gatekeeper.

use scriptorium_domain::{
    CandidateChain, ChainAnalysis, Confidence, CorrelationAnalysis, CrossReference, RawCitation,
    RawThesis, RawUnitAnalysis, ReasoningType, Relation, ThemeGroup,
};
use serde_json::{Map, Value};
use tracing::debug;

/// Strength assigned to chains that omit one
pub const DEFAULT_CHAIN_STRENGTH: f64 = 0.7;

/// Parse a unit extraction response
pub fn parse_unit_analysis(value: &Value) -> RawUnitAnalysis {
    RawUnitAnalysis {
        theses: array(value, "theses").iter().map(parse_thesis).collect(),
        citations: array(value, "citations").iter().map(parse_citation).collect(),
    }
}

fn parse_thesis(value: &Value) -> RawThesis {
    let Some(obj) = value.as_object() else {
        // Kept so the gatekeeper reports it instead of it vanishing
        return RawThesis::default();
    };
    RawThesis {
        statement: text(obj, &["statement", "title", "thesis"]),
        description: text(obj, &["description", "explanation"]),
        thesis_type: text(obj, &["thesis_type", "type"]),
        supporting_text: text(obj, &["supporting_text", "quote"]),
        reasoning_type: text(obj, &["reasoning_type"]),
        confidence: obj.get("confidence").filter(|v| !v.is_null()).cloned(),
        citations: obj
            .get("citations")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(parse_citation).collect())
            .unwrap_or_default(),
    }
}

fn parse_citation(value: &Value) -> RawCitation {
    match value {
        Value::String(_) | Value::Number(_) => RawCitation {
            reference: scalar(value),
            ..RawCitation::default()
        },
        Value::Object(obj) => RawCitation {
            reference: text(obj, &["reference", "ref"]),
            citation_type: text(obj, &["citation_type", "type"]),
            text: text(obj, &["text"]),
            author: text(obj, &["author"]),
            work: text(obj, &["work"]),
            context: text(obj, &["context", "usage"]),
        },
        _ => RawCitation::default(),
    }
}

/// Parse a chain extraction response
///
/// Entries without both endpoints or with an unknown relation are counted
/// as rejected rather than failing the phase.
pub fn parse_chain_analysis(value: &Value) -> ChainAnalysis {
    let mut analysis = ChainAnalysis {
        argument_flow: value
            .get("argument_flow")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        ..ChainAnalysis::default()
    };

    for entry in array(value, "chains") {
        match parse_chain(entry) {
            Some(chain) => analysis.chains.push(chain),
            None => {
                debug!("Rejected chain entry: {}", entry);
                analysis.rejected += 1;
            }
        }
    }
    analysis
}

fn parse_chain(value: &Value) -> Option<CandidateChain> {
    let obj = value.as_object()?;
    let from = text(obj, &["from", "from_thesis_id", "from_claim_id"])?;
    let to = text(obj, &["to", "to_thesis_id", "to_claim_id"])?;
    let relation: Relation = text(obj, &["relation", "relationship"])?.parse().ok()?;

    let reasoning_type = text(obj, &["reasoning_type"])
        .and_then(|r| r.parse::<ReasoningType>().ok())
        .unwrap_or_default();
    let strength = match obj.get("strength") {
        None | Some(Value::Null) => Confidence::new(DEFAULT_CHAIN_STRENGTH),
        Some(v) => Confidence::try_new(number(v)?).ok()?,
    };

    Some(CandidateChain {
        from: from.trim().to_string(),
        to: to.trim().to_string(),
        relation,
        reasoning_type,
        explanation: text(obj, &["explanation"]).unwrap_or_default(),
        strength,
    })
}

/// Parse a citation correlation response
pub fn parse_correlation(value: &Value) -> CorrelationAnalysis {
    let groups = array(value, "citation_groups")
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|obj| {
            Some(ThemeGroup {
                theme: text(obj, &["theme"])?,
                description: text(obj, &["description"]).unwrap_or_default(),
                references: strings(obj.get("references").or_else(|| obj.get("citations"))),
                related_thesis_ids: strings(obj.get("related_thesis_ids")),
            })
        })
        .collect();

    let cross_references = array(value, "cross_references")
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|obj| {
            Some(CrossReference {
                primary: text(obj, &["primary", "primary_ref"])?,
                related: strings(obj.get("related").or_else(|| obj.get("related_refs"))),
                connection: text(obj, &["connection"]).unwrap_or_default(),
            })
        })
        .collect();

    CorrelationAnalysis {
        groups,
        cross_references,
    }
}

/// Parse a summary response into trimmed text
pub fn parse_summary(value: &Value) -> String {
    value
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(scalar))
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(scalar).collect())
        .unwrap_or_default()
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
