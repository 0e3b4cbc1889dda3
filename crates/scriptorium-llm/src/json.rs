//! Recovery of a JSON payload from free-form model output
//!
//! Reasoning models wrap their answer in `<think>` blocks, code fences or
//! prose, and sometimes leave trailing commas behind. This module strips the
//! noise before the payload is checked against a schema.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("valid regex"));
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));

/// Remove reasoning blocks, including an unterminated leading one
pub fn strip_reasoning(text: &str) -> String {
    let stripped = THINK_BLOCK.replace_all(text, "");
    match stripped.rfind("</think>") {
        Some(end) => stripped[end + "</think>".len()..].to_string(),
        None => stripped.into_owned(),
    }
}

/// Extract the JSON value carried by a model response
///
/// Tries, in order: the whole text, the first fenced block, and the span
/// between the first `{` and the last `}`. Each candidate is retried once
/// with trailing commas removed.
///
/// # Examples
///
/// ```
/// use scriptorium_llm::json::extract_json;
///
/// let value = extract_json("<think>hmm</think>```json\n{\"a\": [1, 2,],}\n```").unwrap();
/// assert_eq!(value["a"][1], 2);
/// ```
pub fn extract_json(raw: &str) -> Result<Value, String> {
    let text = strip_reasoning(raw);
    let text = text.trim();
    if text.is_empty() {
        return Err("empty response".to_string());
    }

    let mut candidates: Vec<&str> = vec![text];
    if let Some(inner) = CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        candidates.push(inner.as_str().trim());
    }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            candidates.push(&text[start..=end]);
        }
    }

    let mut last_error = String::from("no JSON object found in response");
    for candidate in candidates {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = format!("invalid JSON: {}", e),
        }
        let repaired = TRAILING_COMMA.replace_all(candidate, "$1");
        if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
            return Ok(value);
        }
    }
    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        assert_eq!(extract_json(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_think_block_removed() {
        let raw = "<think>{not json}</think>\n{\"a\": 1}";
        assert_eq!(extract_json(raw).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_unterminated_think_prefix() {
        let raw = "reasoning without an opening tag</think>{\"a\": 2}";
        assert_eq!(extract_json(raw).unwrap(), json!({"a": 2}));
    }

    #[test]
    fn test_prose_around_object() {
        let raw = "Here is the result:\n{\"theses\": []}\nHope it helps.";
        assert_eq!(extract_json(raw).unwrap(), json!({"theses": []}));
    }

    #[test]
    fn test_trailing_commas_repaired() {
        let raw = r#"{"list": [1, 2, ], "x": {"y": 1,},}"#;
        assert_eq!(extract_json(raw).unwrap(), json!({"list": [1, 2], "x": {"y": 1}}));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(extract_json("").is_err());
        assert!(extract_json("no braces here").is_err());
        assert!(extract_json("{\"a\": }").is_err());
    }
}
