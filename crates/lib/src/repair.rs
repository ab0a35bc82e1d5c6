//! # Model Response Repair
//!
//! Language models asked for "JSON only" still wrap their answer in code fences
//! or a sentence of prose. This module recovers a top-level JSON object from
//! such responses using a fixed sequence of cheap heuristics.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

static OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```(?:json)?\s*").expect("Invalid regex"));
static CLOSING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```$").expect("Invalid regex"));

/// How much of the raw response is kept on a `ParseError` for diagnosis.
const RAW_PREFIX_CHARS: usize = 200;

/// Raised when no JSON object can be recovered from a model response.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("LLM did not return valid JSON (response starts with: {raw_prefix:?})")]
pub struct ParseError {
    /// The first characters of the raw response.
    pub raw_prefix: String,
}

impl ParseError {
    fn new(raw: &str) -> Self {
        Self {
            raw_prefix: raw.chars().take(RAW_PREFIX_CHARS).collect(),
        }
    }
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Parses `text` as a JSON object, tolerating code fences and surrounding prose.
///
/// Tries, in order: the trimmed text as-is, the text with a leading code fence
/// (optionally tagged `json`) and trailing fence removed, and finally the span
/// from the first `{` to the last `}`. A top-level value that is not an object
/// counts as a failure at every step.
///
/// Responses holding several independent objects fail, because the outer span
/// is not itself valid JSON.
pub fn robust_json_loads(text: &str) -> Result<Map<String, Value>, ParseError> {
    let trimmed = text.trim();
    if let Some(map) = parse_object(trimmed) {
        return Ok(map);
    }
    debug!("Direct JSON parse failed; attempting repair.");

    let mut candidate = trimmed.to_string();
    if candidate.starts_with("```") {
        candidate = OPENING_FENCE.replace(&candidate, "").into_owned();
        candidate = CLOSING_FENCE.replace(&candidate, "").into_owned();
    }

    if let (Some(start), Some(end)) = (candidate.find('{'), candidate.rfind('}')) {
        if start < end {
            if let Some(map) = parse_object(&candidate[start..=end]) {
                return Ok(map);
            }
        }
    }

    Err(ParseError::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_object_parses_directly() {
        let map = robust_json_loads(r#"  {"title": "Doc"}  "#).unwrap();
        assert_eq!(Value::Object(map), json!({"title": "Doc"}));
    }

    #[test]
    fn test_prose_and_fence_are_stripped() {
        let map = robust_json_loads("Here is the result:\n```json\n{\"title\": \"Doc\"}\n```").unwrap();
        assert_eq!(Value::Object(map), json!({"title": "Doc"}));
    }

    #[test]
    fn test_leading_fence_is_case_insensitive() {
        let map = robust_json_loads("```JSON\n{\"a\": [1, 2]}\n```").unwrap();
        assert_eq!(Value::Object(map), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_non_json_fails() {
        let err = robust_json_loads("not json at all").unwrap_err();
        assert_eq!(err.raw_prefix, "not json at all");
    }

    #[test]
    fn test_multiple_fragments_fail_fast() {
        assert!(robust_json_loads(r#"{"a": 1} extra trailing text {"b": 2}"#).is_err());
    }

    #[test]
    fn test_top_level_array_is_rejected() {
        assert!(robust_json_loads("[1, 2, 3]").is_err());
        assert!(robust_json_loads("[{\"a\": 1}]").is_ok_and(|m| m["a"] == json!(1)));
    }

    #[test]
    fn test_raw_prefix_is_bounded() {
        let raw = "x".repeat(1000);
        let err = robust_json_loads(&raw).unwrap_err();
        assert_eq!(err.raw_prefix.len(), RAW_PREFIX_CHARS);
    }
}
