use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

/// A loosely-typed source record. Key names vary per source document; the
/// normalizer maps them onto the canonical schema.
pub type RawRecord = Map<String, Value>;

/// Parses raw file contents into raw records.
///
/// Never fails for malformed input: the parser degrades through fallback
/// strategies instead, stopping at the first one that yields usable
/// records. A document that yields nothing after every fallback produces an
/// empty vector, and downstream stages no-op gracefully.
pub fn parse_records(raw: &str) -> Vec<RawRecord> {
    let text = strip_code_fence(raw);
    if text.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(text) {
        Ok(parsed) => collect_candidates(parsed),
        Err(err) => {
            debug!(error = %err, "whole-document parse failed; trying JSON-Lines");
            parse_json_lines(text)
        }
    }
}

/// Generated or copy-pasted input files sometimes arrive wrapped in a
/// triple-backtick code fence.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.starts_with("```") {
        trimmed.trim_matches('`').trim()
    } else {
        trimmed
    }
}

fn collect_candidates(parsed: Value) -> Vec<RawRecord> {
    match parsed {
        Value::Array(items) => records_from(items),
        Value::Object(mut map) => {
            // common wrappers
            for wrapper in ["items", "data"] {
                if matches!(map.get(wrapper), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = map.remove(wrapper) {
                        return records_from(items);
                    }
                }
            }
            vec![map]
        }
        // A bare scalar carries no key/value structure to salvage.
        _ => Vec::new(),
    }
}

/// Non-mapping items anywhere in the parsed structure are skipped silently.
fn records_from(items: Vec<Value>) -> Vec<RawRecord> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

fn parse_json_lines(text: &str) -> Vec<RawRecord> {
    let mut records = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(map)) => records.push(map),
            Ok(_) => {}
            Err(_) => {
                // A line that is not JSON means the document is not really
                // line-delimited; a single whole-document scan replaces the
                // per-line results.
                debug!("line failed to parse; scanning whole document for objects");
                return extract_brace_objects(text);
            }
        }
    }

    records
}

/// Last-resort scan: JSON-parse every brace-delimited substring with no
/// inner braces. Nested objects and literal braces inside string fields
/// defeat this scan; it trades accuracy for never failing the run.
fn extract_brace_objects(text: &str) -> Vec<RawRecord> {
    static OBJECT_PATTERN: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    let pattern =
        OBJECT_PATTERN.get_or_init(|| Regex::new(r"\{[^{}]*\}").expect("pattern is valid"));

    pattern
        .find_iter(text)
        .filter_map(|candidate| serde_json::from_str::<Value>(candidate.as_str()).ok())
        .filter_map(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}
