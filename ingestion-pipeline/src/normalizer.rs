use common::types::policy_chunk::PolicyChunk;
use serde_json::Value;

use crate::parser::RawRecord;

/// Maps heterogeneous raw records onto the canonical chunk schema.
///
/// The position counter is 1-based and spans the whole pass: it advances
/// for every record that reaches this stage, regardless of whether the
/// chunk is later dropped by the filter, so synthesized ids stay stable
/// for a given input.
pub fn normalize_records(records: Vec<RawRecord>) -> Vec<PolicyChunk> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| normalize_record(&record, index.saturating_add(1)))
        .collect()
}

fn normalize_record(record: &RawRecord, position: usize) -> PolicyChunk {
    let id = scalar_field(record, "_id")
        .or_else(|| scalar_field(record, "id"))
        .unwrap_or_else(|| format!("rec-{position}"));

    let text = text_field(record, "chunk_text")
        .or_else(|| text_field(record, "text"))
        .or_else(|| text_field(record, "content"))
        .unwrap_or_else(|| composite_text(record));

    let category = match record.get("category") {
        Some(Value::String(category)) => category.clone(),
        _ => String::new(),
    };

    PolicyChunk::new(id, text, category)
}

/// Builds retrievable text from structured fields when no pre-rendered text
/// field exists. Source documents mix both conventions; a record with
/// neither yields an empty string and is dropped by the filter.
fn composite_text(record: &RawRecord) -> String {
    let mut parts: Vec<String> = Vec::new();

    for key in ["control_id", "risk_area"] {
        if let Some(part) = scalar_field(record, key) {
            parts.push(part);
        }
    }

    match record.get("requirements") {
        Some(Value::Array(items)) => {
            let joined = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|requirement| !requirement.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if !joined.is_empty() {
                parts.push(joined);
            }
        }
        Some(Value::String(requirements)) if !requirements.trim().is_empty() => {
            parts.push(requirements.trim().to_owned());
        }
        _ => {}
    }

    for key in ["note", "references", "nist_reference"] {
        if let Some(Value::String(value)) = record.get(key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_owned());
            }
        }
    }

    parts.join(" ")
}

/// A pre-rendered text field wins as long as it is non-empty, even when it
/// is whitespace only; the filter owns the whitespace policy.
fn text_field(record: &RawRecord, key: &str) -> Option<String> {
    match record.get(key) {
        Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}

fn scalar_field(record: &RawRecord, key: &str) -> Option<String> {
    match record.get(key) {
        Some(Value::String(value)) => {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Some(Value::Number(value)) => Some(value.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test records are objects"),
        }
    }

    #[test]
    fn explicit_underscore_id_wins_over_id() {
        let chunks = normalize_records(vec![record(
            json!({"_id": "primary", "id": "secondary", "text": "t"}),
        )]);

        assert_eq!(chunks[0].id, "primary");
    }

    #[test]
    fn missing_ids_synthesize_sequential_positions() {
        let chunks = normalize_records(vec![
            record(json!({"text": "first"})),
            record(json!({"id": "explicit", "text": "second"})),
            record(json!({"text": "third"})),
        ]);

        assert_eq!(chunks[0].id, "rec-1");
        assert_eq!(chunks[1].id, "explicit");
        // The counter covers every record reaching this stage, so the third
        // record gets position 3, not 2.
        assert_eq!(chunks[2].id, "rec-3");
    }

    #[test]
    fn text_resolution_order_is_chunk_text_then_text_then_content() {
        let chunks = normalize_records(vec![
            record(json!({"chunk_text": "a", "text": "b", "content": "c"})),
            record(json!({"text": "b", "content": "c"})),
            record(json!({"content": "c"})),
        ]);

        assert_eq!(chunks[0].text, "a");
        assert_eq!(chunks[1].text, "b");
        assert_eq!(chunks[2].text, "c");
    }

    #[test]
    fn structured_fields_compose_into_text() {
        let chunks = normalize_records(vec![record(json!({
            "control_id": "AC-1",
            "requirements": ["Do X", "Do Y"]
        }))]);

        assert_eq!(chunks[0].text, "AC-1 Do X Do Y");
    }

    #[test]
    fn composite_includes_all_fallback_fields_in_order() {
        let chunks = normalize_records(vec![record(json!({
            "control_id": "SC-7",
            "risk_area": "Boundary Protection",
            "requirements": "  Deploy a firewall.  ",
            "note": "Applies to DMZ hosts.",
            "references": "Policy 12",
            "nist_reference": "NIST SP 800-53"
        }))]);

        assert_eq!(
            chunks[0].text,
            "SC-7 Boundary Protection Deploy a firewall. Applies to DMZ hosts. Policy 12 NIST SP 800-53"
        );
    }

    #[test]
    fn requirements_list_skips_blank_and_non_string_entries() {
        let chunks = normalize_records(vec![record(json!({
            "control_id": "AU-2",
            "requirements": ["  Log events  ", "", 17, "Review logs"]
        }))]);

        assert_eq!(chunks[0].text, "AU-2 Log events Review logs");
    }

    #[test]
    fn record_with_no_text_sources_normalizes_to_empty_text() {
        let chunks = normalize_records(vec![record(json!({"_id": "bare"}))]);

        assert_eq!(chunks[0].text, "");
        assert!(!chunks[0].is_indexable());
    }

    #[test]
    fn category_is_carried_verbatim_or_empty() {
        let chunks = normalize_records(vec![
            record(json!({"text": "t", "category": "Access Control"})),
            record(json!({"text": "t"})),
        ]);

        assert_eq!(chunks[0].category, "Access Control");
        assert_eq!(chunks[1].category, "");
    }

    #[test]
    fn numeric_ids_render_as_strings() {
        let chunks = normalize_records(vec![record(json!({"_id": 12, "text": "t"}))]);

        assert_eq!(chunks[0].id, "12");
    }
}
