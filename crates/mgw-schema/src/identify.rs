//! Human-facing labels for resource documents, used in logs and reports.

use serde_json::Value;

/// Top-level fields tried in order when labelling a document.
pub const IDENTIFICATION_FIELDS: &[&str] = &["id", "name", "username"];

/// Returns the first non-empty `id`, `name`, or `username` of a raw JSON
/// document. Numbers are rendered as text. Returns an empty string when
/// none is present or the input is not a JSON object.
pub fn get_resource_identification(raw: impl AsRef<[u8]>) -> String {
    match serde_json::from_slice::<Value>(raw.as_ref()) {
        Ok(doc) => resource_identification(&doc),
        Err(_) => String::new(),
    }
}

/// Like [`get_resource_identification`], for a parsed document.
pub fn resource_identification(doc: &Value) -> String {
    let Some(object) = doc.as_object() else {
        return String::new();
    };
    IDENTIFICATION_FIELDS
        .iter()
        .find_map(|field| match object.get(*field) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}
