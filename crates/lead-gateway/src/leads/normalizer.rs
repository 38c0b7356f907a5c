//! Maps the payload shapes the site's forms have sent over time onto one
//! [`LeadSubmission`].

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::domain::{FormKind, LeadSubmission};
use super::error::LeadError;

/// Keys carrying the form kind, in resolution order.
const FORM_KIND_KEYS: [&str; 4] = ["form_kind", "kind", "leadType", "formKind"];
const SOURCE_KEYS: [&str; 2] = ["source", "origin"];
const HONEYPOT_KEYS: [&str; 2] = ["website", "honeypot"];
/// Keys of the upstream body that payload extras must not shadow.
const CANONICAL_KEYS: [&str; 5] = ["name", "email", "phone", "message", "submitted_at"];

/// Parses a raw request body into a canonical submission.
pub fn normalize(body: &[u8]) -> Result<LeadSubmission, LeadError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|err| LeadError::Parse(err.to_string()))?;

    match value {
        Value::Object(fields) => Ok(normalize_fields(&fields)),
        other => Err(LeadError::Parse(format!(
            "expected an object, found {}",
            json_type(&other)
        ))),
    }
}

/// Canonicalizes an already-parsed JSON object.
pub fn normalize_fields(fields: &Map<String, Value>) -> LeadSubmission {
    let form_kind = first_present(fields, &FORM_KIND_KEYS)
        .map(|label| FormKind::from_label(&label))
        .unwrap_or_default();

    LeadSubmission::new(
        form_kind,
        text_field(fields, "name"),
        text_field(fields, "email"),
        text_field(fields, "phone").unwrap_or_default(),
        text_field(fields, "message").unwrap_or_default(),
        first_present(fields, &SOURCE_KEYS).unwrap_or_default(),
        first_present(fields, &HONEYPOT_KEYS).unwrap_or_default(),
        extra_fields(fields),
    )
}

/// Non-blank scalar answers outside the known keys, such as `lakes` or `budget`.
fn extra_fields(fields: &Map<String, Value>) -> BTreeMap<String, String> {
    fields
        .keys()
        .filter(|key| !is_reserved(key))
        .filter_map(|key| {
            text_field(fields, key)
                .filter(|value| !value.is_empty())
                .map(|value| (key.clone(), value))
        })
        .collect()
}

fn is_reserved(key: &str) -> bool {
    [
        &FORM_KIND_KEYS[..],
        &SOURCE_KEYS[..],
        &HONEYPOT_KEYS[..],
        &CANONICAL_KEYS[..],
    ]
    .iter()
    .any(|keys| keys.contains(&key))
}

/// First key whose value is non-blank after trimming.
fn first_present(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| text_field(fields, key))
        .find(|value| !value.is_empty())
}

/// Trimmed text of a scalar field. Null, arrays and objects count as absent.
fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
