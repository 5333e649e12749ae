//! Redaction of structured log fields.
//!
//! The relay handles passwords, public keys and webauthn client data. None
//! of it may be written to a log file, even at debug level.

use serde_json::{Map, Value};

/// Replacement for a masked value.
pub const REDACTED: &str = "[REDACTED]";

/// Strings longer than this are replaced by their length.
pub const MAX_FIELD_LEN: usize = 512;

/// Key fragments that mark a field as sensitive (case-insensitive).
const DENYLIST_KEYS: [&str; 6] = [
    "password",
    "secret",
    "token",
    "clientdatajson",
    "private_key",
    "authorization",
];

/// Keys that are sensitive only as an exact match (case-insensitive).
const EXACT_KEYS: [&str; 2] = ["pk", "old"];

/// Whether a field with this key must never be logged.
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    EXACT_KEYS.contains(&lower.as_str()) || DENYLIST_KEYS.iter().any(|entry| lower.contains(entry))
}

/// Sanitize a value logged under `key`, recursing into objects and arrays.
pub fn sanitize_value(key: &str, value: &Value) -> Value {
    if is_sensitive_key(key) {
        return Value::String(REDACTED.to_string());
    }

    match value {
        Value::String(s) => sanitize_string(s),
        Value::Object(map) => Value::Object(sanitize_object(map)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| sanitize_value(key, item))
                .collect::<Vec<_>>(),
        ),
        _ => value.clone(),
    }
}

/// Sanitize every field of an object.
pub fn sanitize_object(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), sanitize_value(k, v)))
        .collect()
}

fn sanitize_string(raw: &str) -> Value {
    if raw.len() > MAX_FIELD_LEN {
        return Value::String(format!("[TRUNCATED:{}]", raw.len()));
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sensitive_keys() {
        assert!(is_sensitive_key("password"));
        assert!(is_sensitive_key("old_password"));
        assert!(is_sensitive_key("clientDataJSON"));
        assert!(is_sensitive_key("PK"));
        assert!(!is_sensitive_key("pkg"));
        assert!(!is_sensitive_key("cmd"));
        assert!(!is_sensitive_key("tab"));
    }

    #[test]
    fn test_nested_redaction() {
        let value = json!({
            "cmd": "login",
            "results": {"name": "alice", "password": "hunter2"},
            "items": [{"secret": "s"}]
        });

        let clean = sanitize_value("payload", &value);
        assert_eq!(clean["cmd"], "login");
        assert_eq!(clean["results"]["name"], "alice");
        assert_eq!(clean["results"]["password"], REDACTED);
        assert_eq!(clean["items"][0]["secret"], REDACTED);
    }

    #[test]
    fn test_long_string_truncated() {
        let long = "a".repeat(MAX_FIELD_LEN + 1);
        assert_eq!(
            sanitize_value("note", &json!(long)),
            json!(format!("[TRUNCATED:{}]", MAX_FIELD_LEN + 1))
        );
    }
}
