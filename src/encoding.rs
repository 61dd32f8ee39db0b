//! Repair for Instagram's double-encoded text.
//!
//! The export writes UTF-8 bytes as if each byte were a Latin-1 character,
//! so "café" arrives as "cafÃ©". Every archive JSON entry goes through
//! [`repair_value`] right after parsing.

use serde_json::Value;

/// Undo the Latin-1 mis-decoding of a single string.
///
/// A string holding any code point above U+00FF cannot be the result of
/// that mis-decoding and is returned unchanged. When the recovered bytes are
/// not valid UTF-8 the input is also returned unchanged.
#[must_use]
pub fn repair_text(s: &str) -> String {
    if s.is_ascii() {
        return s.to_string();
    }

    let bytes: Option<Vec<u8>> = s.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect();

    match bytes {
        Some(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| s.to_string()),
        None => s.to_string(),
    }
}

/// Recursively repair every string in a JSON value.
///
/// Object keys, numbers, booleans and null are left as they are.
#[must_use]
pub fn repair_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(repair_text(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(repair_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, v)| (key, repair_value(v)))
                .collect(),
        ),
        other => other,
    }
}
