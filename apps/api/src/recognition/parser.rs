//! Compatibility shim for nomination columns written by older releases.
//!
//! Rows saved before nominations were stored as structured JSON can hold the
//! detail object as a string, sometimes JSON-encoded several times with
//! inconsistent quote escaping. New writes never produce that shape; this
//! module only exists so historical weeks still count toward period tallies.

use serde_json::Value;

use crate::recognition::models::Nomination;

/// Upper bound on nested string encodings unwrapped before giving up.
const MAX_ENCODING_DEPTH: usize = 4;

/// Result of decoding one stored nomination value. Never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Null, absent, or an empty string.
    Missing,
    /// Present but not recoverable as a nomination object.
    Malformed,
    Nomination(Nomination),
}

impl Decoded {
    pub fn into_nomination(self) -> Option<Nomination> {
        match self {
            Decoded::Nomination(n) => Some(n),
            _ => None,
        }
    }
}

/// Decodes a stored nomination column.
pub fn decode_nomination(raw: Option<&Value>) -> Decoded {
    match raw {
        None => Decoded::Missing,
        Some(value) => decode_value(value, 0),
    }
}

fn decode_value(value: &Value, depth: usize) -> Decoded {
    match value {
        Value::Null => Decoded::Missing,
        Value::Object(_) => serde_json::from_value::<Nomination>(value.clone())
            .map(Decoded::Nomination)
            .unwrap_or(Decoded::Malformed),
        Value::String(s) => decode_str(s, depth),
        _ => Decoded::Malformed,
    }
}

fn decode_str(raw: &str, depth: usize) -> Decoded {
    if raw.trim().is_empty() {
        return Decoded::Missing;
    }
    if depth >= MAX_ENCODING_DEPTH {
        return Decoded::Malformed;
    }
    // Well-formed JSON text is taken as-is; the quote cleanup is only a fallback
    // since it would corrupt escaped quotes inside field values.
    let parsed = serde_json::from_str::<Value>(raw)
        .or_else(|_| serde_json::from_str::<Value>(&unwrap_layers(raw)));
    match parsed {
        Ok(Value::String(inner)) => decode_str(&inner, depth + 1),
        Ok(value) => decode_value(&value, depth + 1),
        Err(_) => Decoded::Malformed,
    }
}

/// Strips every surrounding pair of double quotes, then unescapes `\"` and `\\` once.
pub fn unwrap_layers(raw: &str) -> String {
    let mut cleaned = raw.trim();
    while cleaned.len() >= 2 && cleaned.starts_with('"') && cleaned.ends_with('"') {
        cleaned = &cleaned[1..cleaned.len() - 1];
    }
    cleaned.replace("\\\"", "\"").replace("\\\\", "\\")
}
