//! Outline normalization.
//!
//! The generation service stores whatever the model produced: sometimes a JSON
//! string, sometimes an object wrapping the list under `outline`, sometimes the
//! list itself. Everything downstream works on one canonical `Vec<OutlineEntry>`.
//! Unrecognized payloads degrade to an empty outline, which the rest of the
//! crate treats exactly like "no outline generated yet".

use serde_json::Value;

use crate::models::OutlineEntry;

/// The payload shapes the normalizer recognizes.
#[derive(Debug)]
enum OutlineShape {
    /// JSON text that still has to be parsed.
    Encoded(String),
    /// An object carrying the outline under its `outline` key.
    Wrapped(Value),
    /// The ordered entry list itself.
    Entries(Vec<Value>),
    /// Anything else, including a single entry object.
    Unrecognized,
}

impl OutlineShape {
    fn classify(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Encoded(text),
            Value::Object(mut map) => match map.remove("outline") {
                Some(inner) => Self::Wrapped(inner),
                None => Self::Unrecognized,
            },
            Value::Array(items) => Self::Entries(items),
            _ => Self::Unrecognized,
        }
    }
}

/// Turn a raw outline payload into the canonical ordered outline.
///
/// Never fails. Order is preserved and duplicate headers are passed through
/// untouched. A string is parsed once and a wrapper is unwrapped once; a
/// string nested inside a wrapper is not parsed again.
pub fn normalize(raw: &Value) -> Vec<OutlineEntry> {
    let value = match OutlineShape::classify(raw.clone()) {
        OutlineShape::Encoded(text) => match serde_json::from_str::<Value>(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Outline payload is not valid JSON: {}", e);
                return Vec::new();
            }
        },
        _ => raw.clone(),
    };

    let value = match OutlineShape::classify(value) {
        OutlineShape::Wrapped(inner) => inner,
        OutlineShape::Entries(items) => Value::Array(items),
        OutlineShape::Encoded(_) | OutlineShape::Unrecognized => {
            tracing::debug!("Outline payload has no recognizable shape");
            return Vec::new();
        }
    };

    match OutlineShape::classify(value) {
        OutlineShape::Entries(items) => decode_entries(items),
        _ => {
            tracing::debug!("Unwrapped outline is not a sequence");
            Vec::new()
        }
    }
}

fn decode_entries(items: Vec<Value>) -> Vec<OutlineEntry> {
    match serde_json::from_value(Value::Array(items)) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Outline sequence has malformed entries: {}", e);
            Vec::new()
        }
    }
}

/// Whether `header` names an entry of `outline`.
pub fn contains_header(outline: &[OutlineEntry], header: &str) -> bool {
    outline.iter().any(|entry| entry.header == header)
}
