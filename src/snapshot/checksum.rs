//! Content checksum for chain payloads.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Returns `value` with every object's keys in ascending order.
///
/// The rebuilt maps are filled in sorted order, so the result serializes
/// canonically whether or not `serde_json` preserves insertion order.
#[must_use]
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::with_capacity(entries.len());
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Canonical UTF-8 encoding: sorted keys, `,` and `:` separators, no whitespace.
#[must_use]
pub fn canonical_bytes(payload: &Value) -> Vec<u8> {
    // Serializing a `Value` cannot fail: keys are always strings.
    serde_json::to_vec(&canonicalize(payload)).unwrap_or_default()
}

/// Lowercase hex SHA-256 of the canonical encoding of `payload`.
#[must_use]
pub fn checksum(payload: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_bytes(payload));
    format!("{:x}", hasher.finalize())
}
