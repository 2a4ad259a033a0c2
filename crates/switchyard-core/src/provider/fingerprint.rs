//! Request fingerprints used as cache keys.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Deterministic key for a `(provider, model, payload)` request.
///
/// Hex SHA-256 of `provider \n model \n canonical-json(payload)`. Object
/// keys are written in sorted order, so two payloads that differ only in key
/// order share a fingerprint.
pub fn fingerprint(provider_id: &str, model_id: &str, payload: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(provider_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(model_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(canonical_json(payload).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// JSON text with object keys sorted at every level.
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", Value::String(k.clone()), canonical_json(&map[k])))
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        scalar => scalar.to_string(),
    }
}
