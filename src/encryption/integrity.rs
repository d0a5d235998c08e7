//! Integrity hashing for tamper evidence
//!
//! Canonical-JSON SHA-256 digests provide tamper evidence outside the
//! encryption channel. Canonicalization sorts object keys recursively so
//! semantically equal values hash identically regardless of key order.

use crate::domain::Result;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Calculate a SHA-256 digest of a JSON value
///
/// # Examples
///
/// ```
/// use custodia::encryption::integrity::generate_data_hash;
/// use serde_json::json;
///
/// let hash = generate_data_hash(&json!({"key": "value"})).unwrap();
/// assert_eq!(hash.len(), 64); // 64 hex characters
/// ```
pub fn generate_data_hash(data: &Value) -> Result<String> {
    let normalized = normalize_json(data);
    let data_str = serde_json::to_string(&normalized)?;

    let mut hasher = Sha256::new();
    hasher.update(data_str.as_bytes());
    let result = hasher.finalize();

    Ok(format!("{result:x}"))
}

/// Verify a value against a previously generated digest
pub fn verify_data_hash(data: &Value, expected: &str) -> Result<bool> {
    let actual = generate_data_hash(data)?;
    Ok(actual == expected)
}

/// Recursively sort all object keys so hashes are order-independent
fn normalize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: std::collections::BTreeMap<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), normalize_json(v)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(arr) => Value::Array(arr.iter().map(normalize_json).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_is_stable() {
        let data = json!({"a": 1, "b": [1, 2, 3]});
        assert_eq!(
            generate_data_hash(&data).unwrap(),
            generate_data_hash(&data).unwrap()
        );
    }

    #[test]
    fn test_hash_ignores_key_order() {
        let a = json!({"first": 1, "second": 2});
        let b = json!({"second": 2, "first": 1});
        assert_eq!(
            generate_data_hash(&a).unwrap(),
            generate_data_hash(&b).unwrap()
        );
    }

    #[test]
    fn test_hash_detects_change() {
        let original = json!({"weight": 180});
        let tampered = json!({"weight": 181});
        let hash = generate_data_hash(&original).unwrap();

        assert!(verify_data_hash(&original, &hash).unwrap());
        assert!(!verify_data_hash(&tampered, &hash).unwrap());
    }

    #[test]
    fn test_nested_normalization() {
        let a = json!({"outer": {"x": 1, "y": 2}});
        let b = json!({"outer": {"y": 2, "x": 1}});
        assert_eq!(
            generate_data_hash(&a).unwrap(),
            generate_data_hash(&b).unwrap()
        );
    }
}
