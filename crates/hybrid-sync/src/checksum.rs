use sha2::{Digest, Sha256};

/// Computes the checksum-of-record for a payload: a lowercase hex prefix
/// of length 16 of a SHA-256 over the payload's canonical (sorted-key)
/// JSON serialization.
pub fn compute_checksum(value: &serde_json::Value) -> String {
    let canonical = canonicalize(value);
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)[..16].to_string()
}

// Canonicalization walks the JSON tree instead of relying on `serde_json`'s
// map ordering, since `Value::Object` iterates in insertion order by default.

fn canonicalize(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let entries: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", serde_json::to_string(k).unwrap_or_default(), canonicalize(&map[k])))
                .collect();
            format!("{{{}}}", entries.join(","))
        }
        serde_json::Value::Array(items) => {
            let entries: Vec<String> = items.iter().map(canonicalize).collect();
            format!("[{}]", entries.join(","))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn checksum_is_16_lowercase_hex_chars() {
        let checksum = compute_checksum(&json!({"a": 1}));
        assert_eq!(checksum.len(), 16);
        assert!(checksum.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn key_order_does_not_affect_checksum() {
        let a = compute_checksum(&json!({"a": 1, "b": 2}));
        let b = compute_checksum(&json!({"b": 2, "a": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn different_payloads_yield_different_checksums() {
        let a = compute_checksum(&json!({"a": 1}));
        let b = compute_checksum(&json!({"a": 2}));
        assert_ne!(a, b);
    }
}
