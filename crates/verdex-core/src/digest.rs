//! Digest computation for content-addressed identity.
//!
//! Provides deterministic SHA256 digest computation for snapshots, rules,
//! and audit records.
//!
//! ## Digest Types
//!
//! - **Snapshot Digest**: Hash of the canonical node tree
//! - **Rule Digest**: Hash of a rule's canonical form (byte-identity for dedup)
//! - **Result Digest**: Hash of a complete evaluation result, excluding
//!   `created_at` (equal inputs always yield an equal result hash)
//!
//! ## Determinism Guarantees
//!
//! - Same input → same digest (canonical JSON serialization, fixed struct
//!   field order, no floating timestamps)
//! - Different content → different digest (order-sensitive)
//! - No wall-clock, randomness, or external state may enter a digest input

use crate::errors::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Compute the SHA256 digest of raw bytes.
///
/// Returns the hex-encoded digest (64 characters).
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute the SHA256 digest of a string.
pub fn hash_string(input: &str) -> String {
    hash_bytes(input.as_bytes())
}

/// Compute the SHA256 digest of a value's canonical JSON form.
///
/// Canonical means: `serde_json` with the struct's fixed field order and no
/// whitespace. All digest inputs in this crate are structs or enums with a
/// stable field order, so serialization is byte-deterministic.
///
/// ## Errors
///
/// Returns `VerdexError::Serialization` if JSON serialization fails.
pub fn hash_canonical<T: Serialize>(value: &T) -> Result<String> {
    let canonical = serde_json::to_string(value)?;
    Ok(hash_string(&canonical))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_string_deterministic() {
        let input = "test";
        let hash1 = hash_string(input);
        let hash2 = hash_string(input);
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA256 hex length
    }

    #[test]
    fn test_hash_string_different_inputs() {
        let hash1 = hash_string("test1");
        let hash2 = hash_string("test2");
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_hash_canonical_field_order_is_stable() {
        #[derive(serde::Serialize)]
        struct Probe {
            a: u32,
            b: &'static str,
        }

        let h1 = hash_canonical(&Probe { a: 1, b: "x" }).unwrap();
        let h2 = hash_canonical(&Probe { a: 1, b: "x" }).unwrap();
        assert_eq!(h1, h2);

        let h3 = hash_canonical(&Probe { a: 2, b: "x" }).unwrap();
        assert_ne!(h1, h3);
    }
}
