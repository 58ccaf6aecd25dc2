//! Sharding logic for the audit blob store
//!
//! Shards blobs into subdirectories based on the first 2 hex characters
//! of the result hash to avoid filesystem performance issues with too many
//! files in a single directory.

use std::path::{Path, PathBuf};

/// Compute the shard path for a given result hash
///
/// For hash "abc123...", returns "<root>/ab/abc123.json"
pub fn shard_path(root: &Path, result_hash: &str) -> PathBuf {
    // Get first 2 chars for shard directory
    let shard = &result_hash[..2.min(result_hash.len())];

    root.join(shard).join(format!("{}.json", result_hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_path() {
        let root = Path::new("/audit");
        let path = shard_path(root, "abc123def456");

        assert_eq!(path, PathBuf::from("/audit/ab/abc123def456.json"));
    }

    #[test]
    fn test_shard_path_full_hash() {
        let root = Path::new("/audit");
        let hash = "a".repeat(64);
        let path = shard_path(root, &hash);

        assert!(path.starts_with(Path::new("/audit").join("aa")));
    }
}
