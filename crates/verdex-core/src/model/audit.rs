//! Audit record model
//!
//! An audit record is the immutable result of one complete evaluation run,
//! identified by a content-addressed `result_hash`. Once constructed a
//! record never changes; amendments are new records carrying a `supersedes`
//! back-reference (a non-owning relation) to the prior record's hash.
//!
//! ## Hash discipline
//!
//! `result_hash` covers `(snapshot_hash, ruleset_versions, verdicts,
//! supersedes)` in canonical form. `created_at` is deliberately excluded:
//! equal inputs must always yield an equal result hash regardless of when
//! the run happened.

use crate::digest::hash_canonical;
use crate::errors::{Result, VerdexError};
use crate::model::ruleset::RulesetVersionRef;
use crate::model::verdict::Verdict;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical hashed form of a record. Private on purpose — this is the one
/// place that defines what the result hash covers.
#[derive(Serialize)]
struct CanonicalResult<'a> {
    snapshot_hash: &'a str,
    ruleset_versions: &'a [RulesetVersionRef],
    verdicts: &'a [Verdict],
    supersedes: Option<&'a str>,
}

/// Compute the result hash over the canonical record content.
///
/// `ruleset_versions` must already be sorted and deduplicated; `verdicts`
/// must be in evaluation order.
///
/// ## Errors
///
/// Returns `VerdexError::Serialization` if canonicalization fails.
pub fn compute_result_digest(
    snapshot_hash: &str,
    ruleset_versions: &[RulesetVersionRef],
    verdicts: &[Verdict],
    supersedes: Option<&str>,
) -> Result<String> {
    hash_canonical(&CanonicalResult {
        snapshot_hash,
        ruleset_versions,
        verdicts,
        supersedes,
    })
}

/// Immutable result of one evaluation run
///
/// Constructed only by the audit assembler; adapters consume records, they
/// do not build them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Content hash of the evaluated snapshot
    pub snapshot_hash: String,

    /// All ruleset versions used, sorted and deduplicated
    pub ruleset_versions: Vec<RulesetVersionRef>,

    /// Verdicts in evaluation order, one per resolved rule
    pub verdicts: Vec<Verdict>,

    /// Result hash of the record this one amends, if any
    pub supersedes: Option<String>,

    /// Content-addressed identity of this record
    pub result_hash: String,

    /// RFC3339 creation timestamp (excluded from the result hash)
    pub created_at: String,
}

impl AuditRecord {
    /// Recompute the result hash and compare with the recorded one.
    ///
    /// This is the independent-verifiability operation of the versioning
    /// contract: any engine compatible with the ruleset major versions can
    /// re-derive the hash from record content alone.
    ///
    /// ## Errors
    ///
    /// - `VerdexError::ResultHashMismatch` if recomputation disagrees
    /// - `VerdexError::Serialization` if canonicalization fails
    pub fn verify(&self) -> Result<()> {
        let recomputed = compute_result_digest(
            &self.snapshot_hash,
            &self.ruleset_versions,
            &self.verdicts,
            self.supersedes.as_deref(),
        )?;
        if recomputed != self.result_hash {
            return Err(VerdexError::ResultHashMismatch {
                recorded: self.result_hash.clone(),
                recomputed,
            });
        }
        Ok(())
    }

    /// Semantic equality: everything the result hash covers.
    ///
    /// Two records that are `semantic_eq` are the same evaluation result
    /// even when their `created_at` timestamps differ. Equal result hashes
    /// with `semantic_eq == false` is a hash collision — a critical
    /// integrity fault.
    pub fn semantic_eq(&self, other: &AuditRecord) -> bool {
        self.snapshot_hash == other.snapshot_hash
            && self.ruleset_versions == other.ruleset_versions
            && self.verdicts == other.verdicts
            && self.supersedes == other.supersedes
    }

    /// Canonical serialized bytes of the full record (for persistence).
    ///
    /// ## Errors
    ///
    /// Returns `VerdexError::Serialization` if serialization fails.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize a record from its canonical bytes.
    ///
    /// ## Errors
    ///
    /// Returns `VerdexError::Serialization` on malformed bytes.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditRecord(result_hash={}..., verdicts={})",
            &self.result_hash[..8.min(self.result_hash.len())],
            self.verdicts.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::rule::{Predicate, Rule, Severity};
    use crate::model::snapshot::NodeKind;

    fn sample_record() -> AuditRecord {
        let rule = Rule::new(
            "r1",
            "apa7",
            "7.0.0",
            "desc",
            Severity::Info,
            0,
            Predicate::NodeExists {
                kind: NodeKind::Section,
            },
        );
        let verdicts = vec![Verdict::pass(&rule, vec![])];
        let refs = vec![RulesetVersionRef {
            ruleset_id: "apa7".to_string(),
            ruleset_version: "7.0.0".to_string(),
        }];
        let result_hash = compute_result_digest("s".repeat(64).as_str(), &refs, &verdicts, None).unwrap();
        AuditRecord {
            snapshot_hash: "s".repeat(64),
            ruleset_versions: refs,
            verdicts,
            supersedes: None,
            result_hash,
            created_at: "2025-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_verify_accepts_consistent_record() {
        let record = sample_record();
        assert!(record.verify().is_ok());
    }

    #[test]
    fn test_verify_rejects_tampered_record() {
        let mut record = sample_record();
        record.verdicts[0].rationale = "edited after the fact".to_string();
        assert!(matches!(
            record.verify(),
            Err(VerdexError::ResultHashMismatch { .. })
        ));
    }

    #[test]
    fn test_created_at_excluded_from_result_hash() {
        let a = sample_record();
        let mut b = sample_record();
        b.created_at = "2026-06-06T12:00:00+00:00".to_string();
        assert_eq!(a.result_hash, b.result_hash);
        assert!(b.verify().is_ok());
    }

    #[test]
    fn test_supersedes_changes_result_hash() {
        let a = sample_record();
        let amended_hash = compute_result_digest(
            &a.snapshot_hash,
            &a.ruleset_versions,
            &a.verdicts,
            Some(&a.result_hash),
        )
        .unwrap();
        assert_ne!(a.result_hash, amended_hash);
    }

    #[test]
    fn test_canonical_bytes_round_trip() {
        let record = sample_record();
        let bytes = record.to_canonical_bytes().unwrap();
        let back = AuditRecord::from_canonical_bytes(&bytes).unwrap();
        assert_eq!(record, back);
        assert!(back.verify().is_ok());
    }
}
