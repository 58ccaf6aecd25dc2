//! Boundary contracts for external collaborators.
//!
//! These traits are the only seams through which adapters interact with the
//! core: rule stores implement `RuleProvider`, audit stores implement
//! `AuditSink`. Adapters construct snapshots and consume audit records;
//! they never build verdicts or records themselves.

use crate::errors::{VxError, VxErrorKind};
use crate::model::audit::AuditRecord;
use crate::model::ruleset::RuleSet;
use std::collections::BTreeMap;
use std::fmt;

/// Reference to a stored audit record.
///
/// The store's key is the record's content-addressed `result_hash`, which
/// makes re-appending an identical record idempotent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRef {
    pub result_hash: String,
}

impl fmt::Display for StoredRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stored:{}", self.result_hash)
    }
}

/// Append-only, content-addressed audit record store.
///
/// The contract deliberately exposes no update or delete operation:
/// appended records are permanent, and amendments are new records carrying
/// a `supersedes` back-reference.
pub trait AuditSink {
    /// Append a record, keyed by its `result_hash`.
    ///
    /// Idempotent for byte-identical re-appends (returns the same
    /// `StoredRef`). Appending a different record under an existing key is
    /// a `HashCollision` — a critical integrity fault, never auto-resolved.
    ///
    /// # Errors
    ///
    /// `VxErrorKind::HashCollision`, or persistence failures.
    fn append(&mut self, record: &AuditRecord) -> Result<StoredRef, VxError>;

    /// Read a record back by its result hash.
    ///
    /// # Errors
    ///
    /// `VxErrorKind::NotFound` if no record has this hash.
    fn get(&self, result_hash: &str) -> Result<AuditRecord, VxError>;
}

/// Rule store boundary.
///
/// `version: None` selects the highest available version of the ruleset,
/// deterministically.
pub trait RuleProvider {
    /// Load one ruleset by id and optional version.
    ///
    /// # Errors
    ///
    /// `VxErrorKind::NotFound` for an unknown id/version;
    /// `VxErrorKind::Schema` if the stored definitions do not validate.
    fn load_ruleset(&self, ruleset_id: &str, version: Option<&str>) -> Result<RuleSet, VxError>;
}

/// In-memory append-only audit log.
///
/// Reference implementation of `AuditSink` for kernel tests and embedding;
/// the durable implementation lives in the store crate.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: BTreeMap<String, AuditRecord>,
}

impl MemoryAuditLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&mut self, record: &AuditRecord) -> Result<StoredRef, VxError> {
        if let Some(existing) = self.records.get(&record.result_hash) {
            if !existing.semantic_eq(record) {
                return Err(VxError::new(VxErrorKind::HashCollision)
                    .with_op("append")
                    .with_message(format!(
                        "semantically distinct record content under result hash {}",
                        record.result_hash
                    )));
            }
            // Idempotent re-append: the first record stands.
            return Ok(StoredRef {
                result_hash: record.result_hash.clone(),
            });
        }

        self.records.insert(record.result_hash.clone(), record.clone());
        Ok(StoredRef {
            result_hash: record.result_hash.clone(),
        })
    }

    fn get(&self, result_hash: &str) -> Result<AuditRecord, VxError> {
        self.records
            .get(result_hash)
            .cloned()
            .ok_or_else(|| {
                VxError::new(VxErrorKind::NotFound)
                    .with_op("get")
                    .with_message(format!("no audit record for result hash {}", result_hash))
            })
    }
}
