//! Durable append-only audit log
//!
//! Records are stored as content-addressed blobs keyed by `result_hash`
//! (sharded, written atomically), with an insert-only SQLite index row for
//! lookup and supersession chains. The exposed surface is append and read —
//! no update, no delete.

use crate::audit::atomic::atomic_write;
use crate::audit::sharding::shard_path;
use crate::errors::{audit_collision, blob_missing, from_rusqlite, io_error, Result};
use crate::migrations::apply_migrations;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use verdex_core::boundary::{AuditSink, StoredRef};
use verdex_core::errors::VxError;
use verdex_core::model::audit::AuditRecord;

/// Filesystem + SQLite append-only audit log
pub struct FsAuditLog {
    blob_root: PathBuf,
    conn: Connection,
}

impl FsAuditLog {
    /// Open (or create) an audit log rooted at the given directory.
    ///
    /// Layout: `<root>/blobs/<aa>/<result_hash>.json` plus `<root>/index.db`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|e| io_error("create_audit_root", e))?;

        let mut conn = Connection::open(root.join("index.db")).map_err(from_rusqlite)?;
        apply_migrations(&mut conn)?;

        Ok(Self {
            blob_root: root.join("blobs"),
            conn,
        })
    }

    fn read_blob(&self, result_hash: &str) -> Result<Option<AuditRecord>> {
        let path = shard_path(&self.blob_root, result_hash);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|e| io_error("read_audit_blob", e))?;
        let record = AuditRecord::from_canonical_bytes(&bytes)
            .map_err(|e| VxError::from(e).with_op("read_audit_blob"))?;
        Ok(Some(record))
    }

    /// Number of indexed records
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM audit_records", [], |row| row.get(0))
            .map_err(from_rusqlite)?;
        Ok(count as usize)
    }

    /// Whether the log holds no records
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// All stored result hashes in deterministic (hash-sorted) order
    pub fn list_hashes(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT result_hash FROM audit_records ORDER BY result_hash")
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(from_rusqlite)?;
        let mut hashes = Vec::new();
        for row in rows {
            hashes.push(row.map_err(from_rusqlite)?);
        }
        Ok(hashes)
    }

    /// Walk the supersession chain starting at `result_hash`, most recent
    /// first. Every referenced prior record must be present.
    pub fn chain(&self, result_hash: &str) -> Result<Vec<AuditRecord>> {
        let mut records = Vec::new();
        let mut cursor = Some(result_hash.to_string());
        while let Some(hash) = cursor {
            let record = self.get(&hash)?;
            cursor = record.supersedes.clone();
            records.push(record);
        }
        Ok(records)
    }
}

impl AuditSink for FsAuditLog {
    fn append(&mut self, record: &AuditRecord) -> Result<StoredRef> {
        if let Some(existing) = self.read_blob(&record.result_hash)? {
            if !existing.semantic_eq(record) {
                return Err(audit_collision(&record.result_hash));
            }
            // Idempotent re-append: the first blob stands, but make sure the
            // index row exists (covers a crash between blob write and index
            // insert).
        } else {
            let bytes = record
                .to_canonical_bytes()
                .map_err(|e| VxError::from(e).with_op("append"))?;
            atomic_write(&shard_path(&self.blob_root, &record.result_hash), &bytes)?;
        }

        self.conn
            .execute(
                "INSERT OR IGNORE INTO audit_records
                     (result_hash, snapshot_hash, supersedes, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    record.result_hash,
                    record.snapshot_hash,
                    record.supersedes,
                    record.created_at
                ],
            )
            .map_err(from_rusqlite)?;

        tracing::debug!(result_hash = %record.result_hash, "audit record appended");
        Ok(StoredRef {
            result_hash: record.result_hash.clone(),
        })
    }

    fn get(&self, result_hash: &str) -> Result<AuditRecord> {
        self.read_blob(result_hash)?
            .ok_or_else(|| blob_missing(result_hash))
    }
}
