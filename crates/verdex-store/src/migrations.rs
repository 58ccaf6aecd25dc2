//! Embedded schema migrations for the audit index
//!
//! Migrations are compiled into the binary and applied in order at open.
//! Each applied migration's checksum is recorded; a changed embedded
//! migration is detected as a checksum mismatch and refused.

use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};
use rusqlite::Connection;
use verdex_core::digest::hash_string;

/// One embedded migration
struct Migration {
    id: &'static str,
    sql: &'static str,
}

/// Insert-only audit index. No migration may ever add an UPDATE or DELETE
/// surface over audit_records.
const MIGRATIONS: &[Migration] = &[Migration {
    id: "0001_audit_records",
    sql: r#"
CREATE TABLE IF NOT EXISTS audit_records (
    result_hash   TEXT PRIMARY KEY,
    snapshot_hash TEXT NOT NULL,
    supersedes    TEXT,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_records_snapshot
    ON audit_records(snapshot_hash);

CREATE INDEX IF NOT EXISTS idx_audit_records_supersedes
    ON audit_records(supersedes);
"#,
}];

/// Apply all pending migrations to the connection.
///
/// ## Errors
///
/// - `Persistence` on SQL failures
/// - checksum mismatch if an already-applied migration's embedded SQL changed
pub fn apply_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            id         TEXT PRIMARY KEY,
            checksum   TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );",
    )
    .map_err(from_rusqlite)?;

    for migration in MIGRATIONS {
        let checksum = hash_string(migration.sql);

        let applied: Option<String> = conn
            .query_row(
                "SELECT checksum FROM schema_migrations WHERE id = ?1",
                [migration.id],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(from_rusqlite(other)),
            })?;

        match applied {
            Some(existing) => {
                if existing != checksum {
                    return Err(checksum_mismatch(migration.id, &existing, &checksum));
                }
            }
            None => {
                let tx = conn.transaction().map_err(from_rusqlite)?;
                tx.execute_batch(migration.sql)
                    .map_err(|e| migration_error(migration.id, &e.to_string()))?;
                tx.execute(
                    "INSERT INTO schema_migrations (id, checksum, applied_at) VALUES (?1, ?2, ?3)",
                    rusqlite::params![
                        migration.id,
                        checksum,
                        chrono::Utc::now().to_rfc3339()
                    ],
                )
                .map_err(from_rusqlite)?;
                tx.commit().map_err(from_rusqlite)?;
            }
        }
    }

    Ok(())
}
