//! Error handling for verdex-store
//!
//! Wraps the verdex-core error facility with store-specific helpers

use verdex_core::errors::{VxError, VxErrorKind};

/// Result type alias using VxError
pub type Result<T> = std::result::Result<T, VxError>;

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> VxError {
    VxError::new(VxErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> VxError {
    VxError::new(VxErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create a ruleset definition schema error
pub fn ruleset_schema(context: &str, reason: &str) -> VxError {
    VxError::new(VxErrorKind::Schema)
        .with_op("parse_ruleset")
        .with_message(format!("{}: {}", context, reason))
}

/// Create a missing-ruleset error
pub fn ruleset_not_found(ruleset_id: &str, version: Option<&str>) -> VxError {
    let mut err = VxError::new(VxErrorKind::NotFound)
        .with_op("load_ruleset")
        .with_ruleset_id(ruleset_id)
        .with_message("Ruleset not found");
    if let Some(v) = version {
        err = err.with_candidates(vec![v.to_string()]);
    }
    err
}

/// Create an audit log collision error
pub fn audit_collision(result_hash: &str) -> VxError {
    VxError::new(VxErrorKind::HashCollision)
        .with_op("append")
        .with_message(format!(
            "semantically distinct record content under result hash {}",
            result_hash
        ))
}

/// Create a missing audit blob error
pub fn blob_missing(result_hash: &str) -> VxError {
    VxError::new(VxErrorKind::NotFound)
        .with_op("get")
        .with_message(format!("no audit record for result hash {}", result_hash))
}

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> VxError {
    VxError::new(VxErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a migration checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> VxError {
    VxError::new(VxErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}
