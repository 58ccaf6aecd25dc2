//! Append-only audit record store
//!
//! Provides:
//! - Content-addressed blob storage keyed by result hash, with atomic
//!   writes, sharding, and collision detection
//! - An insert-only SQLite index for lookup and supersession chains
//!
//! No update or delete operation exists anywhere in this module.

mod atomic;
mod fs_log;
mod sharding;

pub use fs_log::FsAuditLog;
