//! Verdex Engine - Configured end-to-end evaluation runs
//!
//! Ties the kernel to its boundary collaborators: TOML configuration,
//! filesystem rule store with a pinned catalog, and the durable append-only
//! audit log. One `Engine` instance serves many runs; each run's rule view
//! is pinned at start.

pub mod config;
pub mod run;

pub use config::{EngineConfig, LoggingProfile};
pub use run::Engine;
