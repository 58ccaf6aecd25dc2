//! Rule loading boundary
//!
//! Provides:
//! - Versioned YAML wire format for ruleset definitions
//! - Validating loader (`FsRuleStore` implements the core `RuleProvider`)
//! - Pinned, read-only rule catalog for per-run views

pub mod catalog;
pub mod format_v1;
pub mod loader;

pub use catalog::{CatalogView, RuleCatalog};
pub use loader::{parse_ruleset_file, parse_ruleset_str, FsRuleStore};
