//! Verdex Core - Deterministic normative evaluation kernel
//!
//! This crate provides the foundational data structures and operations for
//! Verdex, including:
//! - Immutable document snapshot model with content-addressed identity
//! - Rule model with a closed, serializable predicate algebra
//! - Precedence resolution of multiple rule sources into one total order
//! - The sequential blocking evaluator
//! - Audit record assembly with hash-based identity
//! - The forward-only pipeline orchestrator
//!
//! Everything here is pure and in-memory; rule loading and audit
//! persistence happen behind the `boundary` traits in collaborator crates.

pub mod assembler;
pub mod boundary;
pub mod digest;
pub mod errors;
pub mod evaluator;
pub mod kernel;
pub mod logging_facility;
pub mod model;
pub mod resolver;

// Re-export commonly used types
pub use assembler::{assemble, assemble_superseding};
pub use boundary::{AuditSink, MemoryAuditLog, RuleProvider, StoredRef};
pub use errors::{Result, VerdexError, VxError, VxErrorKind};
pub use evaluator::{evaluate, EvaluationContext};
pub use kernel::{Pipeline, RunOutcome, RunState};
pub use model::{
    AuditRecord, DocumentSnapshot, EvidenceItem, Node, NodeKind, Outcome, PrecedencePolicy,
    Predicate, Rule, RuleSet, RulesetVersionRef, Severity, SourceSpan, TextPattern, Verdict,
};
pub use resolver::{resolve, OrderedRuleSequence};
