use thiserror::Error;
use verdex_core_types::{RequestId, TraceId};

/// Result type alias using VerdexError
pub type Result<T> = std::result::Result<T, VerdexError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// in the Verdex system. Each kind maps to a stable error code that can be
/// used for programmatic error handling, testing, and external API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VxErrorKind {
    // Precedence resolution
    /// Ambiguous rule precedence or ambiguous version selection — never silently resolved
    Conflict,

    // Rule / snapshot definitions
    /// Malformed rule or snapshot data — aborts before evaluation
    Schema,

    // Evaluation
    /// A predicate could not be evaluated against the given snapshot
    /// (distinct from a rule Fail verdict)
    Evaluation,

    // Loading
    /// Missing ruleset or ruleset version
    NotFound,

    // Audit integrity
    /// Two semantically distinct audit records computed an equal result hash
    HashCollision,
    /// A recomputed digest disagrees with a recorded one
    DeterminismViolation,

    // Orchestration
    /// A pipeline stage transition that is not strictly forward
    InvalidTransition,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl VxErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            VxErrorKind::Conflict => "ERR_CONFLICT",
            VxErrorKind::Schema => "ERR_SCHEMA",
            VxErrorKind::Evaluation => "ERR_EVALUATION",
            VxErrorKind::NotFound => "ERR_NOT_FOUND",
            VxErrorKind::HashCollision => "ERR_HASH_COLLISION",
            VxErrorKind::DeterminismViolation => "ERR_DETERMINISM_VIOLATION",
            VxErrorKind::InvalidTransition => "ERR_INVALID_TRANSITION",
            VxErrorKind::Io => "ERR_IO",
            VxErrorKind::Serialization => "ERR_SERIALIZATION",
            VxErrorKind::Persistence => "ERR_PERSISTENCE",
            VxErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// This error type provides a structured representation of errors with
/// classification fields for programmatic handling and rich context for
/// debugging. Every error surfaced by the orchestrator carries the stage
/// and the offending rule/node identifiers where applicable.
#[derive(Debug, Clone)]
pub struct VxError {
    kind: VxErrorKind,
    op: Option<String>,
    stage: Option<String>,
    rule_id: Option<String>,
    ruleset_id: Option<String>,
    node_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<VxError>>,
    candidates: Option<Vec<String>>,
}

impl VxError {
    /// Create a new error with the specified kind
    pub fn new(kind: VxErrorKind) -> Self {
        Self {
            kind,
            op: None,
            stage: None,
            rule_id: None,
            ruleset_id: None,
            node_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
            candidates: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add pipeline stage context
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Add rule ID context
    pub fn with_rule_id(mut self, id: impl Into<String>) -> Self {
        self.rule_id = Some(id.into());
        self
    }

    /// Add ruleset ID context
    pub fn with_ruleset_id(mut self, id: impl Into<String>) -> Self {
        self.ruleset_id = Some(id.into());
        self
    }

    /// Add node ID context
    pub fn with_node_id(mut self, id: impl Into<String>) -> Self {
        self.node_id = Some(id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add trace ID context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: VxError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Add candidate ids (used for Conflict to carry the colliding versions)
    pub fn with_candidates(mut self, ids: Vec<String>) -> Self {
        self.candidates = Some(ids);
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> VxErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the pipeline stage context, if any
    pub fn stage(&self) -> Option<&str> {
        self.stage.as_deref()
    }

    /// Get the rule ID context, if any
    pub fn rule_id(&self) -> Option<&str> {
        self.rule_id.as_deref()
    }

    /// Get the ruleset ID context, if any
    pub fn ruleset_id(&self) -> Option<&str> {
        self.ruleset_id.as_deref()
    }

    /// Get the node ID context, if any
    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the trace ID context, if any
    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&VxError> {
        self.source.as_deref()
    }

    /// Get candidate ids, if any (populated on Conflict)
    pub fn candidates(&self) -> Option<&[String]> {
        self.candidates.as_deref()
    }
}

impl std::fmt::Display for VxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(stage) = &self.stage {
            write!(f, " in stage '{}'", stage)?;
        }
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(rule_id) = &self.rule_id {
            write!(f, " (rule_id: {})", rule_id)?;
        }
        if let Some(ruleset_id) = &self.ruleset_id {
            write!(f, " (ruleset_id: {})", ruleset_id)?;
        }
        if let Some(node_id) = &self.node_id {
            write!(f, " (node_id: {})", node_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for VxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

// ========== End Error Facility ==========

/// Comprehensive error taxonomy for Verdex operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerdexError {
    // ===== Precedence Resolution Errors =====
    /// Same ruleset active in two versions at once — ambiguous version selection
    #[error("Ambiguous version selection for ruleset {ruleset_id}: versions {versions:?} active simultaneously")]
    AmbiguousVersion {
        ruleset_id: String,
        versions: Vec<String>,
    },

    /// Same rule_id declared with differing content and no disambiguating merge
    #[error("Duplicate rule {rule_id} with differing content (declared by {first_ruleset} and {second_ruleset})")]
    DuplicateRule {
        rule_id: String,
        first_ruleset: String,
        second_ruleset: String,
    },

    /// A rule source is not covered by the declared precedence policy
    #[error("Ruleset {ruleset_id} is not declared in the precedence policy")]
    SourceNotInPolicy { ruleset_id: String },

    // ===== Schema Errors =====
    /// Rule identifier is empty or whitespace-only
    #[error("Invalid rule identifier in ruleset {ruleset_id}: {reason}")]
    InvalidRuleId { ruleset_id: String, reason: String },

    /// A rule declares a ruleset_id different from the set that owns it
    #[error("Rule {rule_id} declares ruleset {declared} but belongs to {owner}")]
    RuleOutsideSet {
        rule_id: String,
        declared: String,
        owner: String,
    },

    /// Duplicate rule_id within a single ruleset
    #[error("Duplicate rule {rule_id} within ruleset {ruleset_id}")]
    DuplicateRuleInSet {
        ruleset_id: String,
        rule_id: String,
    },

    /// Ruleset version string does not parse as MAJOR.MINOR.PATCH
    #[error("Invalid version '{version}' for ruleset {ruleset_id}")]
    InvalidVersion {
        ruleset_id: String,
        version: String,
    },

    /// CountInRange with min greater than max
    #[error("Invalid count range in rule {rule_id}: min {min} > max {max}")]
    InvalidCountRange { rule_id: String, min: u32, max: u32 },

    /// Generic malformed definition (wire-format level)
    #[error("Schema error: {reason}")]
    Schema { reason: String },

    // ===== Evaluation Errors =====
    /// A predicate requires a node that the snapshot does not contain
    #[error("Predicate of rule {rule_id} cannot resolve required node {node_id}")]
    PredicateUnresolvable { rule_id: String, node_id: String },

    /// A predicate depends on a rule with no recorded outcome
    #[error("Rule {rule_id} depends on rule {depends_on}, which has no recorded outcome")]
    UnknownRuleDependency { rule_id: String, depends_on: String },

    /// Verdict count does not match resolved rule count (internal invariant)
    #[error("Verdict count {verdicts} does not match resolved rule count {rules}")]
    VerdictCountMismatch { verdicts: usize, rules: usize },

    // ===== Loading Errors =====
    /// Ruleset (or requested version) is unknown to the provider
    #[error("Ruleset not found: {ruleset_id} (version: {version:?})")]
    RulesetNotFound {
        ruleset_id: String,
        version: Option<String>,
    },

    // ===== Audit Integrity Errors =====
    /// Two semantically distinct records computed the same result hash
    #[error("Hash collision on result hash {result_hash}: distinct record content")]
    HashCollision { result_hash: String },

    /// A record's recomputed result hash disagrees with its recorded one
    #[error("Result hash mismatch: recorded {recorded}, recomputed {recomputed}")]
    ResultHashMismatch {
        recorded: String,
        recomputed: String,
    },

    // ===== Orchestration Errors =====
    /// Pipeline transition that is not strictly forward
    #[error("Invalid pipeline transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    // ===== Generic Errors =====
    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from VerdexError to VxError
///
/// Domain operations return the taxonomy type; the orchestrator and the
/// boundary collaborators surface the canonical facility type with stage
/// and identifier context attached.
impl From<VerdexError> for VxError {
    fn from(err: VerdexError) -> Self {
        match err {
            VerdexError::AmbiguousVersion {
                ruleset_id,
                versions,
            } => VxError::new(VxErrorKind::Conflict)
                .with_op("resolve")
                .with_ruleset_id(ruleset_id)
                .with_candidates(versions)
                .with_message("Ambiguous version selection"),

            VerdexError::DuplicateRule {
                rule_id,
                first_ruleset,
                second_ruleset,
            } => VxError::new(VxErrorKind::Conflict)
                .with_op("resolve")
                .with_rule_id(rule_id)
                .with_candidates(vec![first_ruleset, second_ruleset])
                .with_message("Duplicate rule with differing content"),

            VerdexError::SourceNotInPolicy { ruleset_id } => VxError::new(VxErrorKind::Schema)
                .with_op("resolve")
                .with_ruleset_id(ruleset_id)
                .with_message("Ruleset is not declared in the precedence policy"),

            VerdexError::InvalidRuleId { ruleset_id, reason } => {
                VxError::new(VxErrorKind::Schema)
                    .with_ruleset_id(ruleset_id)
                    .with_message(format!("Invalid rule identifier: {}", reason))
            }

            VerdexError::RuleOutsideSet {
                rule_id,
                declared,
                owner,
            } => VxError::new(VxErrorKind::Schema)
                .with_rule_id(rule_id)
                .with_ruleset_id(owner)
                .with_message(format!("Rule declares foreign ruleset {}", declared)),

            VerdexError::DuplicateRuleInSet {
                ruleset_id,
                rule_id,
            } => VxError::new(VxErrorKind::Schema)
                .with_rule_id(rule_id)
                .with_ruleset_id(ruleset_id)
                .with_message("Duplicate rule within ruleset"),

            VerdexError::InvalidVersion {
                ruleset_id,
                version,
            } => VxError::new(VxErrorKind::Schema)
                .with_ruleset_id(ruleset_id)
                .with_message(format!("Invalid version '{}'", version)),

            VerdexError::InvalidCountRange { rule_id, min, max } => {
                VxError::new(VxErrorKind::Schema)
                    .with_rule_id(rule_id)
                    .with_message(format!("Invalid count range: min {} > max {}", min, max))
            }

            VerdexError::Schema { reason } => {
                VxError::new(VxErrorKind::Schema).with_message(reason)
            }

            VerdexError::PredicateUnresolvable { rule_id, node_id } => {
                VxError::new(VxErrorKind::Evaluation)
                    .with_op("evaluate")
                    .with_rule_id(rule_id)
                    .with_node_id(node_id)
                    .with_message("Predicate cannot resolve required node")
            }

            VerdexError::UnknownRuleDependency {
                rule_id,
                depends_on,
            } => VxError::new(VxErrorKind::Evaluation)
                .with_op("evaluate")
                .with_rule_id(rule_id)
                .with_message(format!("Depends on rule {} with no recorded outcome", depends_on)),

            VerdexError::VerdictCountMismatch { verdicts, rules } => {
                VxError::new(VxErrorKind::Internal)
                    .with_op("assemble")
                    .with_message(format!(
                        "Verdict count {} does not match rule count {}",
                        verdicts, rules
                    ))
            }

            VerdexError::RulesetNotFound {
                ruleset_id,
                version,
            } => {
                let mut e = VxError::new(VxErrorKind::NotFound)
                    .with_op("load_ruleset")
                    .with_ruleset_id(ruleset_id)
                    .with_message("Ruleset not found");
                if let Some(v) = version {
                    e = e.with_candidates(vec![v]);
                }
                e
            }

            VerdexError::HashCollision { result_hash } => {
                VxError::new(VxErrorKind::HashCollision)
                    .with_op("append")
                    .with_message(format!("Hash collision on result hash {}", result_hash))
            }

            VerdexError::ResultHashMismatch {
                recorded,
                recomputed,
            } => VxError::new(VxErrorKind::DeterminismViolation)
                .with_op("verify")
                .with_message(format!(
                    "Result hash mismatch: recorded {}, recomputed {}",
                    recorded, recomputed
                )),

            VerdexError::InvalidTransition { from, to } => {
                VxError::new(VxErrorKind::InvalidTransition)
                    .with_message(format!("Invalid transition: {} -> {}", from, to))
            }

            VerdexError::Serialization { message } => {
                VxError::new(VxErrorKind::Serialization).with_message(message)
            }

            VerdexError::Internal { message } => {
                VxError::new(VxErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to VerdexError
impl From<serde_json::Error> for VerdexError {
    fn from(err: serde_json::Error) -> Self {
        VerdexError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (VxErrorKind::Conflict, "ERR_CONFLICT"),
            (VxErrorKind::Schema, "ERR_SCHEMA"),
            (VxErrorKind::Evaluation, "ERR_EVALUATION"),
            (VxErrorKind::NotFound, "ERR_NOT_FOUND"),
            (VxErrorKind::HashCollision, "ERR_HASH_COLLISION"),
            (
                VxErrorKind::DeterminismViolation,
                "ERR_DETERMINISM_VIOLATION",
            ),
            (VxErrorKind::InvalidTransition, "ERR_INVALID_TRANSITION"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_ambiguous_version_maps_to_conflict_with_candidates() {
        let err = VerdexError::AmbiguousVersion {
            ruleset_id: "iso-2145".to_string(),
            versions: vec!["1.0.0".to_string(), "2.0.0".to_string()],
        };
        let vx: VxError = err.into();
        assert_eq!(vx.kind(), VxErrorKind::Conflict);
        assert_eq!(vx.ruleset_id(), Some("iso-2145"));
        let candidates = vx.candidates().expect("candidates should be Some");
        assert_eq!(candidates, &["1.0.0".to_string(), "2.0.0".to_string()]);
    }

    #[test]
    fn test_predicate_unresolvable_carries_rule_and_node() {
        let err = VerdexError::PredicateUnresolvable {
            rule_id: "title-present".to_string(),
            node_id: "0.1".to_string(),
        };
        let vx: VxError = err.into();
        assert_eq!(vx.kind(), VxErrorKind::Evaluation);
        assert_eq!(vx.rule_id(), Some("title-present"));
        assert_eq!(vx.node_id(), Some("0.1"));
    }

    #[test]
    fn test_vx_error_candidates_none_by_default() {
        let err = VxError::new(VxErrorKind::NotFound);
        assert!(err.candidates().is_none());
    }

    #[test]
    fn test_display_includes_stage_and_ids() {
        let err = VxError::new(VxErrorKind::Evaluation)
            .with_stage("evaluate")
            .with_rule_id("r1")
            .with_message("boom");
        let rendered = format!("{}", err);
        assert!(rendered.contains("ERR_EVALUATION"));
        assert!(rendered.contains("stage 'evaluate'"));
        assert!(rendered.contains("rule_id: r1"));
    }
}
