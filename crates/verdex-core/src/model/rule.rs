//! Rule domain model
//!
//! A rule is the smallest unit of normative decision logic: a pure predicate
//! over a document snapshot, a severity, and a precedence key, owned by a
//! versioned ruleset. Predicates are data, not code — a closed algebra of
//! tagged variants interpreted by the evaluator. This keeps rules
//! schema-validatable and rules out scripting (and with it, nondeterminism).

use crate::digest::hash_canonical;
use crate::errors::{Result, VerdexError};
use crate::model::snapshot::NodeKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule severity
///
/// `Blocking` failures halt evaluation of all subsequent rules in the
/// resolved order; `Warning` and `Info` failures accumulate without halting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Blocking,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Blocking => "blocking",
        };
        write!(f, "{}", name)
    }
}

/// Literal text matcher
///
/// Deliberately not a regex: every variant is a total, deterministic string
/// operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextPattern {
    Equals(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
}

impl TextPattern {
    /// Apply the pattern to a text value.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            TextPattern::Equals(expected) => text == expected,
            TextPattern::Contains(needle) => text.contains(needle.as_str()),
            TextPattern::StartsWith(prefix) => text.starts_with(prefix.as_str()),
            TextPattern::EndsWith(suffix) => text.ends_with(suffix.as_str()),
        }
    }

    /// Human-readable rendering for evidence notes.
    pub fn describe(&self) -> String {
        match self {
            TextPattern::Equals(s) => format!("equals {:?}", s),
            TextPattern::Contains(s) => format!("contains {:?}", s),
            TextPattern::StartsWith(s) => format!("starts with {:?}", s),
            TextPattern::EndsWith(s) => format!("ends with {:?}", s),
        }
    }
}

/// Closed predicate algebra over a document snapshot
///
/// Interpreted by the evaluator; predicates never perform I/O, never read a
/// clock, and reference only the snapshot and the read-only outcomes of
/// earlier rules (`PriorPassed`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Some node of the given kind exists
    NodeExists { kind: NodeKind },

    /// A node with the given path-based id exists
    NodeAtPath { path: String },

    /// Some node of the given kind matches the pattern
    TextMatches { kind: NodeKind, pattern: TextPattern },

    /// The node at `path` must exist and match the pattern.
    ///
    /// A missing node here is an evaluation error (malformed snapshot for
    /// this ruleset), not a Fail verdict.
    TextAtPath { path: String, pattern: TextPattern },

    /// Count of nodes of the given kind is within `[min, max]`
    /// (`max: None` = unbounded)
    CountInRange {
        kind: NodeKind,
        min: u32,
        max: Option<u32>,
    },

    /// The referenced earlier rule passed.
    ///
    /// The referenced rule must already have a recorded outcome; anything
    /// else is an evaluation error (rule-order misconfiguration).
    PriorPassed { rule_id: String },

    /// All terms hold (empty = trivially true)
    AllOf { terms: Vec<Predicate> },

    /// At least one term holds (empty = trivially false)
    AnyOf { terms: Vec<Predicate> },

    /// The term does not hold
    Not { term: Box<Predicate> },
}

impl Predicate {
    /// Validate the predicate's static shape.
    ///
    /// ## Errors
    ///
    /// Returns `VerdexError::InvalidCountRange` for an empty count range.
    pub fn validate(&self, rule_id: &str) -> Result<()> {
        match self {
            Predicate::CountInRange {
                min,
                max: Some(max),
                ..
            } if min > max => Err(VerdexError::InvalidCountRange {
                rule_id: rule_id.to_string(),
                min: *min,
                max: *max,
            }),
            Predicate::AllOf { terms } | Predicate::AnyOf { terms } => {
                for term in terms {
                    term.validate(rule_id)?;
                }
                Ok(())
            }
            Predicate::Not { term } => term.validate(rule_id),
            _ => Ok(()),
        }
    }
}

/// Immutable normative rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Stable identifier across rule versions (e.g. "citation-format")
    pub rule_id: String,

    /// Identifier of the owning ruleset
    pub ruleset_id: String,

    /// Version of the owning ruleset (MAJOR.MINOR.PATCH)
    pub ruleset_version: String,

    /// Human-readable rationale template
    pub description: String,

    /// Severity; `Blocking` halts the walk on failure
    pub severity: Severity,

    /// Explicit precedence within the owning source (lower evaluates first)
    pub precedence: i32,

    /// Pure predicate over the snapshot and prior outcomes
    pub predicate: Predicate,
}

impl Rule {
    /// Create a new rule
    pub fn new(
        rule_id: impl Into<String>,
        ruleset_id: impl Into<String>,
        ruleset_version: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        precedence: i32,
        predicate: Predicate,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            ruleset_id: ruleset_id.into(),
            ruleset_version: ruleset_version.into(),
            description: description.into(),
            severity,
            precedence,
            predicate,
        }
    }

    /// Whether a failure of this rule halts evaluation
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }

    /// Content digest of the rule's canonical form.
    ///
    /// Two rules are byte-identical (and eligible for dedup during
    /// resolution) exactly when their digests are equal.
    ///
    /// ## Errors
    ///
    /// Returns `VerdexError::Serialization` if canonicalization fails.
    pub fn content_digest(&self) -> Result<String> {
        hash_canonical(self)
    }

    /// Validate the rule's static shape.
    pub fn validate(&self) -> Result<()> {
        if self.rule_id.trim().is_empty() {
            return Err(VerdexError::InvalidRuleId {
                ruleset_id: self.ruleset_id.clone(),
                reason: "rule_id is empty".to_string(),
            });
        }
        self.predicate.validate(&self.rule_id)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rule({}, source={}@{}, severity={})",
            self.rule_id, self.ruleset_id, self.ruleset_version, self.severity
        )
    }
}
