//! Verdict and evidence models
//!
//! A verdict is the immutable per-rule outcome of one evaluation run.
//! Exactly one verdict is recorded per resolved rule; rules skipped by a
//! blocking failure are recorded as `Skipped`, never omitted.

use crate::model::rule::{Rule, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-rule outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
    Skipped,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Pass => "pass",
            Outcome::Fail => "fail",
            Outcome::Skipped => "skipped",
        };
        write!(f, "{}", name)
    }
}

/// One verifiable piece of evidence backing a verdict
///
/// References the snapshot node it was derived from (when there is one) and
/// carries a deterministic expected/actual note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Path-based id of the node this evidence points at, if any
    pub node_id: Option<String>,

    /// Deterministic expected/actual rendering
    pub note: String,
}

impl EvidenceItem {
    /// Evidence tied to a specific snapshot node
    pub fn at_node(node_id: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            node_id: Some(node_id.into()),
            note: note.into(),
        }
    }

    /// Evidence about the snapshot as a whole
    pub fn global(note: impl Into<String>) -> Self {
        Self {
            node_id: None,
            note: note.into(),
        }
    }
}

/// Immutable per-rule evaluation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Rule that was evaluated
    pub rule_id: String,

    /// Owning source of the rule
    pub ruleset_id: String,

    /// Version of the owning source
    pub ruleset_version: String,

    /// Outcome of the evaluation
    pub outcome: Outcome,

    /// Severity inherited from the rule
    pub severity: Severity,

    /// Blocking flag copied from the rule
    pub blocking: bool,

    /// Node references and expected/actual notes
    pub evidence: Vec<EvidenceItem>,

    /// Human-readable explanation of the outcome
    pub rationale: String,
}

impl Verdict {
    fn from_rule(rule: &Rule, outcome: Outcome, evidence: Vec<EvidenceItem>, rationale: String) -> Self {
        Self {
            rule_id: rule.rule_id.clone(),
            ruleset_id: rule.ruleset_id.clone(),
            ruleset_version: rule.ruleset_version.clone(),
            outcome,
            severity: rule.severity,
            blocking: rule.is_blocking(),
            evidence,
            rationale,
        }
    }

    /// Record a passing evaluation of `rule`
    pub fn pass(rule: &Rule, evidence: Vec<EvidenceItem>) -> Self {
        Self::from_rule(rule, Outcome::Pass, evidence, rule.description.clone())
    }

    /// Record a failing evaluation of `rule`
    pub fn fail(rule: &Rule, evidence: Vec<EvidenceItem>) -> Self {
        Self::from_rule(rule, Outcome::Fail, evidence, rule.description.clone())
    }

    /// Record that `rule` was skipped because `blocked_by` failed as blocking
    pub fn skipped(rule: &Rule, blocked_by: &str) -> Self {
        Self::from_rule(
            rule,
            Outcome::Skipped,
            Vec::new(),
            format!("skipped: blocking failure of rule {}", blocked_by),
        )
    }

    /// Whether this verdict is a blocking failure
    pub fn is_blocking_failure(&self) -> bool {
        self.outcome == Outcome::Fail && self.blocking
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Verdict({}, outcome={}, severity={})",
            self.rule_id, self.outcome, self.severity
        )
    }
}
