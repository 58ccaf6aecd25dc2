//! Sequential blocking evaluator.
//!
//! Walks the resolved rule sequence against a snapshot, strictly in order,
//! never in parallel within one run: a later rule may read the outcomes of
//! earlier ones, and skip semantics depend on strict ordering.
//!
//! ## Blocking semantics
//!
//! A Fail verdict from a rule with `Blocking` severity ends the walk: every
//! remaining rule is recorded as `Skipped` without its predicate being
//! interpreted. Non-blocking failures accumulate.
//!
//! ## Errors vs failures
//!
//! A rule that evaluates to false is a compliance failure and produces a
//! Fail verdict. A predicate that cannot be interpreted at all (a required
//! node missing, a dependency on a rule with no recorded outcome) is an
//! evaluation error that aborts the entire run — the snapshot is not
//! well-formed for this ruleset.

use crate::errors::{Result, VerdexError};
use crate::model::rule::{Predicate, Rule};
use crate::model::snapshot::DocumentSnapshot;
use crate::model::verdict::{EvidenceItem, Outcome, Verdict};
use crate::resolver::OrderedRuleSequence;
use std::collections::BTreeMap;

/// Run-local accumulator of prior outcomes
///
/// Visible read-only to later rule predicates (`PriorPassed`); discarded
/// after the run, never persisted.
#[derive(Debug, Default)]
pub struct EvaluationContext {
    outcomes: BTreeMap<String, Outcome>,
}

impl EvaluationContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome of an already-evaluated rule, if recorded
    pub fn outcome(&self, rule_id: &str) -> Option<Outcome> {
        self.outcomes.get(rule_id).copied()
    }

    /// Number of recorded outcomes
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether no outcome has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    fn record(&mut self, rule_id: &str, outcome: Outcome) {
        self.outcomes.insert(rule_id.to_string(), outcome);
    }
}

/// Evaluate the resolved rules against a snapshot.
///
/// Returns exactly one verdict per resolved rule, in evaluation order.
/// Deterministic: fixed snapshot and fixed order produce a byte-identical
/// verdict sequence — no wall-clock, randomness, or external state is read.
///
/// ## Errors
///
/// `VerdexError::PredicateUnresolvable` / `UnknownRuleDependency` abort the
/// whole run; no partial verdict sequence is returned.
pub fn evaluate(
    snapshot: &DocumentSnapshot,
    rules: &OrderedRuleSequence,
) -> Result<Vec<Verdict>> {
    let mut verdicts: Vec<Verdict> = Vec::with_capacity(rules.len());
    let mut ctx = EvaluationContext::new();

    let all = rules.rules();
    for (idx, rule) in all.iter().enumerate() {
        let (holds, evidence) = interpret(&rule.predicate, rule, snapshot, &ctx)?;

        let verdict = if holds {
            Verdict::pass(rule, evidence)
        } else {
            Verdict::fail(rule, evidence)
        };
        ctx.record(&rule.rule_id, verdict.outcome);

        let halt = verdict.is_blocking_failure();
        verdicts.push(verdict);

        if halt {
            tracing::debug!(
                rule_id = %rule.rule_id,
                "blocking failure, skipping remaining rules"
            );
            for skipped_rule in &all[idx + 1..] {
                ctx.record(&skipped_rule.rule_id, Outcome::Skipped);
                verdicts.push(Verdict::skipped(skipped_rule, &rule.rule_id));
            }
            break;
        }
    }

    Ok(verdicts)
}

/// Interpret a predicate against the snapshot and prior outcomes.
///
/// Pure: the only inputs are the predicate, the snapshot, and the context.
fn interpret(
    predicate: &Predicate,
    rule: &Rule,
    snapshot: &DocumentSnapshot,
    ctx: &EvaluationContext,
) -> Result<(bool, Vec<EvidenceItem>)> {
    match predicate {
        Predicate::NodeExists { kind } => {
            let found = snapshot.nodes_of_kind(*kind);
            let note = format!("expected at least one {} node; found {}", kind, found.len());
            let evidence = match found.first() {
                Some(node) => vec![EvidenceItem::at_node(&node.node_id, note)],
                None => vec![EvidenceItem::global(note)],
            };
            Ok((!found.is_empty(), evidence))
        }

        Predicate::NodeAtPath { path } => {
            let exists = snapshot.node(path).is_some();
            let note = format!(
                "expected a node at path {}; {}",
                path,
                if exists { "present" } else { "absent" }
            );
            Ok((exists, vec![EvidenceItem::at_node(path, note)]))
        }

        Predicate::TextMatches { kind, pattern } => {
            let candidates = snapshot.nodes_of_kind(*kind);
            let matched: Vec<&str> = candidates
                .iter()
                .filter(|n| pattern.matches(&n.text))
                .map(|n| n.node_id.as_str())
                .collect();
            let holds = !matched.is_empty();
            let note = format!(
                "expected some {} node whose text {}; {} of {} matched",
                kind,
                pattern.describe(),
                matched.len(),
                candidates.len()
            );
            let evidence = match matched.first() {
                Some(node_id) => vec![EvidenceItem::at_node(*node_id, note)],
                None => vec![EvidenceItem::global(note)],
            };
            Ok((holds, evidence))
        }

        Predicate::TextAtPath { path, pattern } => {
            // A missing node here is a malformed snapshot for this ruleset,
            // not a compliance failure.
            let node = snapshot
                .node(path)
                .ok_or_else(|| VerdexError::PredicateUnresolvable {
                    rule_id: rule.rule_id.clone(),
                    node_id: path.clone(),
                })?;
            let holds = pattern.matches(&node.text);
            let note = format!(
                "expected text at {} to {}; actual {:?}",
                path,
                pattern.describe(),
                node.text
            );
            Ok((holds, vec![EvidenceItem::at_node(path, note)]))
        }

        Predicate::CountInRange { kind, min, max } => {
            let count = snapshot.count_kind(*kind);
            let holds = count >= *min && max.map_or(true, |max| count <= max);
            let bound = match max {
                Some(max) => format!("between {} and {}", min, max),
                None => format!("at least {}", min),
            };
            let note = format!("expected {} {} nodes; found {}", bound, kind, count);
            Ok((holds, vec![EvidenceItem::global(note)]))
        }

        Predicate::PriorPassed { rule_id } => {
            let outcome =
                ctx.outcome(rule_id)
                    .ok_or_else(|| VerdexError::UnknownRuleDependency {
                        rule_id: rule.rule_id.clone(),
                        depends_on: rule_id.clone(),
                    })?;
            let holds = outcome == Outcome::Pass;
            let note = format!("expected rule {} to have passed; outcome {}", rule_id, outcome);
            Ok((holds, vec![EvidenceItem::global(note)]))
        }

        Predicate::AllOf { terms } => {
            let mut holds = true;
            let mut evidence = Vec::new();
            for term in terms {
                let (term_holds, term_evidence) = interpret(term, rule, snapshot, ctx)?;
                holds &= term_holds;
                evidence.extend(term_evidence);
            }
            Ok((holds, evidence))
        }

        Predicate::AnyOf { terms } => {
            let mut holds = false;
            let mut evidence = Vec::new();
            for term in terms {
                let (term_holds, term_evidence) = interpret(term, rule, snapshot, ctx)?;
                holds |= term_holds;
                evidence.extend(term_evidence);
            }
            Ok((holds, evidence))
        }

        Predicate::Not { term } => {
            let (term_holds, evidence) = interpret(term, rule, snapshot, ctx)?;
            Ok((!term_holds, evidence))
        }
    }
}
