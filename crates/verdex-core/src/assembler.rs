//! Audit record assembly.
//!
//! Pure construction of the immutable audit record from the run's inputs
//! and outputs: snapshot hash, sorted ruleset version set, ordered verdicts,
//! and the content-addressed result hash. No side effects — persistence is
//! delegated to the append-only sink at the boundary.

use crate::errors::{Result, VerdexError};
use crate::model::audit::{compute_result_digest, AuditRecord};
use crate::model::snapshot::DocumentSnapshot;
use crate::model::verdict::Verdict;
use crate::resolver::OrderedRuleSequence;
use chrono::Utc;

/// Assemble the audit record for one completed evaluation run.
///
/// The verdict list must contain exactly one verdict per resolved rule, in
/// evaluation order.
///
/// ## Errors
///
/// - `VerdexError::VerdictCountMismatch` if the one-verdict-per-rule
///   invariant is broken
/// - `VerdexError::Serialization` if digest computation fails
pub fn assemble(
    snapshot: &DocumentSnapshot,
    rules: &OrderedRuleSequence,
    verdicts: Vec<Verdict>,
) -> Result<AuditRecord> {
    assemble_inner(snapshot, rules, verdicts, None)
}

/// Assemble an amendment record superseding a prior one.
///
/// The prior record is referenced (not owned) by its result hash; the
/// reference participates in this record's result hash, so an amendment is
/// a distinct record even for identical inputs.
pub fn assemble_superseding(
    prior_result_hash: &str,
    snapshot: &DocumentSnapshot,
    rules: &OrderedRuleSequence,
    verdicts: Vec<Verdict>,
) -> Result<AuditRecord> {
    assemble_inner(snapshot, rules, verdicts, Some(prior_result_hash.to_string()))
}

fn assemble_inner(
    snapshot: &DocumentSnapshot,
    rules: &OrderedRuleSequence,
    verdicts: Vec<Verdict>,
    supersedes: Option<String>,
) -> Result<AuditRecord> {
    if verdicts.len() != rules.len() {
        return Err(VerdexError::VerdictCountMismatch {
            verdicts: verdicts.len(),
            rules: rules.len(),
        });
    }

    let snapshot_hash = snapshot.content_hash()?;
    let ruleset_versions = rules.ruleset_versions();
    let result_hash = compute_result_digest(
        &snapshot_hash,
        &ruleset_versions,
        &verdicts,
        supersedes.as_deref(),
    )?;

    Ok(AuditRecord {
        snapshot_hash,
        ruleset_versions,
        verdicts,
        supersedes,
        result_hash,
        created_at: Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::evaluate;
    use crate::model::rule::{Predicate, Rule, Severity};
    use crate::model::ruleset::{PrecedencePolicy, RuleSet};
    use crate::model::snapshot::{Node, NodeKind};
    use crate::resolver::resolve;

    fn snapshot() -> DocumentSnapshot {
        DocumentSnapshot::new(
            "paper.docx",
            "test-extractor",
            "0.0.0",
            vec![Node::new(NodeKind::Section, "Title")],
        )
    }

    fn rules() -> OrderedRuleSequence {
        let set = RuleSet::new(
            "institutional",
            "1.0.0",
            vec![Rule::new(
                "r0",
                "institutional",
                "1.0.0",
                "desc",
                Severity::Info,
                0,
                Predicate::NodeExists {
                    kind: NodeKind::Section,
                },
            )],
        );
        resolve(
            &[set],
            &PrecedencePolicy::new(vec!["institutional".to_string()]),
        )
        .unwrap()
    }

    #[test]
    fn test_assemble_produces_verifiable_record() {
        let snapshot = snapshot();
        let rules = rules();
        let verdicts = evaluate(&snapshot, &rules).unwrap();

        let record = assemble(&snapshot, &rules, verdicts).unwrap();
        assert_eq!(record.snapshot_hash, snapshot.content_hash().unwrap());
        assert_eq!(record.ruleset_versions.len(), 1);
        assert!(record.supersedes.is_none());
        assert!(record.verify().is_ok());
    }

    #[test]
    fn test_equal_inputs_yield_equal_result_hash() {
        let snapshot = snapshot();
        let rules = rules();

        let first = assemble(&snapshot, &rules, evaluate(&snapshot, &rules).unwrap()).unwrap();
        let second = assemble(&snapshot, &rules, evaluate(&snapshot, &rules).unwrap()).unwrap();

        // Timestamps may differ; identity may not.
        assert_eq!(first.result_hash, second.result_hash);
    }

    #[test]
    fn test_verdict_count_mismatch_is_rejected() {
        let snapshot = snapshot();
        let rules = rules();
        let err = assemble(&snapshot, &rules, Vec::new()).unwrap_err();
        assert!(matches!(err, VerdexError::VerdictCountMismatch { .. }));
    }

    #[test]
    fn test_amendment_is_a_distinct_record() {
        let snapshot = snapshot();
        let rules = rules();

        let original =
            assemble(&snapshot, &rules, evaluate(&snapshot, &rules).unwrap()).unwrap();
        let amendment = assemble_superseding(
            &original.result_hash,
            &snapshot,
            &rules,
            evaluate(&snapshot, &rules).unwrap(),
        )
        .unwrap();

        assert_eq!(amendment.supersedes.as_deref(), Some(original.result_hash.as_str()));
        assert_ne!(amendment.result_hash, original.result_hash);
        assert!(amendment.verify().is_ok());
    }
}
