//! Determinism invariant tests for end-to-end engine runs
//!
//! These tests verify that a full run — rule loading, resolution,
//! evaluation, assembly, durable append — is reproducible and idempotent,
//! and that the audit log key is the content-addressed result hash.

use std::fs;
use tempfile::TempDir;
use verdex_core::model::snapshot::{DocumentSnapshot, Node, NodeKind};
use verdex_core::model::verdict::Outcome;
use verdex_core_types::RequestContext;
use verdex_engine::{Engine, EngineConfig};

const INSTITUTIONAL: &str = r#"
schema_version: 1
ruleset_id: institutional
ruleset_version: 1.0.0
rules:
  - rule_id: abstract-present
    description: Theses must contain an abstract section
    severity: blocking
    precedence: 0
    predicate:
      type: text_matches
      kind: section
      pattern:
        starts_with: Abstract
  - rule_id: citation-style
    description: Citation style checks apply once the abstract exists
    severity: warning
    precedence: 10
    predicate:
      type: all_of
      terms:
        - type: prior_passed
          rule_id: abstract-present
        - type: text_matches
          kind: citation
          pattern:
            contains: ","
"#;

const APA7: &str = r#"
schema_version: 1
ruleset_id: apa7
ruleset_version: 7.0.0
rules:
  - rule_id: reference-count
    description: Documents should carry between 1 and 200 citations
    severity: info
    precedence: 50
    predicate:
      type: count_in_range
      kind: citation
      min: 1
      max: 200
"#;

fn workspace() -> (EngineConfig, TempDir) {
    let dir = TempDir::new().unwrap();
    let rules_dir = dir.path().join("rules");
    fs::create_dir_all(&rules_dir).unwrap();
    fs::write(rules_dir.join("institutional@1.0.0.yaml"), INSTITUTIONAL).unwrap();
    fs::write(rules_dir.join("apa7@7.0.0.yaml"), APA7).unwrap();

    let config = EngineConfig::from_toml_str(
        &format!(
            r#"
rules_dir = "{}"
audit_dir = "{}"
precedence = ["institutional", "apa7"]
logging_profile = "test"
"#,
            rules_dir.display(),
            dir.path().join("audit").display()
        ),
        "inline",
    )
    .unwrap();

    (config, dir)
}

fn requests() -> Vec<(String, Option<String>)> {
    vec![
        ("institutional".to_string(), None),
        ("apa7".to_string(), Some("7.0.0".to_string())),
    ]
}

fn compliant_snapshot() -> DocumentSnapshot {
    DocumentSnapshot::new(
        "thesis.docx",
        "docx-extractor",
        "2.0.0",
        vec![
            Node::new(NodeKind::Section, "Abstract")
                .with_children(vec![Node::new(NodeKind::Paragraph, "A short abstract.")]),
            Node::new(NodeKind::Section, "References")
                .with_children(vec![Node::new(NodeKind::Citation, "(Doe, 2021)")]),
        ],
    )
}

#[test]
fn test_full_run_verdicts_follow_precedence_order() {
    // Given: institutional outranks apa7 in the declared precedence
    // When: a compliant snapshot is evaluated
    // Then: verdicts appear in resolved order, all passing
    let (config, _dir) = workspace();
    let mut engine = Engine::open(&config, &requests()).unwrap();

    let outcome = engine
        .execute_run(&compliant_snapshot(), RequestContext::new())
        .unwrap();

    let ids: Vec<&str> = outcome
        .record
        .verdicts
        .iter()
        .map(|v| v.rule_id.as_str())
        .collect();
    assert_eq!(ids, vec!["abstract-present", "citation-style", "reference-count"]);
    assert!(outcome
        .record
        .verdicts
        .iter()
        .all(|v| v.outcome == Outcome::Pass));
}

#[test]
fn test_repeated_runs_are_idempotent() {
    // Given: one engine over one workspace
    // When: the same snapshot runs twice
    // Then: identical result hashes, one stored record
    let (config, _dir) = workspace();
    let mut engine = Engine::open(&config, &requests()).unwrap();

    let first = engine
        .execute_run(&compliant_snapshot(), RequestContext::new())
        .unwrap();
    let second = engine
        .execute_run(&compliant_snapshot(), RequestContext::new())
        .unwrap();

    assert_eq!(first.record.result_hash, second.record.result_hash);
    assert_eq!(first.stored_ref, second.stored_ref);

    let verified = engine.verify_stored(&first.record.result_hash).unwrap();
    assert!(verified.semantic_eq(&first.record));
}

#[test]
fn test_records_survive_engine_reopen() {
    // Given: a run recorded by one engine instance
    // When: the engine is reopened over the same workspace
    // Then: the record verifies and a re-run maps to the same stored ref
    let (config, _dir) = workspace();
    let result_hash = {
        let mut engine = Engine::open(&config, &requests()).unwrap();
        engine
            .execute_run(&compliant_snapshot(), RequestContext::new())
            .unwrap()
            .record
            .result_hash
    };

    let mut reopened = Engine::open(&config, &requests()).unwrap();
    assert!(reopened.verify_stored(&result_hash).is_ok());

    let rerun = reopened
        .execute_run(&compliant_snapshot(), RequestContext::new())
        .unwrap();
    assert_eq!(rerun.record.result_hash, result_hash);
}

#[test]
fn test_blocking_failure_records_skips_end_to_end() {
    // Given: a snapshot with no abstract section
    // When: evaluated
    // Then: the blocking rule fails and both later rules are skipped
    let (config, _dir) = workspace();
    let mut engine = Engine::open(&config, &requests()).unwrap();

    let snapshot = DocumentSnapshot::new(
        "draft.docx",
        "docx-extractor",
        "2.0.0",
        vec![Node::new(NodeKind::Section, "Introduction")],
    );

    let outcome = engine
        .execute_run(&snapshot, RequestContext::new())
        .unwrap();
    let verdicts = &outcome.record.verdicts;

    assert_eq!(verdicts[0].outcome, Outcome::Fail);
    assert!(verdicts[0].blocking);
    assert_eq!(verdicts[1].outcome, Outcome::Skipped);
    assert_eq!(verdicts[2].outcome, Outcome::Skipped);
}

#[test]
fn test_amendment_builds_a_supersession_chain() {
    // Given: a recorded run
    // When: the corrected document is re-evaluated as an amendment
    // Then: a distinct record supersedes the prior; both remain stored
    let (config, _dir) = workspace();
    let mut engine = Engine::open(&config, &requests()).unwrap();

    let draft = DocumentSnapshot::new(
        "draft.docx",
        "docx-extractor",
        "2.0.0",
        vec![Node::new(NodeKind::Section, "Introduction")],
    );
    let original = engine.execute_run(&draft, RequestContext::new()).unwrap();

    let amended = engine
        .amend(
            &original.record.result_hash,
            &compliant_snapshot(),
            RequestContext::new(),
        )
        .unwrap();

    assert_ne!(amended.record.result_hash, original.record.result_hash);
    assert_eq!(
        amended.record.supersedes.as_deref(),
        Some(original.record.result_hash.as_str())
    );

    let chain = engine.history(&amended.record.result_hash).unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[1].result_hash, original.record.result_hash);

    // The superseded record is still independently verifiable.
    assert!(engine.verify_stored(&original.record.result_hash).is_ok());
}

#[test]
fn test_amending_a_missing_record_is_not_found() {
    let (config, _dir) = workspace();
    let mut engine = Engine::open(&config, &requests()).unwrap();

    let err = engine
        .amend(&"0".repeat(64), &compliant_snapshot(), RequestContext::new())
        .unwrap_err();
    assert_eq!(err.kind(), verdex_core::errors::VxErrorKind::NotFound);
}

#[test]
fn test_failed_run_leaves_audit_log_empty() {
    // Given: a ruleset whose rule requires a node the snapshot lacks
    // When: the run aborts with an evaluation error
    // Then: the audit log contains no entry at all
    let (_, dir) = workspace();
    fs::write(
        dir.path().join("rules").join("strict@1.0.0.yaml"),
        r#"
schema_version: 1
ruleset_id: strict
ruleset_version: 1.0.0
rules:
  - rule_id: title-text
    description: The first node must be a titled section
    severity: blocking
    precedence: 0
    predicate:
      type: text_at_path
      path: "4.4"
      pattern:
        contains: Title
"#,
    )
    .unwrap();

    let audit_dir = dir.path().join("audit-strict");
    let config = EngineConfig::from_toml_str(
        &format!(
            r#"
rules_dir = "{}"
audit_dir = "{}"
precedence = ["strict"]
logging_profile = "test"
"#,
            dir.path().join("rules").display(),
            audit_dir.display()
        ),
        "inline",
    )
    .unwrap();
    let mut engine = Engine::open(&config, &[("strict".to_string(), None)]).unwrap();

    let err = engine
        .execute_run(&compliant_snapshot(), RequestContext::new())
        .unwrap_err();
    assert_eq!(err.kind(), verdex_core::errors::VxErrorKind::Evaluation);
    assert_eq!(err.stage(), Some("evaluate"));
    assert_eq!(err.rule_id(), Some("title-text"));

    drop(engine);
    let log = verdex_store::FsAuditLog::open(&audit_dir).unwrap();
    assert!(log.is_empty().unwrap(), "failed run must leave no audit trail entry");
}
