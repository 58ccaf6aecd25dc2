//! End-to-end run orchestration
//!
//! Wires the boundary collaborators to the kernel: rulesets come from the
//! filesystem rule store through a pinned catalog view, the pipeline does
//! the pure work, and the durable audit log receives the record.

use crate::config::EngineConfig;
use verdex_core::assembler::assemble_superseding;
use verdex_core::boundary::AuditSink;
use verdex_core::errors::VxError;
use verdex_core::evaluator::evaluate;
use verdex_core::kernel::{Pipeline, RunOutcome};
use verdex_core::model::audit::AuditRecord;
use verdex_core::model::ruleset::PrecedencePolicy;
use verdex_core::model::snapshot::DocumentSnapshot;
use verdex_core::resolver::resolve;
use verdex_core::{log_op_end, log_op_start};
use verdex_core_types::RequestContext;
use verdex_store::{FsAuditLog, FsRuleStore, RuleCatalog};

/// A configured engine instance
///
/// Holds the precedence policy, the loaded rule catalog, and the durable
/// audit log. Each `execute_run` pins the catalog so the run's view of
/// rules cannot change midway.
pub struct Engine {
    policy: PrecedencePolicy,
    catalog: RuleCatalog,
    audit_log: FsAuditLog,
}

impl Engine {
    /// Open an engine: load the requested rulesets and the audit log.
    ///
    /// `requests` names the rulesets this instance evaluates with, each
    /// with an optional pinned version (`None` selects the highest stored
    /// version).
    ///
    /// ## Errors
    ///
    /// Ruleset loading (`NotFound`, `Schema`, `Conflict`) and audit log
    /// opening (`Io`, `Persistence`) errors pass through.
    pub fn open(
        config: &EngineConfig,
        requests: &[(String, Option<String>)],
    ) -> Result<Self, VxError> {
        verdex_core::logging_facility::init(config.logging_profile.into());

        let started = std::time::Instant::now();
        log_op_start!("engine_open", rule_count = requests.len());

        let store = FsRuleStore::new(&config.rules_dir);
        let catalog = RuleCatalog::load(&store, requests)?;
        let audit_log = FsAuditLog::open(&config.audit_dir)?;

        log_op_end!("engine_open", duration_ms = started.elapsed().as_millis() as u64);
        Ok(Self {
            policy: config.precedence_policy(),
            catalog,
            audit_log,
        })
    }

    /// Execute one evaluation run against this engine's pinned rules.
    pub fn execute_run(
        &mut self,
        snapshot: &DocumentSnapshot,
        ctx: RequestContext,
    ) -> Result<RunOutcome, VxError> {
        let view = self.catalog.pin();
        let sources = view.rulesets();
        Pipeline::new(ctx).run(snapshot, &sources, &self.policy, &mut self.audit_log)
    }

    /// Re-evaluate a snapshot as an amendment of a prior record.
    ///
    /// The prior record must exist in this engine's audit log; the new
    /// record carries a `supersedes` back-reference to it and is therefore
    /// a distinct record even for identical inputs.
    pub fn amend(
        &mut self,
        prior_result_hash: &str,
        snapshot: &DocumentSnapshot,
        ctx: RequestContext,
    ) -> Result<RunOutcome, VxError> {
        let started = std::time::Instant::now();
        log_op_start!("amend", result_hash = %prior_result_hash);

        // The back-reference must point at a real record.
        self.audit_log.get(prior_result_hash)?;

        let view = self.catalog.pin();
        let sources = view.rulesets();
        let rules = resolve(&sources, &self.policy)
            .map_err(|e| VxError::from(e).with_op("amend").with_request_id(ctx.request_id.clone()))?;
        let verdicts = evaluate(snapshot, &rules)
            .map_err(|e| VxError::from(e).with_op("amend").with_request_id(ctx.request_id.clone()))?;
        let record = assemble_superseding(prior_result_hash, snapshot, &rules, verdicts)
            .map_err(|e| VxError::from(e).with_op("amend").with_request_id(ctx.request_id.clone()))?;
        let stored_ref = self.audit_log.append(&record)?;

        log_op_end!("amend", duration_ms = started.elapsed().as_millis() as u64,
            result_hash = %record.result_hash);
        Ok(RunOutcome { record, stored_ref })
    }

    /// Read a stored record back and verify its hash integrity.
    ///
    /// This is the independent-verifiability operation of the versioning
    /// contract: the hash is re-derived from record content alone.
    pub fn verify_stored(&self, result_hash: &str) -> Result<AuditRecord, VxError> {
        let record = self.audit_log.get(result_hash)?;
        record
            .verify()
            .map_err(|e| VxError::from(e).with_op("verify_stored"))?;
        Ok(record)
    }

    /// Walk the supersession chain of a stored record, most recent first.
    pub fn history(&self, result_hash: &str) -> Result<Vec<AuditRecord>, VxError> {
        self.audit_log.chain(result_hash)
    }
}
