//! Pipeline orchestrator.
//!
//! Sequences one evaluation run — resolve rules, evaluate, assemble, record
//! — with dependency-ordered control flow and nothing else: no business
//! logic, no stage skipping, no retry of a completed stage.
//!
//! ## State machine
//!
//! `Idle → SnapshotReady → RulesResolved → Evaluated → Recorded → Done`,
//! with an absorbing `Failed` state reachable from any non-terminal state.
//! Transitions are strictly forward. The stages are pure functions over
//! immutable inputs, so re-running one would be redundant rather than
//! harmful — the orchestrator still refuses to re-invoke a completed stage
//! within one run.
//!
//! ## Atomicity
//!
//! The sink is touched exactly once, after a complete record has been
//! assembled. A failed run therefore leaves no partial audit trail entry.

use crate::assembler::assemble;
use crate::boundary::{AuditSink, StoredRef};
use crate::errors::VxError;
use crate::evaluator::evaluate;
use crate::model::audit::AuditRecord;
use crate::model::ruleset::{PrecedencePolicy, RuleSet};
use crate::model::snapshot::DocumentSnapshot;
use crate::resolver::resolve;
use crate::{log_op_end, log_op_error, log_op_start};
use std::fmt;
use std::time::Instant;
use verdex_core_types::{RequestContext, RunId};

/// Pipeline run states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    SnapshotReady,
    RulesResolved,
    Evaluated,
    Recorded,
    Done,
    Failed,
}

impl RunState {
    /// Position in the forward order; `Failed` is outside it
    fn ordinal(&self) -> Option<u8> {
        match self {
            RunState::Idle => Some(0),
            RunState::SnapshotReady => Some(1),
            RunState::RulesResolved => Some(2),
            RunState::Evaluated => Some(3),
            RunState::Recorded => Some(4),
            RunState::Done => Some(5),
            RunState::Failed => None,
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::SnapshotReady => "snapshot_ready",
            RunState::RulesResolved => "rules_resolved",
            RunState::Evaluated => "evaluated",
            RunState::Recorded => "recorded",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Result of one completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The assembled, persisted audit record
    pub record: AuditRecord,
    /// Where the sink stored it
    pub stored_ref: StoredRef,
}

/// One evaluation run: one snapshot, one resolved ruleset, one record.
///
/// A pipeline value is single-use — `run` consumes the `Idle` state and
/// leaves the machine in `Done` or `Failed`.
pub struct Pipeline {
    state: RunState,
    run_id: RunId,
    ctx: RequestContext,
}

impl Pipeline {
    /// Create a pipeline in the `Idle` state
    pub fn new(ctx: RequestContext) -> Self {
        Self {
            state: RunState::Idle,
            run_id: RunId::new(),
            ctx,
        }
    }

    /// Current state of the machine
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Correlation id of this run
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Advance to the next state; strictly forward, one step at a time.
    fn advance(&mut self, next: RunState) -> Result<(), VxError> {
        let valid = match (self.state.ordinal(), next.ordinal()) {
            (Some(from), Some(to)) => to == from + 1,
            // Failed is reachable from any non-terminal state
            (Some(_), None) => !self.state.is_terminal(),
            (None, _) => false,
        };
        if !valid {
            return Err(VxError::from(crate::errors::VerdexError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            })
            .with_request_id(self.ctx.request_id.clone()));
        }
        self.state = next;
        Ok(())
    }

    /// Mark the run failed and attach stage + correlation context.
    fn fail(&mut self, err: VxError, stage: &str, started: Instant) -> VxError {
        // Transition to Failed cannot itself fail from a non-terminal state.
        let _ = self.advance(RunState::Failed);
        let err = err
            .with_stage(stage)
            .with_request_id(self.ctx.request_id.clone());
        log_op_error!(stage, err.clone(), duration_ms = started.elapsed().as_millis() as u64,
            run_id = %self.run_id);
        err
    }

    /// Execute the full pipeline against the given inputs.
    ///
    /// ## Errors
    ///
    /// Any stage error is surfaced with the stage name and offending ids
    /// attached; the machine lands in `Failed` and the sink is untouched.
    /// Calling `run` on anything but an `Idle` machine is an
    /// `InvalidTransition` error.
    pub fn run(
        &mut self,
        snapshot: &DocumentSnapshot,
        sources: &[RuleSet],
        policy: &PrecedencePolicy,
        sink: &mut dyn AuditSink,
    ) -> Result<RunOutcome, VxError> {
        if self.state != RunState::Idle {
            return Err(VxError::from(crate::errors::VerdexError::InvalidTransition {
                from: self.state.to_string(),
                to: RunState::SnapshotReady.to_string(),
            }));
        }

        // Stage: snapshot intake
        let started = Instant::now();
        log_op_start!("accept_snapshot", run_id = %self.run_id);
        let snapshot_hash = match snapshot.content_hash() {
            Ok(hash) => hash,
            Err(e) => return Err(self.fail(e.into(), "accept_snapshot", started)),
        };
        self.advance(RunState::SnapshotReady)?;
        log_op_end!("accept_snapshot", duration_ms = started.elapsed().as_millis() as u64,
            run_id = %self.run_id, snapshot_hash = %snapshot_hash);

        // Stage: resolve rules
        let started = Instant::now();
        log_op_start!("resolve_rules", run_id = %self.run_id, rule_count = sources.len());
        let rules = match resolve(sources, policy) {
            Ok(rules) => rules,
            Err(e) => return Err(self.fail(e.into(), "resolve_rules", started)),
        };
        self.advance(RunState::RulesResolved)?;
        log_op_end!("resolve_rules", duration_ms = started.elapsed().as_millis() as u64,
            run_id = %self.run_id, rule_count = rules.len());

        // Stage: evaluate
        let started = Instant::now();
        log_op_start!("evaluate", run_id = %self.run_id);
        let verdicts = match evaluate(snapshot, &rules) {
            Ok(verdicts) => verdicts,
            Err(e) => return Err(self.fail(e.into(), "evaluate", started)),
        };
        self.advance(RunState::Evaluated)?;
        log_op_end!("evaluate", duration_ms = started.elapsed().as_millis() as u64,
            run_id = %self.run_id, verdict_count = verdicts.len());

        // Stage: assemble and record — the sink is touched only with a
        // complete, internally consistent record.
        let started = Instant::now();
        log_op_start!("record", run_id = %self.run_id);
        let record = match assemble(snapshot, &rules, verdicts) {
            Ok(record) => record,
            Err(e) => return Err(self.fail(e.into(), "record", started)),
        };
        let stored_ref = match sink.append(&record) {
            Ok(stored_ref) => stored_ref,
            Err(e) => return Err(self.fail(e, "record", started)),
        };
        self.advance(RunState::Recorded)?;
        log_op_end!("record", duration_ms = started.elapsed().as_millis() as u64,
            run_id = %self.run_id, result_hash = %record.result_hash);

        self.advance(RunState::Done)?;
        Ok(RunOutcome { record, stored_ref })
    }
}
