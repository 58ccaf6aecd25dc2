pub mod audit;
pub mod rule;
pub mod ruleset;
pub mod snapshot;
pub mod verdict;

pub use audit::AuditRecord;
pub use rule::{Predicate, Rule, Severity, TextPattern};
pub use ruleset::{PrecedencePolicy, RuleSet, RulesetVersionRef};
pub use snapshot::{DocumentSnapshot, Node, NodeKind, SourceSpan};
pub use verdict::{EvidenceItem, Outcome, Verdict};
