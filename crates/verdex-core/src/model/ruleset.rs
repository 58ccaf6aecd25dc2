//! Ruleset and precedence policy models
//!
//! A ruleset is a versioned, ordered collection of rules from one normative
//! source (an institutional policy, a standard, a style guide). The
//! precedence policy declares the relative authority of sources; resolution
//! (see `resolver`) merges several rulesets into one total evaluation order.

use crate::errors::{Result, VerdexError};
use crate::model::rule::Rule;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Identity of one ruleset version used in an evaluation run
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RulesetVersionRef {
    pub ruleset_id: String,
    pub ruleset_version: String,
}

impl fmt::Display for RulesetVersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.ruleset_id, self.ruleset_version)
    }
}

/// Versioned, ordered collection of rules from one normative source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Source identifier (e.g. "institutional", "iso-2145", "apa7")
    pub ruleset_id: String,

    /// MAJOR.MINOR.PATCH version of this source
    pub ruleset_version: String,

    /// Member rules in declaration order
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Create a new ruleset
    pub fn new(
        ruleset_id: impl Into<String>,
        ruleset_version: impl Into<String>,
        rules: Vec<Rule>,
    ) -> Self {
        Self {
            ruleset_id: ruleset_id.into(),
            ruleset_version: ruleset_version.into(),
            rules,
        }
    }

    /// The `(id, version)` identity of this ruleset
    pub fn version_ref(&self) -> RulesetVersionRef {
        RulesetVersionRef {
            ruleset_id: self.ruleset_id.clone(),
            ruleset_version: self.ruleset_version.clone(),
        }
    }

    /// Validate the ruleset's static shape.
    ///
    /// ## Errors
    ///
    /// - `VerdexError::InvalidVersion` if the version does not parse
    /// - `VerdexError::RuleOutsideSet` if a member declares a foreign source
    /// - `VerdexError::DuplicateRuleInSet` on duplicate `rule_id`s
    /// - rule-level validation errors (empty ids, bad count ranges)
    pub fn validate(&self) -> Result<()> {
        parse_version(&self.ruleset_version).ok_or_else(|| VerdexError::InvalidVersion {
            ruleset_id: self.ruleset_id.clone(),
            version: self.ruleset_version.clone(),
        })?;

        let mut seen: HashSet<&str> = HashSet::new();
        for rule in &self.rules {
            rule.validate()?;

            if rule.ruleset_id != self.ruleset_id || rule.ruleset_version != self.ruleset_version {
                return Err(VerdexError::RuleOutsideSet {
                    rule_id: rule.rule_id.clone(),
                    declared: format!("{}@{}", rule.ruleset_id, rule.ruleset_version),
                    owner: format!("{}@{}", self.ruleset_id, self.ruleset_version),
                });
            }

            if !seen.insert(rule.rule_id.as_str()) {
                return Err(VerdexError::DuplicateRuleInSet {
                    ruleset_id: self.ruleset_id.clone(),
                    rule_id: rule.rule_id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Parse a MAJOR.MINOR.PATCH version string.
///
/// Returns `None` for anything that is not exactly three non-negative
/// integer components.
pub fn parse_version(version: &str) -> Option<(u64, u64, u64)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

/// Declared relative authority of rule sources
///
/// An ordered list of ruleset ids; rank = position. Lower rank sorts first
/// in the resolved order and is evaluated first, reflecting override
/// priority (e.g. institutional > ISO > APA7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecedencePolicy {
    order: Vec<String>,
}

impl PrecedencePolicy {
    /// Create a policy from an ordered list of ruleset ids
    pub fn new(order: Vec<String>) -> Self {
        Self { order }
    }

    /// Rank of a source under this policy (lower = higher authority)
    pub fn rank(&self, ruleset_id: &str) -> Option<usize> {
        self.order.iter().position(|id| id == ruleset_id)
    }

    /// Declared source ids in authority order
    pub fn order(&self) -> &[String] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::rule::{Predicate, Severity};
    use crate::model::snapshot::NodeKind;

    fn member(rule_id: &str) -> Rule {
        Rule::new(
            rule_id,
            "institutional",
            "1.0.0",
            "desc",
            Severity::Info,
            0,
            Predicate::NodeExists {
                kind: NodeKind::Section,
            },
        )
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("1.2.3"), Some((1, 2, 3)));
        assert_eq!(parse_version("0.0.0"), Some((0, 0, 0)));
        assert_eq!(parse_version("1.2"), None);
        assert_eq!(parse_version("1.2.3.4"), None);
        assert_eq!(parse_version("1.2.x"), None);
    }

    #[test]
    fn test_validate_accepts_well_formed_set() {
        let set = RuleSet::new("institutional", "1.0.0", vec![member("a"), member("b")]);
        assert!(set.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_version() {
        let set = RuleSet::new("institutional", "v1", vec![]);
        assert!(matches!(
            set.validate(),
            Err(VerdexError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_foreign_rule() {
        let mut foreign = member("a");
        foreign.ruleset_id = "apa7".to_string();
        let set = RuleSet::new("institutional", "1.0.0", vec![foreign]);
        assert!(matches!(
            set.validate(),
            Err(VerdexError::RuleOutsideSet { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_rule_id() {
        let set = RuleSet::new("institutional", "1.0.0", vec![member("a"), member("a")]);
        assert!(matches!(
            set.validate(),
            Err(VerdexError::DuplicateRuleInSet { .. })
        ));
    }

    #[test]
    fn test_precedence_policy_rank() {
        let policy = PrecedencePolicy::new(vec![
            "institutional".to_string(),
            "iso-2145".to_string(),
            "apa7".to_string(),
        ]);
        assert_eq!(policy.rank("institutional"), Some(0));
        assert_eq!(policy.rank("apa7"), Some(2));
        assert_eq!(policy.rank("unknown"), None);
    }
}
