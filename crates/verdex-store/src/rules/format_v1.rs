//! Ruleset wire format, version 1
//!
//! Serde structs for the on-disk YAML representation of a ruleset. The wire
//! format reuses the core's serde-ready `Severity` and `Predicate` types so
//! that the predicate algebra has exactly one schema.

use serde::{Deserialize, Serialize};
use verdex_core::model::rule::{Predicate, Rule, Severity};
use verdex_core::model::ruleset::RuleSet;

/// Wire schema version understood by this parser
pub const RULESET_SCHEMA_VERSION: u32 = 1;

/// Top-level ruleset file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesetFileV1 {
    /// Wire schema version (must be 1)
    pub schema_version: u32,

    /// Source identifier
    pub ruleset_id: String,

    /// MAJOR.MINOR.PATCH version of this source
    pub ruleset_version: String,

    /// Member rules in declaration order
    pub rules: Vec<RuleEntryV1>,
}

/// One rule entry in a ruleset file
///
/// The owning ruleset id and version come from the file header, so entries
/// carry only rule-local fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEntryV1 {
    pub rule_id: String,
    pub description: String,
    pub severity: Severity,
    #[serde(default)]
    pub precedence: i32,
    pub predicate: Predicate,
}

impl RulesetFileV1 {
    /// Convert the wire representation into the domain model.
    pub fn into_ruleset(self) -> RuleSet {
        let ruleset_id = self.ruleset_id;
        let ruleset_version = self.ruleset_version;
        let rules = self
            .rules
            .into_iter()
            .map(|entry| {
                Rule::new(
                    entry.rule_id,
                    ruleset_id.clone(),
                    ruleset_version.clone(),
                    entry.description,
                    entry.severity,
                    entry.precedence,
                    entry.predicate,
                )
            })
            .collect();
        RuleSet::new(ruleset_id, ruleset_version, rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_ruleset_propagates_header_identity() {
        let file = RulesetFileV1 {
            schema_version: 1,
            ruleset_id: "apa7".to_string(),
            ruleset_version: "7.0.0".to_string(),
            rules: vec![RuleEntryV1 {
                rule_id: "r1".to_string(),
                description: "desc".to_string(),
                severity: Severity::Info,
                precedence: 3,
                predicate: Predicate::NodeExists {
                    kind: verdex_core::model::snapshot::NodeKind::Section,
                },
            }],
        };

        let set = file.into_ruleset();
        assert_eq!(set.ruleset_id, "apa7");
        assert_eq!(set.rules[0].ruleset_id, "apa7");
        assert_eq!(set.rules[0].ruleset_version, "7.0.0");
        assert_eq!(set.rules[0].precedence, 3);
        assert!(set.validate().is_ok());
    }
}
