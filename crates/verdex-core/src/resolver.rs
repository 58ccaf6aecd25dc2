//! Ruleset resolution into one total evaluation order.
//!
//! Merges the active rule sources into a single ordered sequence using the
//! total-order key `(source_rank, precedence, rule_id)` — source rank from
//! the declared precedence policy, lexical `rule_id` as the final tie-break.
//!
//! ## Conflict discipline
//!
//! - The same ruleset active in two versions at once is an ambiguous
//!   version selection: a hard `AmbiguousVersion` error, never silently
//!   resolved.
//! - The same `rule_id` declared twice with byte-identical content is
//!   deduplicated (the higher-authority occurrence is kept).
//! - The same `rule_id` declared twice with differing content is a
//!   `DuplicateRule` error.
//!
//! Resolution is deterministic and total: merging the same sources in any
//! input order yields the same sequence.

use crate::errors::{Result, VerdexError};
use crate::model::rule::Rule;
use crate::model::ruleset::{PrecedencePolicy, RuleSet, RulesetVersionRef};
use std::collections::BTreeMap;

/// Totally ordered sequence of resolved rules
///
/// Constructed only by `resolve`; the evaluator walks it strictly in order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedRuleSequence {
    rules: Vec<Rule>,
}

impl OrderedRuleSequence {
    /// The resolved rules, in evaluation order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Iterate over the resolved rules in evaluation order
    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Number of resolved rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All ruleset versions contributing to this sequence, sorted and
    /// deduplicated — the `ruleset_version_set` of the audit record.
    pub fn ruleset_versions(&self) -> Vec<RulesetVersionRef> {
        let mut refs: Vec<RulesetVersionRef> = self
            .rules
            .iter()
            .map(|r| RulesetVersionRef {
                ruleset_id: r.ruleset_id.clone(),
                ruleset_version: r.ruleset_version.clone(),
            })
            .collect();
        refs.sort();
        refs.dedup();
        refs
    }
}

/// Resolve the active rule sources into one total evaluation order.
///
/// Validates every source, checks version-selection ambiguity, then sorts
/// all rules by `(source_rank, precedence, rule_id)` and applies the
/// dedup/conflict discipline described in the module docs.
///
/// ## Errors
///
/// - `VerdexError::AmbiguousVersion` — one ruleset id, two versions active
/// - `VerdexError::SourceNotInPolicy` — a source the policy does not rank
/// - `VerdexError::DuplicateRule` — duplicate `rule_id`, differing content
/// - ruleset validation errors (`SchemaError` family)
pub fn resolve(sources: &[RuleSet], policy: &PrecedencePolicy) -> Result<OrderedRuleSequence> {
    for source in sources {
        source.validate()?;
    }

    // Ambiguous version selection: the same ruleset id active twice with
    // different versions. Two byte-equal loads of the same version are
    // tolerated (their rules dedup below).
    let mut versions_by_id: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for source in sources {
        let seen = versions_by_id.entry(source.ruleset_id.as_str()).or_default();
        if !seen.contains(&source.ruleset_version.as_str()) {
            seen.push(source.ruleset_version.as_str());
        }
    }
    for (ruleset_id, versions) in &versions_by_id {
        if versions.len() > 1 {
            let mut versions: Vec<String> = versions.iter().map(|v| v.to_string()).collect();
            versions.sort();
            return Err(VerdexError::AmbiguousVersion {
                ruleset_id: ruleset_id.to_string(),
                versions,
            });
        }
    }

    // Total order key: (source_rank, precedence, rule_id)
    let mut keyed: Vec<(usize, i32, &Rule)> = Vec::new();
    for source in sources {
        let rank = policy
            .rank(&source.ruleset_id)
            .ok_or_else(|| VerdexError::SourceNotInPolicy {
                ruleset_id: source.ruleset_id.clone(),
            })?;
        for rule in &source.rules {
            keyed.push((rank, rule.precedence, rule));
        }
    }
    keyed.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then(a.1.cmp(&b.1))
            .then(a.2.rule_id.cmp(&b.2.rule_id))
    });

    // Dedup byte-identical duplicates (first = highest authority wins);
    // reject any rule_id declared twice with differing content.
    let mut first_seen: BTreeMap<&str, (&Rule, String)> = BTreeMap::new();
    let mut resolved: Vec<Rule> = Vec::with_capacity(keyed.len());
    for (_, _, rule) in keyed {
        let digest = rule.content_digest()?;
        match first_seen.get(rule.rule_id.as_str()) {
            None => {
                first_seen.insert(rule.rule_id.as_str(), (rule, digest));
                resolved.push(rule.clone());
            }
            Some((kept, kept_digest)) => {
                if *kept_digest != digest {
                    return Err(VerdexError::DuplicateRule {
                        rule_id: rule.rule_id.clone(),
                        first_ruleset: kept.ruleset_id.clone(),
                        second_ruleset: rule.ruleset_id.clone(),
                    });
                }
                // Byte-identical duplicate: already represented.
            }
        }
    }

    Ok(OrderedRuleSequence { rules: resolved })
}
