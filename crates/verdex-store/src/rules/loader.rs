//! Ruleset loader with validation
//!
//! Parses YAML ruleset files and validates schema version and domain shape
//! before anything reaches the resolver. Files are named
//! `<ruleset_id>@<version>.yaml`; loading without an explicit version
//! selects the highest version present, deterministically.

use crate::errors::{io_error, ruleset_not_found, ruleset_schema, Result};
use crate::rules::format_v1::{RulesetFileV1, RULESET_SCHEMA_VERSION};
use std::fs;
use std::path::{Path, PathBuf};
use verdex_core::boundary::RuleProvider;
use verdex_core::errors::VxError;
use verdex_core::model::ruleset::{parse_version, RuleSet};

/// Parse a ruleset from a YAML string
pub fn parse_ruleset_str(content: &str, context: &str) -> Result<RuleSet> {
    let file: RulesetFileV1 = serde_yaml::from_str(content)
        .map_err(|e| ruleset_schema(context, &format!("YAML parse error: {}", e)))?;

    if file.schema_version != RULESET_SCHEMA_VERSION {
        return Err(ruleset_schema(
            context,
            &format!(
                "Unsupported schema_version: {}. Expected {}",
                file.schema_version, RULESET_SCHEMA_VERSION
            ),
        ));
    }

    let set = file.into_ruleset();
    set.validate()
        .map_err(|e| VxError::from(e).with_op("parse_ruleset"))?;
    Ok(set)
}

/// Parse a ruleset file from a path
pub fn parse_ruleset_file(path: &Path) -> Result<RuleSet> {
    let content = fs::read_to_string(path).map_err(|e| io_error("read_ruleset", e))?;
    parse_ruleset_str(&content, &path.display().to_string())
}

/// Filesystem-backed rule store
///
/// One YAML file per ruleset version under a flat directory.
pub struct FsRuleStore {
    root: PathBuf,
}

impl FsRuleStore {
    /// Create a rule store over the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, ruleset_id: &str, version: &str) -> PathBuf {
        self.root.join(format!("{}@{}.yaml", ruleset_id, version))
    }

    /// All stored versions of a ruleset, ascending by version.
    ///
    /// Filenames that carry the ruleset id but an unparseable version are
    /// ignored — they cannot be selected deterministically.
    pub fn list_versions(&self, ruleset_id: &str) -> Result<Vec<String>> {
        let prefix = format!("{}@", ruleset_id);
        let mut versions: Vec<String> = Vec::new();

        let entries = fs::read_dir(&self.root).map_err(|e| io_error("list_rulesets", e))?;
        for entry in entries {
            let entry = entry.map_err(|e| io_error("list_rulesets", e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(rest) = name.strip_prefix(&prefix) else { continue };
            let Some(version) = rest.strip_suffix(".yaml") else { continue };
            if parse_version(version).is_some() {
                versions.push(version.to_string());
            }
        }

        versions.sort_by_key(|v| parse_version(v).expect("filtered above"));
        Ok(versions)
    }
}

impl RuleProvider for FsRuleStore {
    fn load_ruleset(&self, ruleset_id: &str, version: Option<&str>) -> Result<RuleSet> {
        let selected = match version {
            Some(v) => v.to_string(),
            None => self
                .list_versions(ruleset_id)?
                .pop()
                .ok_or_else(|| ruleset_not_found(ruleset_id, None))?,
        };

        let path = self.path_for(ruleset_id, &selected);
        if !path.exists() {
            return Err(ruleset_not_found(ruleset_id, Some(&selected)));
        }

        let set = parse_ruleset_file(&path)?;
        if set.ruleset_id != ruleset_id || set.ruleset_version != selected {
            return Err(ruleset_schema(
                &path.display().to_string(),
                &format!(
                    "file claims {}@{} but is stored as {}@{}",
                    set.ruleset_id, set.ruleset_version, ruleset_id, selected
                ),
            ));
        }

        tracing::debug!(
            ruleset_id = %ruleset_id,
            version = %selected,
            rule_count = set.rules.len(),
            "loaded ruleset"
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
schema_version: 1
ruleset_id: apa7
ruleset_version: 7.0.0
rules:
  - rule_id: citation-present
    description: Documents must contain at least one citation
    severity: blocking
    precedence: 0
    predicate:
      type: node_exists
      kind: citation
  - rule_id: citation-format
    description: Citations must contain an author-year separator
    severity: warning
    precedence: 10
    predicate:
      type: text_matches
      kind: citation
      pattern:
        contains: ","
"#;

    #[test]
    fn test_parse_sample_ruleset() {
        let set = parse_ruleset_str(SAMPLE, "inline").unwrap();
        assert_eq!(set.ruleset_id, "apa7");
        assert_eq!(set.rules.len(), 2);
        assert!(set.rules[0].is_blocking());
        assert!(!set.rules[1].is_blocking());
    }

    #[test]
    fn test_unsupported_schema_version_is_rejected() {
        let content = SAMPLE.replace("schema_version: 1", "schema_version: 2");
        let err = parse_ruleset_str(&content, "inline").unwrap_err();
        assert_eq!(err.kind(), verdex_core::errors::VxErrorKind::Schema);
    }

    #[test]
    fn test_duplicate_rule_id_is_rejected() {
        let content = SAMPLE.replace("citation-format", "citation-present");
        let err = parse_ruleset_str(&content, "inline").unwrap_err();
        assert_eq!(err.kind(), verdex_core::errors::VxErrorKind::Schema);
    }

    #[test]
    fn test_malformed_yaml_is_rejected() {
        let err = parse_ruleset_str("rules: [unterminated", "inline").unwrap_err();
        assert_eq!(err.kind(), verdex_core::errors::VxErrorKind::Schema);
    }
}
