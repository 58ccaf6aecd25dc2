//! Pinned, read-only rule catalog
//!
//! A catalog is a versioned snapshot of loaded rulesets, handed to each
//! evaluation run by value. A run's view of rules is pinned at start and
//! cannot change mid-run even if the backing store is reloaded
//! concurrently — there is no ambient mutable global state.

use crate::errors::{ruleset_not_found, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use verdex_core::boundary::RuleProvider;
use verdex_core::errors::{VxError, VxErrorKind};
use verdex_core::model::ruleset::RuleSet;

/// Read-only map of loaded rulesets, keyed by ruleset id
///
/// At most one version of a ruleset can be pinned at a time; asking for two
/// versions of the same source is the ambiguity the resolver refuses, so
/// the catalog refuses it at load time already.
#[derive(Debug, Default, Clone)]
pub struct RuleCatalog {
    entries: BTreeMap<String, Arc<RuleSet>>,
}

impl RuleCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the requested rulesets through a provider.
    ///
    /// ## Errors
    ///
    /// - provider errors (`NotFound`, `Schema`) pass through
    /// - `Conflict` if the same ruleset id is requested in two versions
    pub fn load(
        provider: &dyn RuleProvider,
        requests: &[(String, Option<String>)],
    ) -> Result<Self> {
        let mut entries: BTreeMap<String, Arc<RuleSet>> = BTreeMap::new();
        for (ruleset_id, version) in requests {
            let set = provider.load_ruleset(ruleset_id, version.as_deref())?;
            if let Some(existing) = entries.get(ruleset_id) {
                if existing.ruleset_version != set.ruleset_version {
                    return Err(VxError::new(VxErrorKind::Conflict)
                        .with_op("catalog_load")
                        .with_ruleset_id(ruleset_id.clone())
                        .with_candidates(vec![
                            existing.ruleset_version.clone(),
                            set.ruleset_version.clone(),
                        ])
                        .with_message("Ruleset requested in two versions"));
                }
                continue;
            }
            entries.insert(ruleset_id.clone(), Arc::new(set));
        }
        Ok(Self { entries })
    }

    /// Pin the current contents as an immutable per-run view
    pub fn pin(&self) -> CatalogView {
        CatalogView {
            entries: self.entries.clone(),
        }
    }
}

/// Immutable per-run view of a catalog
///
/// Cheap to clone (shared `Arc`s); safe to hand to concurrent runs.
#[derive(Debug, Clone)]
pub struct CatalogView {
    entries: BTreeMap<String, Arc<RuleSet>>,
}

impl CatalogView {
    /// Look up a pinned ruleset by id
    pub fn get(&self, ruleset_id: &str) -> Result<Arc<RuleSet>> {
        self.entries
            .get(ruleset_id)
            .cloned()
            .ok_or_else(|| ruleset_not_found(ruleset_id, None))
    }

    /// All pinned rulesets in deterministic (id-sorted) order
    pub fn rulesets(&self) -> Vec<RuleSet> {
        self.entries.values().map(|set| (**set).clone()).collect()
    }

    /// Number of pinned rulesets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the view is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
