//! Engine configuration
//!
//! One TOML file configures an engine instance: where rulesets live, where
//! the audit log lives, the declared precedence order of rule sources, and
//! the logging profile.
//!
//! ```toml
//! rules_dir = "rules"
//! audit_dir = "audit"
//! precedence = ["institutional", "iso-2145", "apa7"]
//! logging_profile = "development"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use verdex_core::errors::{VxError, VxErrorKind};
use verdex_core::logging_facility::Profile;
use verdex_core::model::ruleset::PrecedencePolicy;

/// Logging profile as configured (wire form of `logging_facility::Profile`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoggingProfile {
    Development,
    Production,
    Test,
}

impl Default for LoggingProfile {
    fn default() -> Self {
        LoggingProfile::Development
    }
}

impl From<LoggingProfile> for Profile {
    fn from(profile: LoggingProfile) -> Self {
        match profile {
            LoggingProfile::Development => Profile::Development,
            LoggingProfile::Production => Profile::Production,
            LoggingProfile::Test => Profile::Test,
        }
    }
}

/// Engine instance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding `<ruleset_id>@<version>.yaml` files
    pub rules_dir: PathBuf,

    /// Directory holding the append-only audit log
    pub audit_dir: PathBuf,

    /// Declared source precedence, highest authority first
    pub precedence: Vec<String>,

    /// Logging profile for `logging_facility::init`
    #[serde(default)]
    pub logging_profile: LoggingProfile,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// ## Errors
    ///
    /// `VxErrorKind::Io` for unreadable files, `VxErrorKind::Schema` for
    /// unparseable or invalid content.
    pub fn from_file(path: &Path) -> Result<Self, VxError> {
        let content = fs::read_to_string(path).map_err(|e| {
            VxError::new(VxErrorKind::Io)
                .with_op("read_config")
                .with_message(format!("{}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str, context: &str) -> Result<Self, VxError> {
        let config: EngineConfig = toml::from_str(content).map_err(|e| {
            VxError::new(VxErrorKind::Schema)
                .with_op("parse_config")
                .with_message(format!("{}: {}", context, e))
        })?;
        config.validate(context)?;
        Ok(config)
    }

    fn validate(&self, context: &str) -> Result<(), VxError> {
        if self.precedence.is_empty() {
            return Err(VxError::new(VxErrorKind::Schema)
                .with_op("parse_config")
                .with_message(format!("{}: precedence must list at least one source", context)));
        }
        Ok(())
    }

    /// The declared precedence order as a policy value
    pub fn precedence_policy(&self) -> PrecedencePolicy {
        PrecedencePolicy::new(self.precedence.clone())
    }
}
