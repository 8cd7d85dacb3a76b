//! Configuration types for cancel-lint.
//!
//! ```toml
//! [options]
//! "cancel_lint.prefer_short_type_names" = true
//! "cancel_lint.suppress_ca2016" = "true"
//!
//! [rules.CT003]
//! severity = "warning"
//!
//! [rules.use-overload-with-cancellation-token]
//! enabled = false
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::types::Severity;

/// Option key selecting short type names in generated edits.
pub const PREFER_SHORT_TYPE_NAMES: &str = "cancel_lint.prefer_short_type_names";
/// Primary option key enabling overlap suppression.
pub const SUPPRESS_OVERLAP: &str = "cancel_lint.suppress_ca2016";
/// Build-property style fallback for [`SUPPRESS_OVERLAP`].
pub const SUPPRESS_OVERLAP_FALLBACK: &str = "build_property.cancellintsuppressca2016";

/// Top-level configuration for cancel-lint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Analyzer options as key-value pairs.
    #[serde(default)]
    pub options: BTreeMap<String, toml::Value>,

    /// Per-rule configurations, keyed by rule id or name.
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Sets an option.
    #[must_use]
    pub fn with_option(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    /// Looks up an option by dotted key.
    ///
    /// Quoted flat keys are tried first, then nested tables.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&toml::Value> {
        if let Some(value) = self.options.get(key) {
            return Some(value);
        }
        let mut parts = key.split('.');
        let mut current = self.options.get(parts.next()?)?;
        for part in parts {
            current = current.as_table()?.get(part)?;
        }
        Some(current)
    }

    /// Checks if a rule is enabled, by id or name.
    #[must_use]
    pub fn is_rule_enabled(&self, code: &str, name: &str) -> bool {
        self.rule_config(code, name)
            .and_then(|c| c.enabled)
            .unwrap_or(true)
    }

    /// Gets the severity override for a rule, by id or name.
    #[must_use]
    pub fn rule_severity(&self, code: &str, name: &str) -> Option<Severity> {
        self.rule_config(code, name).and_then(|c| c.severity)
    }

    fn rule_config(&self, code: &str, name: &str) -> Option<&RuleConfig> {
        self.rules.get(code).or_else(|| self.rules.get(name))
    }

    /// Derives the engine configuration from the options.
    #[must_use]
    pub fn engine(&self) -> EngineConfiguration {
        EngineConfiguration {
            prefer_short_type_names: self
                .first_bool(&[PREFER_SHORT_TYPE_NAMES])
                .unwrap_or(false),
            enable_overlap_suppression: self
                .first_bool(&[SUPPRESS_OVERLAP, SUPPRESS_OVERLAP_FALLBACK])
                .unwrap_or(false),
        }
    }

    /// Reads the first present key as a boolean.
    ///
    /// A present but unparseable value reads as `false`; later keys are not consulted.
    fn first_bool(&self, keys: &[&str]) -> Option<bool> {
        keys.iter()
            .find_map(|key| self.option(key))
            .map(|value| parse_bool(value).unwrap_or(false))
    }
}

/// Parses a TOML boolean or a case-insensitive `"true"`/`"false"` string.
#[must_use]
pub fn parse_bool(value: &toml::Value) -> Option<bool> {
    match value {
        toml::Value::Boolean(b) => Some(*b),
        toml::Value::String(s) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") {
                Some(true)
            } else if s.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Per-compilation engine switches. Immutable once derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfiguration {
    /// Emit `CancellationToken` plus a using directive instead of the qualified name.
    pub prefer_short_type_names: bool,
    /// Suppress the overlapping external diagnostic where our rules fire.
    pub enable_overlap_suppression: bool,
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.rules.is_empty());
        assert_eq!(config.engine(), EngineConfiguration::default());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[options]
"cancel_lint.prefer_short_type_names" = true

[rules.CT003]
severity = "warning"

[rules.use-overload-with-cancellation-token]
enabled = false
"#;

        let config = Config::parse(toml).expect("Failed to parse");
        assert!(config.engine().prefer_short_type_names);
        assert_eq!(
            config.rule_severity("CT003", "use-real-token"),
            Some(Severity::Warning)
        );
        assert!(!config.is_rule_enabled("CT005", "use-overload-with-cancellation-token"));
        assert!(config.is_rule_enabled("CT004", "add-cancellation-token-to-call"));
    }

    #[test]
    fn nested_tables_resolve_dotted_keys() {
        let toml = r#"
[options.cancel_lint]
suppress_ca2016 = "TRUE "
"#;
        let config = Config::parse(toml).unwrap();
        assert!(config.engine().enable_overlap_suppression);
    }

    #[test]
    fn fallback_key_is_used_when_primary_absent() {
        let config = Config::new().with_option(SUPPRESS_OVERLAP_FALLBACK, "true");
        assert!(config.engine().enable_overlap_suppression);
    }

    #[test]
    fn unparseable_primary_does_not_fall_through() {
        let config = Config::new()
            .with_option(SUPPRESS_OVERLAP, "yes")
            .with_option(SUPPRESS_OVERLAP_FALLBACK, "true");
        assert!(!config.engine().enable_overlap_suppression);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = Config::parse("[options").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
