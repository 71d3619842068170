//! Simplifier configuration
//!
//! Settings are read from a TOML file and can be overridden through
//! environment variables:
//!
//! ```toml
//! unimplemented_policy = "warn"   # ignore | warn | abort
//! not_wired_policy = "warn"
//! max_registers = 65536
//! fold_constants = false
//! trace = false
//! ```
//!
//! | Variable                           | Field                  |
//! |------------------------------------|------------------------|
//! | `DEXSIMPLIFY_TRACE`                | `trace`                |
//! | `DEXSIMPLIFY_FOLD_CONSTANTS`       | `fold_constants`       |
//! | `DEXSIMPLIFY_UNIMPLEMENTED_POLICY` | `unimplemented_policy` |
//! | `DEXSIMPLIFY_NOT_WIRED_POLICY`     | `not_wired_policy`     |

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use tracing::warn;

/// What the preparation step does when it meets an instruction it cannot
/// fully handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticPolicy {
    /// Record a diagnostic and continue
    Ignore,
    /// Record a diagnostic, log a warning and continue
    Warn,
    /// Stop preparing the method
    Abort,
}

impl FromStr for DiagnosticPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "warn" => Ok(Self::Warn),
            "abort" => Ok(Self::Abort),
            other => Err(ConfigError::InvalidValue {
                key: "policy",
                value: other.to_string(),
            }),
        }
    }
}

/// Errors while loading configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Configuration file could not be read
    Io { path: String, message: String },
    /// TOML syntax or schema error
    Parse(String),
    /// A value outside the accepted set
    InvalidValue { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "failed to read config '{}': {}", path, message)
            }
            Self::Parse(msg) => write!(f, "invalid config: {}", msg),
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value for {}: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Simplifier configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    /// Policy for instructions that fall back to the unimplemented handler
    pub unimplemented_policy: DiagnosticPolicy,
    /// Policy for instructions whose category has no factory yet
    pub not_wired_policy: DiagnosticPolicy,
    /// Largest register file a method may request
    pub max_registers: usize,
    /// Route the const family to the constant handler instead of the
    /// unimplemented fallback
    pub fold_constants: bool,
    /// Ask the binary for a `TRACE`-level subscriber. The library itself
    /// never reads this; it only emits events.
    pub trace: bool,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            unimplemented_policy: DiagnosticPolicy::Warn,
            not_wired_policy: DiagnosticPolicy::Warn,
            max_registers: 65536,
            fold_constants: false,
            trace: false,
        }
    }
}

impl SimplifyConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply `DEXSIMPLIFY_*` environment overrides
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Unparseable values are logged and ignored, leaving the current setting.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup("DEXSIMPLIFY_TRACE") {
            match parse_flag(&value) {
                Some(flag) => self.trace = flag,
                None => warn!(
                    target: "dexsimplify::config",
                    value = %value,
                    "ignoring DEXSIMPLIFY_TRACE"
                ),
            }
        }
        if let Some(value) = lookup("DEXSIMPLIFY_FOLD_CONSTANTS") {
            match parse_flag(&value) {
                Some(flag) => self.fold_constants = flag,
                None => warn!(
                    target: "dexsimplify::config",
                    value = %value,
                    "ignoring DEXSIMPLIFY_FOLD_CONSTANTS"
                ),
            }
        }
        if let Some(value) = lookup("DEXSIMPLIFY_UNIMPLEMENTED_POLICY") {
            match value.parse() {
                Ok(policy) => self.unimplemented_policy = policy,
                Err(e) => warn!(
                    target: "dexsimplify::config",
                    error = %e,
                    "ignoring DEXSIMPLIFY_UNIMPLEMENTED_POLICY"
                ),
            }
        }
        if let Some(value) = lookup("DEXSIMPLIFY_NOT_WIRED_POLICY") {
            match value.parse() {
                Ok(policy) => self.not_wired_policy = policy,
                Err(e) => warn!(
                    target: "dexsimplify::config",
                    error = %e,
                    "ignoring DEXSIMPLIFY_NOT_WIRED_POLICY"
                ),
            }
        }
        self
    }

    /// Create a configuration with tracing enabled
    pub fn with_trace(mut self) -> Self {
        self.trace = true;
        self
    }

    /// Create a configuration that folds const instructions
    pub fn with_constant_folding(mut self) -> Self {
        self.fold_constants = true;
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = SimplifyConfig::default();
        assert_eq!(config.unimplemented_policy, DiagnosticPolicy::Warn);
        assert_eq!(config.not_wired_policy, DiagnosticPolicy::Warn);
        assert_eq!(config.max_registers, 65536);
        assert!(!config.fold_constants);
        assert!(!config.trace);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimplifyConfig::from_toml_str("not_wired_policy = \"abort\"\n").unwrap();
        assert_eq!(config.not_wired_policy, DiagnosticPolicy::Abort);
        assert_eq!(config.unimplemented_policy, DiagnosticPolicy::Warn);
        assert_eq!(config.max_registers, 65536);
    }

    #[test]
    fn test_full_toml() {
        let text = r#"
            unimplemented_policy = "ignore"
            not_wired_policy = "abort"
            max_registers = 256
            fold_constants = true
            trace = true
        "#;
        let config = SimplifyConfig::from_toml_str(text).unwrap();
        assert_eq!(
            config,
            SimplifyConfig {
                unimplemented_policy: DiagnosticPolicy::Ignore,
                not_wired_policy: DiagnosticPolicy::Abort,
                max_registers: 256,
                fold_constants: true,
                trace: true,
            }
        );
    }

    #[test]
    fn test_bad_toml() {
        let err =
            SimplifyConfig::from_toml_str("unimplemented_policy = \"sometimes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SimplifyConfig::load("/nonexistent/dexsimplify.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_file() {
        let name = format!("dexsimplify-config-{}.toml", std::process::id());
        let path = std::env::temp_dir().join(name);
        fs::write(&path, "trace = true\n").unwrap();
        let config = SimplifyConfig::load(&path).unwrap();
        fs::remove_file(&path).ok();
        assert!(config.trace);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DEXSIMPLIFY_TRACE", "on"),
            ("DEXSIMPLIFY_UNIMPLEMENTED_POLICY", "Abort"),
            ("DEXSIMPLIFY_NOT_WIRED_POLICY", "bogus"),
            ("DEXSIMPLIFY_FOLD_CONSTANTS", "yes"),
        ]
        .into_iter()
        .collect();
        let config = SimplifyConfig::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert!(config.trace);
        assert!(config.fold_constants);
        assert_eq!(config.unimplemented_policy, DiagnosticPolicy::Abort);
        // invalid value leaves the default in place
        assert_eq!(config.not_wired_policy, DiagnosticPolicy::Warn);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("ignore".parse::<DiagnosticPolicy>(), Ok(DiagnosticPolicy::Ignore));
        assert_eq!(" WARN ".parse::<DiagnosticPolicy>(), Ok(DiagnosticPolicy::Warn));
        assert!("loud".parse::<DiagnosticPolicy>().is_err());
    }
}
