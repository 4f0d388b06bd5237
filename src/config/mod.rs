//! Configuration module for the login pipeline
//!
//! Handles loading and parsing of YAML pipeline definitions with support for
//! environment variable expansion in option values and validation. Each pipeline stage names a
//! registered login module, its control flag and its option map.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

mod loader;
mod options;

pub use loader::ConfigLoader;
pub use options::{
    parse_flag, CallerIdentityOptions, OPT_ADD_RUN_AS_ROLES, OPT_PASSWORD,
    OPT_PASSWORD_STACKING, OPT_USER_NAME,
};

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
///
/// # Examples
///
/// ```ignore
/// std::env::set_var("DB_PASSWORD", "value");
/// let result = expand_env_vars("password: ${DB_PASSWORD}");
/// assert_eq!(result, "password: value");
///
/// let result = expand_env_vars("${MISSING:-default}");
/// assert_eq!(result, "default");
/// ```
fn expand_env_vars(s: &str) -> String {
    let re = match regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}") {
        Ok(re) => re,
        Err(_) => return s.to_string(),
    };
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name.as_str()) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default. Keep the original placeholder.
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);
    result
}

/// Deserialize a string, expanding environment variables in the value.
///
/// Expansion runs after YAML parsing, so a variable's value is never read
/// as YAML syntax.
fn deserialize_with_env<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(expand_env_vars(&s))
}

/// Deserialize a string map, expanding environment variables in every value
fn deserialize_map_with_env<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let map = HashMap::<String, String>::deserialize(deserializer)?;
    Ok(map
        .into_iter()
        .map(|(k, v)| {
            let expanded = expand_env_vars(&v);
            (k, expanded)
        })
        .collect())
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    pub modules: Vec<ModuleConfig>,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        ConfigLoader::parse(content)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modules.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one login module must be configured".into(),
            ));
        }

        for (idx, module) in self.modules.iter().enumerate() {
            if module.code.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "Module #{} has an empty code",
                    idx
                )));
            }
            if !crate::pipeline::is_registered(&module.code) {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown login module '{}'",
                    module.code
                )));
            }
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level '{}': must be trace, debug, info, warn or error",
                    self.logging.level
                )))
            }
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is not set. Default: "info"
    #[serde(default = "default_log_level", deserialize_with = "deserialize_with_env")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output. Default: false
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// How a stage's result counts toward the overall attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlFlag {
    /// Must succeed; later stages still run
    #[default]
    Required,
    /// Must succeed; failure ends the attempt immediately
    Requisite,
    /// Success ends the attempt when no required stage failed before it
    Sufficient,
    /// Result does not affect the attempt
    Optional,
}

/// One stage of the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub code: String,
    #[serde(default)]
    pub flag: ControlFlag,
    #[serde(default, deserialize_with = "deserialize_map_with_env")]
    pub options: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars_default() {
        let expanded = expand_env_vars("password: ${CALLER_IDENTITY_UNSET_VAR:-fallback}");
        assert_eq!(expanded, "password: fallback");
    }

    #[test]
    fn test_expand_env_vars_keeps_unknown_placeholder() {
        let expanded = expand_env_vars("password: ${CALLER_IDENTITY_UNSET_VAR}");
        assert_eq!(expanded, "password: ${CALLER_IDENTITY_UNSET_VAR}");
    }

    #[test]
    fn test_config_validation_empty_modules() {
        let config = Config {
            logging: LoggingConfig::default(),
            modules: vec![],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_unknown_module() {
        let config = Config {
            logging: LoggingConfig::default(),
            modules: vec![ModuleConfig {
                code: "ldap".into(),
                flag: ControlFlag::Required,
                options: HashMap::new(),
            }],
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ldap"));
    }

    #[test]
    fn test_control_flag_defaults_to_required() {
        let yaml = r#"
modules:
  - code: caller-identity
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.modules[0].flag, ControlFlag::Required);
        assert!(config.modules[0].options.is_empty());
        assert_eq!(config.logging.level, "info");
    }
}
