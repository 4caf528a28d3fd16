use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;
use crate::remap::{MatchMode, TargetGroup};

/// Root configuration structure for tokenswap.json
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TokenswapConfig {
    #[serde(default)]
    pub defaults: Defaults,
}

/// All configurable defaults that can be overridden via tokenswap.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    #[serde(default = "default_rule")]
    pub rule: RuleDefaults,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            rule: default_rule(),
        }
    }
}

/// Rule options applied when a request leaves them out
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefaults {
    #[serde(default)]
    pub match_mode: MatchMode,

    #[serde(default)]
    pub case_sensitive: bool,

    #[serde(default)]
    pub target_group: TargetGroup,
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_rule() -> RuleDefaults {
    RuleDefaults {
        match_mode: MatchMode::WholeSegment,
        case_sensitive: false,
        target_group: TargetGroup::Same,
    }
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load defaults, merging file config with built-in defaults.
/// If tokenswap.json is missing or invalid, silently returns built-in defaults.
pub fn load_defaults() -> Defaults {
    load_config().defaults
}

/// Load the full tokenswap.json config, falling back to defaults on any error.
pub fn load_config() -> TokenswapConfig {
    paths::tokenswap_json()
        .and_then(|path| load_config_from(&path))
        .unwrap_or_default()
}

/// Attempt to load config from an explicit file.
pub fn load_config_from(path: &Path) -> crate::Result<TokenswapConfig> {
    if !path.exists() {
        return Err(crate::Error::validation_invalid_argument(
            "config",
            "Config file not found",
            Some(path.display().to_string()),
            None,
        ));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        crate::Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    serde_json::from_str(&content)
        .map_err(|e| crate::Error::config_invalid_json(path.display().to_string(), e))
}

/// Resolve which config file applies: an explicit override or the global file.
pub fn config_location(explicit: Option<&Path>) -> crate::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => paths::tokenswap_json(),
    }
}

/// Check if the global tokenswap.json file exists
pub fn config_exists() -> bool {
    paths::tokenswap_json()
        .map(|p| p.exists())
        .unwrap_or(false)
}

/// Get built-in defaults (ignoring any file config)
pub fn builtin_defaults() -> Defaults {
    Defaults::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn builtin_rule_defaults() {
        let defaults = builtin_defaults();
        assert_eq!(defaults.rule.match_mode, MatchMode::WholeSegment);
        assert!(!defaults.rule.case_sensitive);
        assert_eq!(defaults.rule.target_group, TargetGroup::Same);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, r#"{{"defaults": {{"rule": {{"matchMode": "substring"}}}}}}"#).unwrap();

        let config = load_config_from(temp.path()).unwrap();
        assert_eq!(config.defaults.rule.match_mode, MatchMode::Substring);
        assert!(!config.defaults.rule.case_sensitive);
    }

    #[test]
    fn empty_object_is_all_defaults() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "{{}}").unwrap();

        let config = load_config_from(temp.path()).unwrap();
        assert_eq!(config, TokenswapConfig::default());
    }

    #[test]
    fn invalid_file_reports_config_error() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "not json").unwrap();

        let err = load_config_from(temp.path()).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_json");
    }

    #[test]
    fn missing_file_is_a_usage_error() {
        let err = load_config_from(Path::new("/nonexistent/tokenswap.json")).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
        assert_eq!(err.details["field"], "config");
    }
}
