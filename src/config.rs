//! Comparison modes and validator settings loaded from JSON

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::diff::{Policy, PolicyError, DEFAULT_TOLERANCE};
use crate::validate::ValidationOptions;

pub const DEFAULT_MODE: &str = "default";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown mode {name:?} (available: {available})")]
    UnknownMode { name: String, available: String },

    #[error("mode {name:?}: {source}")]
    InvalidMode {
        name: String,
        #[source]
        source: PolicyError,
    },
}

/// One named comparison mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeConfig {
    #[serde(default)]
    pub description: String,

    #[serde(default = "default_tolerance")]
    pub float_tolerance: f64,

    /// Object keys skipped wherever they occur
    #[serde(default)]
    pub ignore_fields: Vec<String>,

    #[serde(default)]
    pub strict_type_check: bool,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

impl ModeConfig {
    fn new(description: &str, float_tolerance: f64, ignore_fields: &[&str], strict_type_check: bool) -> Self {
        Self {
            description: description.to_string(),
            float_tolerance,
            ignore_fields: ignore_fields.iter().map(|s| s.to_string()).collect(),
            strict_type_check,
        }
    }

    /// Build a validated policy
    pub fn to_policy(&self) -> Result<Policy, PolicyError> {
        Policy::new()
            .with_tolerance(self.float_tolerance)?
            .ignore_fields(self.ignore_fields.iter().cloned())
            .map(|p| p.strict_types(self.strict_type_check))
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    #[serde(default)]
    pub modes: BTreeMap<String, ModeConfig>,

    /// Replaces the validator's built-in extension allow-list when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_extensions: Option<Vec<String>>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        let mut config = Self { modes: BTreeMap::new(), supported_extensions: None };
        config.add_builtin_modes();
        config
    }
}

impl CheckConfig {
    fn add_builtin_modes(&mut self) {
        let builtin = [
            ("strict", ModeConfig::new("Exact comparison with strict types", 1e-9, &[], true)),
            (
                DEFAULT_MODE,
                ModeConfig::new("Ignore generator metadata", DEFAULT_TOLERANCE, &["generator", "created", "timestamp"], false),
            ),
            (
                "relaxed",
                ModeConfig::new(
                    "Loose tolerance, ignore version and extension lists",
                    1e-4,
                    &["generator", "created", "timestamp", "version", "extensionsUsed", "extensionsRequired"],
                    false,
                ),
            ),
        ];
        for (name, mode) in builtin {
            self.modes.entry(name.to_string()).or_insert(mode);
        }
    }

    /// Parse JSON text; built-in modes fill in any mode the text does not define
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let mut config: Self = serde_json::from_str(text)?;
        config.add_builtin_modes();
        config.check_modes()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    fn check_modes(&self) -> ConfigResult<()> {
        for name in self.modes.keys() {
            self.policy(name)?;
        }
        Ok(())
    }

    pub fn mode(&self, name: &str) -> ConfigResult<&ModeConfig> {
        self.modes.get(name).ok_or_else(|| ConfigError::UnknownMode {
            name: name.to_string(),
            available: self.modes.keys().cloned().collect::<Vec<_>>().join(", "),
        })
    }

    /// Policy for a named mode
    pub fn policy(&self, name: &str) -> ConfigResult<Policy> {
        self.mode(name)?
            .to_policy()
            .map_err(|source| ConfigError::InvalidMode { name: name.to_string(), source })
    }

    pub fn validation_options(&self) -> ValidationOptions {
        let mut options = ValidationOptions::default();
        if let Some(extensions) = &self.supported_extensions {
            options.supported_extensions = extensions.iter().cloned().collect();
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_modes() {
        let config = CheckConfig::default();
        let strict = config.policy("strict").unwrap();
        assert_eq!(strict.float_tolerance(), 1e-9);
        assert!(strict.strict_type_check());

        let relaxed = config.policy("relaxed").unwrap();
        assert!(relaxed.is_ignored("extensionsUsed"));
        assert!(config.policy("default").unwrap().is_ignored("generator"));
    }

    #[test]
    fn test_file_overrides_and_merges() {
        let config = CheckConfig::from_json_str(
            r#"{"modes":{"default":{"float_tolerance":0.01},"mesh":{"ignore_fields":["extras"]}},
                "supported_extensions":["KHR_materials_unlit"]}"#,
        )
        .unwrap();
        assert_eq!(config.policy("default").unwrap().float_tolerance(), 0.01);
        assert!(config.policy("mesh").unwrap().is_ignored("extras"));
        assert!(config.modes.contains_key("strict"));
        assert_eq!(config.validation_options().supported_extensions.len(), 1);
    }

    #[test]
    fn test_invalid_mode_fails_fast() {
        let err = CheckConfig::from_json_str(r#"{"modes":{"bad":{"float_tolerance":-1}}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMode { ref name, .. } if name == "bad"));

        let err = CheckConfig::default().policy("nope").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownMode { .. }));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tilecheck.json");
        let config = CheckConfig::default();
        config.save(&path).unwrap();
        assert_eq!(CheckConfig::load(&path).unwrap(), config);
    }
}
