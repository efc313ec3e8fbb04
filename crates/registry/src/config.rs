use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use dirs_next::config_dir;
use jsonmap_util::expand_tilde;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Data-dictionary version used when none is configured.
pub const DEFAULT_DD_VERSION: &str = "3.39.0";

/// Environment variable naming the mapping root directory.
pub const MAPPING_DIR_ENV: &str = "JSON_MAPPING_DIR";
/// Environment variable overriding the data-dictionary version.
pub const DD_VERSION_ENV: &str = "JSON_MAPPING_DD_VERSION";
/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "JSON_MAPPING_CONFIG";

/// Settings that locate facility mapping files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    /// Directory holding one sub-directory per facility.
    pub root_directory: Option<PathBuf>,
    /// Data-dictionary version selecting the manifest inside a facility.
    pub dd_version: String,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            root_directory: None,
            dd_version: DEFAULT_DD_VERSION.to_string(),
        }
    }
}

impl MappingConfig {
    /// Loads the configuration file (when present) and applies environment
    /// overrides on top of it.
    pub fn load() -> anyhow::Result<Self> {
        let path = default_config_path();
        let mut config = Self::load_from_path(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a specific file; a missing file yields the
    /// defaults.
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "mapping config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: MappingConfig =
            serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))?;
        config.root_directory = config.root_directory.map(|root| expand_tilde(&root.to_string_lossy()));
        Ok(config)
    }

    /// Applies `JSON_MAPPING_DIR` and `JSON_MAPPING_DD_VERSION` when set and
    /// non-blank.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = env::var(MAPPING_DIR_ENV)
            && !root.trim().is_empty()
        {
            self.root_directory = Some(expand_tilde(&root));
        }
        if let Ok(version) = env::var(DD_VERSION_ENV)
            && !version.trim().is_empty()
        {
            self.dd_version = version.trim().to_string();
        }
    }

    pub fn with_root_directory(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_directory = Some(root.into());
        self
    }
}

/// Get the default path for the mapping configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jsonmap")
        .join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_honors_environment_override() {
        let override_path = "~/custom/jsonmap/config.json";
        temp_env::with_var(CONFIG_PATH_ENV, Some(override_path), || {
            assert_eq!(default_config_path(), expand_tilde(override_path));
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        let directory = tempfile::tempdir().expect("create temp dir");
        let config = MappingConfig::load_from_path(&directory.path().join("absent.json")).expect("load config");
        assert_eq!(config, MappingConfig::default());
        assert_eq!(config.dd_version, DEFAULT_DD_VERSION);
    }

    #[test]
    fn file_values_are_read() {
        let directory = tempfile::tempdir().expect("create temp dir");
        let path = directory.path().join("config.json");
        fs::write(&path, r#"{"root_directory": "/srv/mappings", "dd_version": "4.0.0"}"#).expect("write config");
        let config = MappingConfig::load_from_path(&path).expect("load config");
        assert_eq!(config.root_directory, Some(PathBuf::from("/srv/mappings")));
        assert_eq!(config.dd_version, "4.0.0");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let directory = tempfile::tempdir().expect("create temp dir");
        let path = directory.path().join("config.json");
        fs::write(&path, r#"{"root": "/srv/mappings"}"#).expect("write config");
        assert!(MappingConfig::load_from_path(&path).is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        temp_env::with_vars(
            [(MAPPING_DIR_ENV, Some("/data/json_mappings")), (DD_VERSION_ENV, Some(" 3.41.0 "))],
            || {
                let mut config = MappingConfig::default().with_root_directory("/srv/mappings");
                config.apply_env_overrides();
                assert_eq!(config.root_directory, Some(PathBuf::from("/data/json_mappings")));
                assert_eq!(config.dd_version, "3.41.0");
            },
        );
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        temp_env::with_vars([(MAPPING_DIR_ENV, Some("  ")), (DD_VERSION_ENV, None::<&str>)], || {
            let mut config = MappingConfig::default();
            config.apply_env_overrides();
            assert_eq!(config.root_directory, None);
            assert_eq!(config.dd_version, DEFAULT_DD_VERSION);
        });
    }
}
