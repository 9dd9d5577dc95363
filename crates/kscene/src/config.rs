//! Loader configuration
//!
//! Read from a TOML file, every field is optional:
//! ```toml
//! engine_version = "1.2"
//! strict_near_plane = true
//!
//! [path_vars]
//! PROJECT_SRC = "/home/user/project/src"
//! ```

use crate::{paths::PathVars, version::Version};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't read config `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Version of the engine the scenes are loaded for. Scenes requiring a newer version are
    /// rejected. If unset, any required version is accepted.
    pub engine_version: Option<Version>,
    /// Reject perspective cameras with a near plane at 0, instead of warning about them
    pub strict_near_plane: bool,
    /// Placeholder values for asset search paths
    pub path_vars: BTreeMap<String, String>,
}

impl LoaderConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn path_vars(&self) -> PathVars {
        self.path_vars.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = LoaderConfig::from_toml_str("").unwrap();
        assert_eq!(config, LoaderConfig::default());
        assert!(!config.strict_near_plane);
        assert!(config.engine_version.is_none());
    }

    #[test]
    fn full_config() {
        let config = LoaderConfig::from_toml_str(
            r#"
            engine_version = "1.2"
            strict_near_plane = true

            [path_vars]
            PROJECT_SRC = "/src"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine_version, Some(Version::new(1, 2, 0)));
        assert!(config.strict_near_plane);
        assert_eq!(config.path_vars().get("PROJECT_SRC"), Some("/src"));
    }

    #[test]
    fn bad_config_is_rejected() {
        assert!(matches!(
            LoaderConfig::from_toml_str("engine_version = \"one\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            LoaderConfig::from_toml_str("strict = true"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            LoaderConfig::from_file("/definitely/not/here.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
