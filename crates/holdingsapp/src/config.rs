//! # Configuration
//!
//! Holdings configuration is loaded with [`confique`], layering environment
//! variables over an optional TOML file over compiled defaults.
//!
//! ## Available Settings
//!
//! | Key | Env | Default | Description |
//! |-----|-----|---------|-------------|
//! | `data_dir` | `HOLDINGS_DATA_DIR` | OS data dir | Where the store keeps its files |
//! | `platform` | `HOLDINGS_PLATFORM` | detected | `native` (flat store) or `browser` (structured store) |
//! | `database_name` | `HOLDINGS_DATABASE` | `holdings` | Name of the structured database |
//! | `seed_sample_data` | `HOLDINGS_SEED` | `true` | Seed sample items into an empty collection |
//!
//! The default config file is `holdings.toml` in the OS config directory
//! (via the `directories` crate); a missing file is not an error.

use crate::error::{Result, StorageError};
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_FILE_NAME: &str = "holdings.toml";

/// The storage family available on the running platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Platform {
    /// Flat key-value storage.
    Native,
    /// Structured object-store database.
    Browser,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn detect() -> Self {
        if cfg!(target_arch = "wasm32") {
            Platform::Browser
        } else {
            Platform::Native
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Native => write!(f, "native"),
            Platform::Browser => write!(f, "browser"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(Platform::Native),
            "browser" | "web" => Ok(Platform::Browser),
            other => Err(format!(
                "unknown platform '{}', expected 'native' or 'browser'",
                other
            )),
        }
    }
}

impl TryFrom<String> for Platform {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// Configuration for holdings, stored in `holdings.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HoldingsConfig {
    /// Directory the store lives in. Defaults to the OS data directory.
    #[config(env = "HOLDINGS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Force a storage family instead of detecting it.
    #[config(env = "HOLDINGS_PLATFORM")]
    pub platform: Option<Platform>,

    /// Name of the structured database.
    #[config(env = "HOLDINGS_DATABASE", default = "holdings")]
    pub database_name: String,

    /// Seed sample items when the collection is empty on first load.
    #[config(env = "HOLDINGS_SEED", default = true)]
    pub seed_sample_data: bool,
}

impl Default for HoldingsConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            platform: None,
            database_name: "holdings".to_string(),
            seed_sample_data: true,
        }
    }
}

impl HoldingsConfig {
    /// Load from the environment, then `file` (or the default config file),
    /// then defaults.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        match file {
            Some(path) => builder = builder.file(path),
            None => {
                if let Some(path) = default_config_path() {
                    builder = builder.file(path);
                }
            }
        }
        Ok(builder.load()?)
    }

    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::detect)
    }

    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| StorageError::Config("could not determine a data directory".to_string()))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "holdings")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HoldingsConfig::default();
        assert_eq!(config.database_name, "holdings");
        assert!(config.seed_sample_data);
        assert_eq!(config.platform(), Platform::detect());
    }

    #[test]
    fn test_platform_parsing() {
        assert_eq!("native".parse::<Platform>().unwrap(), Platform::Native);
        assert_eq!(" Browser ".parse::<Platform>().unwrap(), Platform::Browser);
        assert_eq!("web".parse::<Platform>().unwrap(), Platform::Browser);
        assert!("ios".parse::<Platform>().is_err());
    }

    #[test]
    fn test_platform_serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Platform::Browser).unwrap(), "\"browser\"");
        let platform: Platform = serde_json::from_str("\"native\"").unwrap();
        assert_eq!(platform, Platform::Native);
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        let config = HoldingsConfig {
            data_dir: Some(PathBuf::from("/tmp/holdings-test")),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_data_dir().unwrap(),
            PathBuf::from("/tmp/holdings-test")
        );
    }

    #[test]
    fn test_load_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "platform = \"browser\"\ndatabase_name = \"attic\"\nseed_sample_data = false\n",
        )
        .unwrap();

        let config = HoldingsConfig::load(Some(&path)).unwrap();
        assert_eq!(config.database_name, "attic");
        assert!(!config.seed_sample_data);
        assert_eq!(config.platform(), Platform::Browser);
    }
}
