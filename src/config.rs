//! Configuration: record-kind registry and logging defaults
//!
//! Read from `spice-marshal.toml`. Every field has a default, so an empty
//! file (or no file at all) yields the standard `spice` registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for by `Config::discover`
pub const CONFIG_FILE: &str = "spice-marshal.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the managed record kinds live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Module holding the record kinds
    #[serde(default = "default_module")]
    pub module: String,

    #[serde(default = "default_cell")]
    pub cell: String,

    #[serde(default = "default_plane")]
    pub plane: String,

    #[serde(default = "default_ellipse")]
    pub ellipse: String,

    #[serde(default = "default_ek_att_dsc")]
    pub ek_att_dsc: String,

    #[serde(default = "default_ek_seg_sum")]
    pub ek_seg_sum: String,

    /// Keyword carrying the character slot length to the Cell constructor
    #[serde(default = "default_length_keyword")]
    pub length_keyword: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub file: Option<PathBuf>,

    #[serde(default)]
    pub json: bool,

    #[serde(default)]
    pub spans: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            module: default_module(),
            cell: default_cell(),
            plane: default_plane(),
            ellipse: default_ellipse(),
            ek_att_dsc: default_ek_att_dsc(),
            ek_seg_sum: default_ek_seg_sum(),
            length_keyword: default_length_keyword(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
            json: false,
            spans: false,
        }
    }
}

fn default_module() -> String { "spice".to_string() }
fn default_cell() -> String { "Cell".to_string() }
fn default_plane() -> String { "Plane".to_string() }
fn default_ellipse() -> String { "Ellipse".to_string() }
fn default_ek_att_dsc() -> String { "EkAttDsc".to_string() }
fn default_ek_seg_sum() -> String { "EkSegSum".to_string() }
fn default_length_keyword() -> String { "lenArg".to_string() }
fn default_level() -> String { "warn".to_string() }

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Failed to read config {}: {}", path.display(), source)
            }
            Self::Parse(err) => write!(f, "Failed to parse config: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Find and load configuration file from current directory or parents
    pub fn discover() -> Self {
        std::env::current_dir()
            .map(|dir| Self::discover_from(&dir))
            .unwrap_or_default()
    }

    /// Search `start` and its parents for `spice-marshal.toml`
    ///
    /// An unreadable or malformed file is skipped and the search continues
    /// upward; defaults apply when nothing loads.
    pub fn discover_from(start: &Path) -> Self {
        let mut current = Some(start);

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                match Self::load(&config_path) {
                    Ok(config) => return config,
                    Err(err) => tracing::warn!(path = %config_path.display(), error = %err, "Ignoring config"),
                }
            }
            current = dir.parent();
        }

        Self::default()
    }
}
