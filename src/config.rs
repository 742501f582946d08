//! Runtime configuration, read from a TOML file.
//!
//! Every key is optional; a missing section falls back to its defaults.
//!
//! ```toml
//! [general]
//! debug = false
//!
//! [repl]
//! prompt = ">>> "
//! infile = "stdin"
//!
//! [schema]
//! path = "etc/schema.yaml"
//!
//! [data]
//! driver = "memory"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::storage::DriverKind;

pub const DEFAULT_CONFIG_PATH: &str = "etc/config.toml";
pub const DEFAULT_SCHEMA_PATH: &str = "etc/schema.yaml";
pub const DEFAULT_PROMPT: &str = ">>> ";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub repl: ReplConfig,
    pub schema: SchemaConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Raises the default log level to `debug`.
    pub debug: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    pub prompt: String,
    /// Printed once before the first prompt.
    pub banner: Option<String>,
    pub infile: InputSource,
    /// Interactive line history, kept across sessions when set.
    pub history_file: Option<PathBuf>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            banner: None,
            infile: InputSource::Stdin,
            history_file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub path: PathBuf,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SCHEMA_PATH),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub driver: DriverKind,
}

/// Where statements are read from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum InputSource {
    #[default]
    Stdin,
    File(PathBuf),
}

impl From<String> for InputSource {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("stdin") || value == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(value))
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("stdin"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads `path`. When `required` is false a missing file yields the
    /// defaults instead of an error.
    pub fn load(path: impl AsRef<Path>, required: bool) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(source) => {
                let config = Self::from_toml_str(&source)?;
                info!(path = %path.display(), "loaded config");
                Ok(config)
            }
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
