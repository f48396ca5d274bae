//! Runtime configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Describe where the database, assets and logs live.
//! - Layer built-in defaults, an optional TOML file and `KABAN_` environment
//!   overrides, in that order.
//!
//! # Invariants
//! - Environment keys use `__` between sections: `KABAN_DATABASE__PATH`.
//! - A loaded configuration always has a non-empty database path and a
//!   supported log level.

use crate::logging::LogLevel;
use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "KABAN";
const DEFAULT_DATABASE_PATH: &str = "kaban.db";
const DEFAULT_ASSETS_ROOT: &str = "assets";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetSettings {
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogSettings {
    pub level: String,
    /// Log directory. File logging stays off when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KabanConfig {
    pub database: DatabaseSettings,
    pub assets: AssetSettings,
    pub logging: LogSettings,
}

impl Default for KabanConfig {
    fn default() -> Self {
        Self {
            database: DatabaseSettings {
                path: PathBuf::from(DEFAULT_DATABASE_PATH),
            },
            assets: AssetSettings {
                root: PathBuf::from(DEFAULT_ASSETS_ROOT),
            },
            logging: LogSettings {
                level: LogLevel::for_build().as_str().to_string(),
                dir: None,
            },
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    Source(::config::ConfigError),
    /// Values were read but are not usable.
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(err) => write!(f, "failed to load configuration: {err}"),
            Self::Invalid(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<::config::ConfigError> for ConfigError {
    fn from(value: ::config::ConfigError) -> Self {
        Self::Source(value)
    }
}

impl KabanConfig {
    /// Loads defaults, then `file` (required when given), then environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = with_defaults()?;
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        config.try_deserialize::<Self>()?.validated()
    }

    /// Parses a TOML document layered over the defaults. Ignores environment.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config = with_defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        config.try_deserialize::<Self>()?.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "database.path cannot be empty".to_string(),
            ));
        }
        if LogLevel::parse(&self.logging.level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "unsupported logging.level `{}`",
                self.logging.level
            )));
        }
        Ok(self)
    }
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ::config::ConfigError> {
    Config::builder()
        .set_default("database.path", DEFAULT_DATABASE_PATH)?
        .set_default("assets.root", DEFAULT_ASSETS_ROOT)?
        .set_default("logging.level", LogLevel::for_build().as_str())
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, KabanConfig};
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn empty_document_yields_defaults() {
        let config = KabanConfig::from_toml_str("").expect("defaults should load");
        assert_eq!(config, KabanConfig::default());
    }

    #[test]
    fn toml_overrides_single_keys() {
        let config = KabanConfig::from_toml_str(
            r#"
            [database]
            path = "/var/lib/kaban/board.db"

            [logging]
            level = "warn"
            dir = "/var/log/kaban"
            "#,
        )
        .expect("toml should load");

        assert_eq!(config.database.path, PathBuf::from("/var/lib/kaban/board.db"));
        assert_eq!(config.assets.root, PathBuf::from("assets"));
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.dir, Some(PathBuf::from("/var/log/kaban")));
    }

    #[test]
    fn unsupported_level_is_rejected() {
        let err = KabanConfig::from_toml_str("[logging]\nlevel = \"loud\"\n")
            .expect_err("unknown level must fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_layers_file_then_environment() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp config");
        writeln!(file, "[assets]\nroot = \"/srv/kaban/assets\"").expect("write config");
        std::env::set_var("KABAN_DATABASE__PATH", "/tmp/kaban-env.db");

        let config = KabanConfig::load(Some(file.path())).expect("config should load");
        std::env::remove_var("KABAN_DATABASE__PATH");

        assert_eq!(config.assets.root, PathBuf::from("/srv/kaban/assets"));
        assert_eq!(config.database.path, PathBuf::from("/tmp/kaban-env.db"));
    }
}
