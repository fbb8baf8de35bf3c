//! Shared configuration for nmsync tools.
//!
//! A TOML file in the platform config directory, overlaid with `NMSYNC_*`
//! environment variables, translated into `nmsync_core::EngineConfig`.
//! Nested keys use a double underscore in the environment:
//! `NMSYNC_ENGINE__SUBSCRIBER_QUEUE_CAPACITY=1024`.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use nmsync_core::EngineConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Capture file used when a command is given none.
    pub capture: Option<PathBuf>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: Logging,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Logging {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// `text` or `json`.
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_level() -> String {
    "warn".into()
}
fn default_format() -> String {
    "text".into()
}

// ── Config file path ────────────────────────────────────────────────

/// `config.toml` in the platform config directory, or under `$HOME/.config/nmsync`.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("tech", "nmsync", "nmsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("nmsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults, then the TOML file at `path`, then `NMSYNC_*` variables.
/// A missing file contributes nothing.
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NMSYNC_").split("__"))
}

/// Load and validate the config from the canonical path.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load and validate the config from an explicit path.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.engine.subscriber_queue_capacity == 0 {
        return Err(ConfigError::Validation {
            field: "engine.subscriber_queue_capacity".into(),
            reason: "must be at least 1".into(),
        });
    }
    if config.engine.consistency_retry_limit == 0 {
        return Err(ConfigError::Validation {
            field: "engine.consistency_retry_limit".into(),
            reason: "must be at least 1".into(),
        });
    }
    if !matches!(config.logging.format.as_str(), "text" | "json") {
        return Err(ConfigError::Validation {
            field: "logging.format".into(),
            reason: format!("expected 'text' or 'json', got '{}'", config.logging.format),
        });
    }
    Ok(())
}

impl Config {
    /// The engine tuning this config describes.
    pub fn to_engine_config(&self) -> EngineConfig {
        self.engine.clone()
    }
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML at `path`, creating parent directories.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
