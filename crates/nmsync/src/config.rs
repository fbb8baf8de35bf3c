//! CLI configuration: thin wrapper around `nmsync_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--config, --capture, --output, --color, --log-format).

use std::path::PathBuf;

use clap::ValueEnum;

use crate::cli::{ColorMode, GlobalOpts, LogFormat, OutputFormat};
use crate::error::CliError;

pub use nmsync_config::{Config, config_path, load_config_from, save_config_to};

/// Flags merged over the loaded config file.
#[derive(Debug)]
pub struct Settings {
    pub config: Config,
    pub config_path: PathBuf,
    pub output: OutputFormat,
    pub color: ColorMode,
    pub quiet: bool,
}

/// The config file in effect: `--config` / `NMSYNC_CONFIG`, else the platform default.
pub fn active_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the config file and apply flag overrides.
pub fn resolve(global: &GlobalOpts) -> Result<Settings, CliError> {
    let config_path = active_config_path(global);
    let config = load_config_from(&config_path)?;

    let output = match global.output {
        Some(format) => format,
        None => parse_output(&config.defaults.output)?,
    };
    let color = match global.color {
        Some(mode) => mode,
        None => parse_color(&config.defaults.color)?,
    };

    Ok(Settings {
        config,
        config_path,
        output,
        color,
        quiet: global.quiet,
    })
}

impl Settings {
    /// Capture path: flag > env > config file.
    pub fn capture(&self, global: &GlobalOpts) -> Result<PathBuf, CliError> {
        global
            .capture
            .clone()
            .or_else(|| self.config.capture.clone())
            .ok_or_else(|| CliError::NoCapture {
                config_path: self.config_path.display().to_string(),
            })
    }
}

/// Log format from the flag, else the config file's `[logging]` section.
pub fn log_format(global: &GlobalOpts, config: Option<&Config>) -> LogFormat {
    global.log_format.unwrap_or_else(|| match config {
        Some(cfg) if cfg.logging.format == "json" => LogFormat::Json,
        _ => LogFormat::Text,
    })
}

fn parse_output(raw: &str) -> Result<OutputFormat, CliError> {
    OutputFormat::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: "defaults.output".into(),
        reason,
    })
}

fn parse_color(raw: &str) -> Result<ColorMode, CliError> {
    ColorMode::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: "defaults.color".into(),
        reason,
    })
}
