//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use nmsync_config::ConfigError;
use nmsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const DATA_MODEL: i32 = 5;
    pub const CAPTURE: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Capture ──────────────────────────────────────────────────────
    #[error("No capture file given")]
    #[diagnostic(
        code(nmsync::no_capture),
        help(
            "Pass one with --capture <FILE>, set NMSYNC_CAPTURE,\n\
             or add `capture = \"...\"` to {config_path}"
        )
    )]
    NoCapture { config_path: String },

    #[error("Could not read capture {path}")]
    #[diagnostic(
        code(nmsync::capture),
        help("A capture is JSON lines, one change event per line.")
    )]
    Capture {
        path: String,
        #[source]
        source: nmsync_bus::Error,
    },

    // ── Graph ────────────────────────────────────────────────────────
    #[error("Object '{path}' not found")]
    #[diagnostic(
        code(nmsync::not_found),
        help("Run: nmsync snapshot to see every known path")
    )]
    NotFound { path: String },

    #[error("Data model broken at {path}")]
    #[diagnostic(
        code(nmsync::data_model_broken),
        help(
            "The capture keeps registering {path} as different object kinds.\n\
             Run: nmsync diagnostics to see the rejected events."
        )
    )]
    DataModelBroken { path: String },

    #[error("Watch fell behind and dropped notifications")]
    #[diagnostic(
        code(nmsync::overflowed),
        help(
            "The subscriber queue holds {capacity} notifications.\n\
             Raise engine.subscriber_queue_capacity in the config file."
        )
    )]
    Overflowed { capacity: usize },

    #[error("Engine error: {message}")]
    #[diagnostic(code(nmsync::engine))]
    Engine { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(nmsync::validation))]
    Validation { field: String, reason: String },

    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(nmsync::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(nmsync::config))]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(nmsync::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::DataModelBroken { .. } => exit_code::DATA_MODEL,
            Self::NoCapture { .. } | Self::Capture { .. } => exit_code::CAPTURE,
            Self::Validation { .. } | Self::ConfigExists { .. } | Self::Config(_) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { path } => CliError::NotFound {
                path: path.to_string(),
            },
            CoreError::DataModelBroken { path } => CliError::DataModelBroken {
                path: path.to_string(),
            },
            other => CliError::Engine {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmsync_core::ObjectPath;

    #[test]
    fn core_errors_keep_their_exit_codes() {
        let missing: CliError = CoreError::NotFound {
            path: ObjectPath::new("/dev/4"),
        }
        .into();
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);

        let broken: CliError = CoreError::DataModelBroken {
            path: ObjectPath::new("/x"),
        }
        .into();
        assert_eq!(broken.exit_code(), exit_code::DATA_MODEL);

        let closed: CliError = CoreError::EngineClosed.into();
        assert_eq!(closed.exit_code(), exit_code::GENERAL);
    }
}
