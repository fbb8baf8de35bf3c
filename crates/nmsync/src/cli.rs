//! Clap derive structures for the `nmsync` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use nmsync_core::ObjectKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// nmsync -- inspect a mirrored network-management object graph
#[derive(Debug, Parser)]
#[command(
    name = "nmsync",
    version,
    about = "Mirror and inspect a network-management object graph",
    long_about = "Replays a captured change-event stream through the nmsync engine\n\
        and queries the resulting graph: devices, access points, active\n\
        connections and their IP configuration.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// JSON-lines event capture to replay
    #[arg(long, short = 'f', env = "NMSYNC_CAPTURE", global = true)]
    pub capture: Option<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "NMSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', env = "NMSYNC_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Colorize watch output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format on stderr
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Print nothing but errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Rounded table for terminals
    Table,
    /// Pretty-printed JSON
    Json,
    /// JSON on one line
    JsonCompact,
    /// YAML
    Yaml,
    /// Object paths only, one per line
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Color when stdout is a terminal
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every entity in the final graph
    #[command(alias = "snap", alias = "s")]
    Snapshot(SnapshotArgs),

    /// Show one entity, optionally with everything it references
    Get(GetArgs),

    /// List devices with their state and active connection
    #[command(alias = "dev", alias = "d")]
    Devices,

    /// List access points with signal and staleness
    #[command(alias = "ap")]
    AccessPoints(AccessPointsArgs),

    /// Stream change notifications while the capture replays
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Show warnings recorded while ingesting the capture
    #[command(alias = "diag")]
    Diagnostics,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Query commands ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Only entities of this kind (e.g. device, accesspoint)
    #[arg(long, short = 'k')]
    pub kind: Option<ObjectKind>,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Object path, e.g. /org/freedesktop/NetworkManager/Devices/1
    pub path: String,

    /// Follow references this many hops
    #[arg(long, short = 'd', default_value = "0")]
    pub depth: usize,
}

#[derive(Debug, Args)]
pub struct AccessPointsArgs {
    /// Boot-clock seconds used to compute last-seen age
    #[arg(long)]
    pub now: Option<i64>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Only notifications for this kind
    #[arg(long, short = 'k')]
    pub kind: Vec<ObjectKind>,

    /// Only notifications for this path
    #[arg(long, short = 'p')]
    pub path: Vec<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration as TOML
    Show,

    /// Print the config file path
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
