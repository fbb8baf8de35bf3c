//! Command dispatch: routes parsed CLI commands to their handlers.

pub mod config_cmd;
mod diagnostics;
mod graph;
pub mod util;
mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::config::Settings;
use crate::error::CliError;

/// Run a query command against a fully replayed capture.
pub async fn dispatch(cmd: &Command, settings: &Settings, global: &GlobalOpts) -> Result<(), CliError> {
    if let Command::Watch(args) = cmd {
        return watch::handle(args, settings, global).await;
    }

    let engine = util::replay(settings, global).await?;
    let result = match cmd {
        Command::Snapshot(args) => graph::snapshot(&engine, args, settings),
        Command::Get(args) => graph::get(&engine, args, settings),
        Command::Devices => graph::devices(&engine, settings),
        Command::AccessPoints(args) => graph::access_points(&engine, args, settings),
        Command::Diagnostics => diagnostics::handle(&engine, settings),
        // Handled before settings are resolved.
        Command::Watch(_) | Command::Config(_) | Command::Completions(_) => Ok(()),
    };
    engine.shutdown().await;
    result
}
