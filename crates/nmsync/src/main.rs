mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, LogFormat};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // A broken config file is reported by `run`; logging falls back to defaults.
    let file_config = config::load_config_from(&config::active_config_path(&cli.global)).ok();
    init_tracing(
        cli.global.verbose,
        config::log_format(&cli.global, file_config.as_ref()),
        file_config.as_ref().map(|c| c.logging.level.as_str()),
    );

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// `RUST_LOG` wins, then `-v` flags, then the config file's level.
fn init_tracing(verbosity: u8, format: LogFormat, configured: Option<&str>) {
    let filter = match verbosity {
        0 => configured.unwrap_or("warn"),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands work without a capture
        Command::Config(ref args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(ref args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "nmsync", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let settings = config::resolve(&cli.global)?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(&cmd, &settings, &cli.global).await
        }
    }
}
