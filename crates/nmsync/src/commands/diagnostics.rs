//! Ingestion diagnostics handler.

use tabled::Tabled;

use nmsync_core::{DiagnosticRecord, Engine};

use crate::config::Settings;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct DiagnosticRow {
    #[tabled(rename = "Gen")]
    generation: u64,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Recorded")]
    recorded: String,
}

impl DiagnosticRow {
    fn new(r: &DiagnosticRecord) -> Self {
        Self {
            generation: r.generation,
            kind: r.warning.label().into(),
            path: r
                .warning
                .path()
                .map_or_else(|| "-".into(), ToString::to_string),
            message: r.warning.to_string(),
            recorded: r.recorded_at.format("%H:%M:%S%.3f").to_string(),
        }
    }
}

pub fn handle(engine: &Engine, settings: &Settings) -> Result<(), CliError> {
    let records = engine.diagnostics();
    let out = output::render_list(
        settings.output,
        &records,
        DiagnosticRow::new,
        |r| format!("{} {}", r.warning.label(), r.warning),
    )?;
    output::print_output(&out, settings.quiet);
    Ok(())
}
