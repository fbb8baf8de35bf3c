//! Shared helpers for command handlers.

use nmsync_bus::ReplaySession;
use nmsync_core::{Engine, EngineState};
use tracing::{debug, warn};

use crate::cli::GlobalOpts;
use crate::config::Settings;
use crate::error::CliError;

/// Open the capture named by flags or config.
pub fn open_capture(settings: &Settings, global: &GlobalOpts) -> Result<ReplaySession, CliError> {
    let path = settings.capture(global)?;
    debug!(path = %path.display(), "opening capture");
    ReplaySession::open(&path).map_err(|source| CliError::Capture {
        path: path.display().to_string(),
        source,
    })
}

/// Replay the whole capture and return the engine holding the final graph.
pub async fn replay(settings: &Settings, global: &GlobalOpts) -> Result<Engine, CliError> {
    let session = open_capture(settings, global)?;
    let engine = Engine::new(settings.config.to_engine_config());
    let mut states = engine.state_changes();

    engine.attach(session).await?;
    wait_until_settled(&mut states).await?;

    if engine.state() == EngineState::Failed {
        warn!("ingestion stopped before the end of the capture; see `nmsync diagnostics`");
    }
    Ok(engine)
}

/// Wait until the session has ended or ingestion has halted.
pub async fn wait_until_settled(
    states: &mut tokio::sync::watch::Receiver<EngineState>,
) -> Result<(), CliError> {
    states
        .wait_for(|s| matches!(s, EngineState::SessionEnded | EngineState::Failed | EngineState::Closed))
        .await
        .map(drop)
        .map_err(|_| CliError::Engine {
            message: "engine stopped before the capture was replayed".into(),
        })
}

/// `-` for absent values in table cells.
pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_owned()
}
