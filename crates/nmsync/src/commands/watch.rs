//! Stream change notifications while a capture replays.

use tracing::debug;

use nmsync_core::{Engine, ObjectPath, SubscriptionFilter};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::util;

fn filter_for(args: &WatchArgs) -> SubscriptionFilter {
    let mut parts: Vec<SubscriptionFilter> = args
        .kind
        .iter()
        .copied()
        .map(SubscriptionFilter::Kind)
        .collect();
    parts.extend(
        args.path
            .iter()
            .map(|p| SubscriptionFilter::Path(ObjectPath::new(p))),
    );

    match parts.len() {
        0 => SubscriptionFilter::All,
        1 => parts.remove(0),
        _ => SubscriptionFilter::AnyOf(parts),
    }
}

pub async fn handle(args: &WatchArgs, settings: &Settings, global: &GlobalOpts) -> Result<(), CliError> {
    let session = util::open_capture(settings, global)?;
    let engine = Engine::new(settings.config.to_engine_config());

    // Subscribe first so the initial enumeration is observed too.
    let mut sub = engine.subscribe(filter_for(args));
    debug!(id = %sub.id(), "subscribed");

    let driver = {
        let engine = engine.clone();
        tokio::spawn(async move {
            let mut states = engine.state_changes();
            let result = match engine.attach(session).await {
                Ok(_) => util::wait_until_settled(&mut states).await,
                Err(e) => Err(CliError::from(e)),
            };
            // Closing the engine ends the subscription stream either way.
            engine.shutdown().await;
            result
        })
    };

    let color = output::should_color(settings.color);
    while let Some(note) = sub.recv().await {
        let line = output::render_notification(settings.output, &note, color)?;
        output::print_output(&line, settings.quiet);
    }

    driver.await.map_err(|e| CliError::Engine {
        message: format!("replay task failed: {e}"),
    })??;

    if sub.was_overflowed() {
        return Err(CliError::Overflowed {
            capacity: engine.config().subscriber_queue_capacity,
        });
    }
    Ok(())
}
