// ── Engine tuning ──
//
// Plain runtime knobs. The engine never reads files or environment;
// `nmsync-config` (or an embedding application) builds an `EngineConfig`
// and hands it in.

use serde::{Deserialize, Serialize};

/// Tuning for one [`Engine`](crate::Engine) instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Undelivered notifications a subscriber may queue before it is dropped.
    pub subscriber_queue_capacity: usize,
    /// Ingestion warnings kept for [`Engine::diagnostics`](crate::Engine::diagnostics).
    pub diagnostics_capacity: usize,
    /// Consecutive consistency violations one path may cause before the engine halts.
    pub consistency_retry_limit: u32,
    /// Buffer of the engine-level notice broadcast.
    pub notice_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            subscriber_queue_capacity: 256,
            diagnostics_capacity: 512,
            consistency_retry_limit: 3,
            notice_channel_capacity: 64,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn partial_input_keeps_defaults() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{ "subscriber_queue_capacity": 8 }"#).unwrap();
        assert_eq!(cfg.subscriber_queue_capacity, 8);
        assert_eq!(cfg.diagnostics_capacity, 512);
        assert_eq!(cfg.consistency_retry_limit, 3);
    }
}
