// ── Connection profile settings singleton ──

use serde::{Deserialize, Serialize};

use nmsync_bus::ObjectPath;

/// The settings singleton: known connection profiles and host identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub path: ObjectPath,
    /// Connection-profile paths. Profiles themselves are not cached.
    pub connections: Vec<ObjectPath>,
    pub hostname: Option<String>,
    pub can_modify: bool,
}

impl Settings {
    pub fn new(path: ObjectPath) -> Self {
        Self {
            path,
            connections: Vec::new(),
            hostname: None,
            can_modify: false,
        }
    }
}
