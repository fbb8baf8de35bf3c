// ── Remote identity types ──
//
// ObjectPath and ObjectKind are the foundation of every cached entity.
// A path is an opaque handle: the engine compares and hashes it, never
// parses it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

// ── ObjectPath ──────────────────────────────────────────────────────

/// Opaque, stable identifier of a remote object.
///
/// Backed by `Arc<str>` so the many cross-entity references in a graph
/// clone without allocating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectPath(Arc<str>);

impl ObjectPath {
    /// The sentinel the remote service publishes for "no object".
    pub const NULL: &'static str = "/";

    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(Arc::from(raw.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the null sentinel (`"/"`) or empty.
    pub fn is_null(&self) -> bool {
        self.0.is_empty() || &*self.0 == Self::NULL
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for ObjectPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ObjectPath {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl AsRef<str> for ObjectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ── ObjectKind ──────────────────────────────────────────────────────

/// Every entity kind the engine mirrors. All kinds share one path namespace.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum ObjectKind {
    Manager,
    Settings,
    Device,
    AccessPoint,
    ActiveConnection,
    Ip4Config,
    Ip6Config,
    Dhcp4Config,
    Dhcp6Config,
}

impl ObjectKind {
    /// Kinds with exactly one instance per engine.
    pub fn is_singleton(self) -> bool {
        matches!(self, Self::Manager | Self::Settings)
    }

    /// Immutable-once-published value records, replaced wholesale on change.
    pub fn is_value_record(self) -> bool {
        matches!(
            self,
            Self::Ip4Config | Self::Ip6Config | Self::Dhcp4Config | Self::Dhcp6Config
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn null_sentinel_is_detected() {
        assert!(ObjectPath::new("/").is_null());
        assert!(ObjectPath::new("").is_null());
        assert!(!ObjectPath::new("/org/freedesktop/NetworkManager/Devices/1").is_null());
    }

    #[test]
    fn path_serializes_as_plain_string() {
        let path = ObjectPath::new("/dev/0");
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"/dev/0\"");
        let back: ObjectPath = serde_json::from_str("\"/dev/0\"").unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!(
            "accesspoint".parse::<ObjectKind>().unwrap(),
            ObjectKind::AccessPoint
        );
        assert_eq!("Device".parse::<ObjectKind>().unwrap(), ObjectKind::Device);
        assert!("router".parse::<ObjectKind>().is_err());
    }

    #[test]
    fn singleton_kinds() {
        assert!(ObjectKind::Manager.is_singleton());
        assert!(ObjectKind::Settings.is_singleton());
        assert!(!ObjectKind::Device.is_singleton());
    }
}
