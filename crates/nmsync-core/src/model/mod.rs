// ── Mirrored object model ──
//
// Typed, locally-owned copies of the remote objects. Every cross-object
// link is an `ObjectPath` resolved against a snapshot at read time, so a
// reference to a removed object reads as absent.

pub mod access_point;
pub mod active_connection;
pub mod device;
pub mod flags;
pub mod ip_config;
pub mod manager;
pub mod settings;

use std::sync::Arc;

use serde::Serialize;

use nmsync_bus::{ObjectKind, ObjectPath};

// ── Re-exports ──────────────────────────────────────────────────────

pub use access_point::{AccessPoint, ApFlag, ApSecurityFlag};
pub use active_connection::{
    ActivationStateFlag, ActiveConnection, ActiveConnectionState, ActiveConnectionStateReason,
};
pub use device::{
    ConfigRefs, Device, DeviceCapability, DeviceState, DeviceStateReason, DeviceType,
    WifiCapability, WifiMode, WiredInfo, WirelessInfo,
};
pub use flags::{Flag, FlagSet};
pub use ip_config::{
    AddressData, Dhcp4Config, Dhcp6Config, DhcpOptions, Ip4Config, Ip6Config, IpConfigData,
    RouteData,
};
pub use manager::{ConnectivityState, Manager, Metered, NmState};
pub use settings::Settings;

/// Any mirrored object, shared with the snapshot that holds it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "object")]
pub enum Entity {
    Manager(Arc<Manager>),
    Settings(Arc<Settings>),
    Device(Arc<Device>),
    AccessPoint(Arc<AccessPoint>),
    ActiveConnection(Arc<ActiveConnection>),
    Ip4Config(Arc<Ip4Config>),
    Ip6Config(Arc<Ip6Config>),
    Dhcp4Config(Arc<Dhcp4Config>),
    Dhcp6Config(Arc<Dhcp6Config>),
}

impl Entity {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Manager(_) => ObjectKind::Manager,
            Self::Settings(_) => ObjectKind::Settings,
            Self::Device(_) => ObjectKind::Device,
            Self::AccessPoint(_) => ObjectKind::AccessPoint,
            Self::ActiveConnection(_) => ObjectKind::ActiveConnection,
            Self::Ip4Config(_) => ObjectKind::Ip4Config,
            Self::Ip6Config(_) => ObjectKind::Ip6Config,
            Self::Dhcp4Config(_) => ObjectKind::Dhcp4Config,
            Self::Dhcp6Config(_) => ObjectKind::Dhcp6Config,
        }
    }

    pub fn path(&self) -> &ObjectPath {
        match self {
            Self::Manager(e) => &e.path,
            Self::Settings(e) => &e.path,
            Self::Device(e) => &e.path,
            Self::AccessPoint(e) => &e.path,
            Self::ActiveConnection(e) => &e.path,
            Self::Ip4Config(e) => &e.path,
            Self::Ip6Config(e) => &e.path,
            Self::Dhcp4Config(e) => &e.path,
            Self::Dhcp6Config(e) => &e.path,
        }
    }

    /// Outgoing path references, in a stable order. Dangling ones included.
    pub fn references(&self) -> Vec<ObjectPath> {
        match self {
            Self::Manager(m) => m
                .devices
                .iter()
                .chain(&m.all_devices)
                .chain(&m.active_connections)
                .chain(&m.primary_connection)
                .chain(&m.activating_connection)
                .cloned()
                .collect(),
            Self::Device(d) => {
                let mut refs: Vec<ObjectPath> = d.active_connection.iter().cloned().collect();
                refs.extend(d.configs.iter().cloned());
                if let Some(wireless) = &d.wireless {
                    refs.extend(wireless.active_access_point.iter().cloned());
                    refs.extend(wireless.access_points.iter().cloned());
                }
                refs
            }
            Self::ActiveConnection(ac) => ac
                .devices
                .iter()
                .chain(&ac.master)
                .chain(ac.configs.iter())
                .cloned()
                .collect(),
            Self::Settings(_)
            | Self::AccessPoint(_)
            | Self::Ip4Config(_)
            | Self::Ip6Config(_)
            | Self::Dhcp4Config(_)
            | Self::Dhcp6Config(_) => Vec::new(),
        }
    }

    pub fn as_device(&self) -> Option<&Arc<Device>> {
        match self {
            Self::Device(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_active_connection(&self) -> Option<&Arc<ActiveConnection>> {
        match self {
            Self::ActiveConnection(ac) => Some(ac),
            _ => None,
        }
    }

    pub fn as_access_point(&self) -> Option<&Arc<AccessPoint>> {
        match self {
            Self::AccessPoint(ap) => Some(ap),
            _ => None,
        }
    }
}
