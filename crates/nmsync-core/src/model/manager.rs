// ── Global manager state ──

use serde::{Deserialize, Serialize};

use super::flags::coded_enum;
use nmsync_bus::ObjectPath;

coded_enum! {
    /// Aggregate networking state of the remote service.
    pub enum NmState {
        Unknown = 0,
        Asleep = 10,
        Disconnected = 20,
        Disconnecting = 30,
        Connecting = 40,
        ConnectedLocal = 50,
        ConnectedSite = 60,
        ConnectedGlobal = 70,
    }
}

impl NmState {
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            Self::ConnectedLocal | Self::ConnectedSite | Self::ConnectedGlobal
        )
    }
}

coded_enum! {
    /// Result of a connectivity check.
    pub enum ConnectivityState {
        Unknown = 0,
        None = 1,
        Portal = 2,
        Limited = 3,
        Full = 4,
    }
}

coded_enum! {
    /// Whether traffic is subject to provider limits.
    pub enum Metered {
        Unknown = 0,
        Yes = 1,
        No = 2,
        GuessYes = 3,
        GuessNo = 4,
    }
}

impl Metered {
    pub fn is_metered(self) -> bool {
        matches!(self, Self::Yes | Self::GuessYes)
    }
}

/// The manager singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Manager {
    pub path: ObjectPath,
    pub version: Option<String>,
    pub state: NmState,
    pub connectivity: ConnectivityState,
    pub metered: Metered,
    pub startup: bool,

    pub networking_enabled: bool,
    pub wireless_enabled: bool,
    pub wireless_hardware_enabled: bool,
    pub wwan_enabled: bool,
    pub wwan_hardware_enabled: bool,

    pub connectivity_check_available: bool,
    pub connectivity_check_enabled: bool,
    pub connectivity_check_uri: Option<String>,

    pub devices: Vec<ObjectPath>,
    pub all_devices: Vec<ObjectPath>,
    pub active_connections: Vec<ObjectPath>,
    pub primary_connection: Option<ObjectPath>,
    pub primary_connection_type: Option<String>,
    pub activating_connection: Option<ObjectPath>,
    /// Sorted capability numbers.
    pub capabilities: Vec<u32>,
}

impl Manager {
    pub fn new(path: ObjectPath) -> Self {
        Self {
            path,
            version: None,
            state: NmState::Unknown,
            connectivity: ConnectivityState::Unknown,
            metered: Metered::Unknown,
            startup: false,
            networking_enabled: false,
            wireless_enabled: false,
            wireless_hardware_enabled: false,
            wwan_enabled: false,
            wwan_hardware_enabled: false,
            connectivity_check_available: false,
            connectivity_check_enabled: false,
            connectivity_check_uri: None,
            devices: Vec::new(),
            all_devices: Vec::new(),
            active_connections: Vec::new(),
            primary_connection: None,
            primary_connection_type: None,
            activating_connection: None,
            capabilities: Vec::new(),
        }
    }
}
