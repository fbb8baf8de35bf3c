// ── Active connection domain types ──

use serde::{Deserialize, Serialize};

use super::device::ConfigRefs;
use super::flags::{FlagSet, bit_flags, coded_enum};
use nmsync_bus::ObjectPath;

coded_enum! {
    /// Activation lifecycle of a connection. `Deactivated` is terminal.
    pub enum ActiveConnectionState {
        Unknown = 0,
        Activating = 1,
        Activated = 2,
        Deactivating = 3,
        Deactivated = 4,
    }
}

impl ActiveConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Deactivated)
    }
}

coded_enum! {
    /// Why an active connection changed state.
    pub enum ActiveConnectionStateReason {
        Unknown = 0,
        None = 1,
        UserDisconnected = 2,
        DeviceDisconnected = 3,
        ServiceStopped = 4,
        IpConfigInvalid = 5,
        ConnectTimeout = 6,
        ServiceStartTimeout = 7,
        ServiceStartFailed = 8,
        NoSecrets = 9,
        LoginFailed = 10,
        ConnectionRemoved = 11,
        DependencyFailed = 12,
        DeviceRealizeFailed = 13,
        DeviceRemoved = 14,
    }
}

bit_flags! {
    /// Progress markers within an activation.
    pub enum ActivationStateFlag {
        IsMaster = 0x1,
        IsSlave = 0x2,
        Layer2Ready = 0x4,
        Ip4Ready = 0x8,
        Ip6Ready = 0x10,
        MasterHasSlaves = 0x20,
        LifetimeBoundToProfileVisibility = 0x40,
        External = 0x80,
    }
}

/// A connection profile currently applied to one or more devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveConnection {
    pub path: ObjectPath,
    /// Backing connection profile.
    pub connection: Option<ObjectPath>,
    pub specific_object: Option<ObjectPath>,
    pub id: Option<String>,
    pub uuid: Option<String>,
    pub connection_type: Option<String>,
    pub devices: Vec<ObjectPath>,

    pub state: ActiveConnectionState,
    pub state_flags: FlagSet<ActivationStateFlag>,
    /// Raw reason code; see [`ActiveConnectionStateReason`].
    pub state_reason: u32,

    pub default: bool,
    pub default6: bool,
    pub vpn: bool,
    /// For VPNs this may name another active connection rather than a device.
    pub master: Option<ObjectPath>,

    /// Published config references; always empty unless ACTIVATED.
    pub configs: ConfigRefs,

    #[serde(skip)]
    pub(crate) announced: ConfigRefs,
}

impl ActiveConnection {
    pub fn new(path: ObjectPath) -> Self {
        Self {
            path,
            connection: None,
            specific_object: None,
            id: None,
            uuid: None,
            connection_type: None,
            devices: Vec::new(),
            state: ActiveConnectionState::Unknown,
            state_flags: FlagSet::empty(),
            state_reason: 0,
            default: false,
            default6: false,
            vpn: false,
            master: None,
            configs: ConfigRefs::default(),
            announced: ConfigRefs::default(),
        }
    }

    pub fn reason(&self) -> Option<ActiveConnectionStateReason> {
        ActiveConnectionStateReason::from_code(self.state_reason)
    }

    pub fn display_name(&self) -> &str {
        self.id.as_deref().unwrap_or(self.path.as_str())
    }
}
