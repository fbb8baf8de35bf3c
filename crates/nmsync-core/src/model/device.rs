// ── Device domain types ──

use serde::{Deserialize, Serialize};

use super::flags::{FlagSet, bit_flags, coded_enum};
use super::manager::{ConnectivityState, Metered};
use nmsync_bus::ObjectPath;

coded_enum! {
    /// Device lifecycle state, as reported by the remote service.
    pub enum DeviceState {
        Unknown = 0,
        Unmanaged = 10,
        Unavailable = 20,
        Disconnected = 30,
        Prepare = 40,
        Config = 50,
        NeedAuth = 60,
        IpConfig = 70,
        IpCheck = 80,
        Secondaries = 90,
        Activated = 100,
        Deactivating = 110,
        Failed = 120,
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::Unknown
    }
}

impl DeviceState {
    pub fn is_activated(self) -> bool {
        matches!(self, Self::Activated)
    }

    /// Somewhere between "asked to connect" and "connected".
    pub fn is_activating(self) -> bool {
        matches!(
            self,
            Self::Prepare
                | Self::Config
                | Self::NeedAuth
                | Self::IpConfig
                | Self::IpCheck
                | Self::Secondaries
        )
    }
}

/// Hardware type of a device. Unassigned codes are preserved in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DeviceType {
    #[default]
    Unknown,
    Ethernet,
    Wifi,
    Bt,
    OlpcMesh,
    Wimax,
    Modem,
    Infiniband,
    Bond,
    Vlan,
    Adsl,
    Bridge,
    Generic,
    Team,
    Tun,
    IpTunnel,
    Macvlan,
    Vxlan,
    Veth,
    Macsec,
    Dummy,
    Ppp,
    OvsInterface,
    OvsPort,
    OvsBridge,
    Wpan,
    Lowpan,
    Wireguard,
    WifiP2p,
    Vrf,
    Other(u32),
}

impl DeviceType {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Unknown,
            1 => Self::Ethernet,
            2 => Self::Wifi,
            5 => Self::Bt,
            6 => Self::OlpcMesh,
            7 => Self::Wimax,
            8 => Self::Modem,
            9 => Self::Infiniband,
            10 => Self::Bond,
            11 => Self::Vlan,
            12 => Self::Adsl,
            13 => Self::Bridge,
            14 => Self::Generic,
            15 => Self::Team,
            16 => Self::Tun,
            17 => Self::IpTunnel,
            18 => Self::Macvlan,
            19 => Self::Vxlan,
            20 => Self::Veth,
            21 => Self::Macsec,
            22 => Self::Dummy,
            23 => Self::Ppp,
            24 => Self::OvsInterface,
            25 => Self::OvsPort,
            26 => Self::OvsBridge,
            27 => Self::Wpan,
            28 => Self::Lowpan,
            29 => Self::Wireguard,
            30 => Self::WifiP2p,
            31 => Self::Vrf,
            other => Self::Other(other),
        }
    }

    pub fn is_wireless(self) -> bool {
        matches!(self, Self::Wifi)
    }
}

/// Reason code paired with a device state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceStateReason(pub u32);

const REASON_NAMES: [&str; 68] = [
    "none",
    "unknown",
    "now-managed",
    "now-unmanaged",
    "config-failed",
    "ip-config-unavailable",
    "ip-config-expired",
    "no-secrets",
    "supplicant-disconnect",
    "supplicant-config-failed",
    "supplicant-failed",
    "supplicant-timeout",
    "ppp-start-failed",
    "ppp-disconnect",
    "ppp-failed",
    "dhcp-start-failed",
    "dhcp-error",
    "dhcp-failed",
    "shared-start-failed",
    "shared-failed",
    "autoip-start-failed",
    "autoip-error",
    "autoip-failed",
    "modem-busy",
    "modem-no-dial-tone",
    "modem-no-carrier",
    "modem-dial-timeout",
    "modem-dial-failed",
    "modem-init-failed",
    "gsm-apn-failed",
    "gsm-registration-not-searching",
    "gsm-registration-denied",
    "gsm-registration-timeout",
    "gsm-registration-failed",
    "gsm-pin-check-failed",
    "firmware-missing",
    "removed",
    "sleeping",
    "connection-removed",
    "user-requested",
    "carrier",
    "connection-assumed",
    "supplicant-available",
    "modem-not-found",
    "bt-failed",
    "gsm-sim-not-inserted",
    "gsm-sim-pin-required",
    "gsm-sim-puk-required",
    "gsm-sim-wrong",
    "infiniband-mode",
    "dependency-failed",
    "br2684-failed",
    "modem-manager-unavailable",
    "ssid-not-found",
    "secondary-connection-failed",
    "dcb-fcoe-failed",
    "teamd-control-failed",
    "modem-failed",
    "modem-available",
    "sim-pin-incorrect",
    "new-activation",
    "parent-changed",
    "parent-managed-changed",
    "ovsdb-failed",
    "ip-address-duplicate",
    "ip-method-unsupported",
    "sriov-configuration-failed",
    "peer-not-found",
];

impl DeviceStateReason {
    pub const NONE: Self = Self(0);

    /// Kebab-case name for known codes.
    pub fn name(self) -> Option<&'static str> {
        usize::try_from(self.0)
            .ok()
            .and_then(|idx| REASON_NAMES.get(idx).copied())
    }
}

impl std::fmt::Display for DeviceStateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "reason-{}", self.0),
        }
    }
}

bit_flags! {
    /// General device capabilities.
    pub enum DeviceCapability {
        NmSupported = 0x1,
        CarrierDetect = 0x2,
        IsSoftware = 0x4,
        Sriov = 0x8,
    }
}

bit_flags! {
    /// 802.11 device encryption and mode capabilities.
    pub enum WifiCapability {
        CipherWep40 = 0x1,
        CipherWep104 = 0x2,
        CipherTkip = 0x4,
        CipherCcmp = 0x8,
        Wpa = 0x10,
        Rsn = 0x20,
        Ap = 0x40,
        Adhoc = 0x80,
        FreqValid = 0x100,
        Freq2Ghz = 0x200,
        Freq5Ghz = 0x400,
        Mesh = 0x1000,
        IbssRsn = 0x2000,
    }
}

coded_enum! {
    /// 802.11 operating mode of a device or access point.
    pub enum WifiMode {
        Unknown = 0,
        Adhoc = 1,
        Infra = 2,
        Ap = 3,
        Mesh = 4,
    }
}

impl Default for WifiMode {
    fn default() -> Self {
        Self::Unknown
    }
}

/// IPv4/IPv6/DHCP configuration references.
///
/// Only meaningful while the owner is ACTIVATED.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRefs {
    pub ip4: Option<ObjectPath>,
    pub ip6: Option<ObjectPath>,
    pub dhcp4: Option<ObjectPath>,
    pub dhcp6: Option<ObjectPath>,
}

impl ConfigRefs {
    pub fn is_empty(&self) -> bool {
        self.ip4.is_none() && self.ip6.is_none() && self.dhcp4.is_none() && self.dhcp6.is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectPath> {
        [&self.ip4, &self.ip6, &self.dhcp4, &self.dhcp6]
            .into_iter()
            .flatten()
    }
}

/// Wi-Fi specific device properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WirelessInfo {
    pub perm_hw_address: Option<String>,
    pub mode: WifiMode,
    pub bitrate_kbps: u32,
    /// The visible-set. Access points leaving it are deleted from the store.
    pub access_points: Vec<ObjectPath>,
    pub active_access_point: Option<ObjectPath>,
    pub capabilities: FlagSet<WifiCapability>,
    /// Boot-clock milliseconds of the last finished scan; -1 means never.
    pub last_scan_ms: i64,
}

/// Wired ethernet specific device properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WiredInfo {
    pub perm_hw_address: Option<String>,
    pub speed_mbps: u32,
    pub carrier: bool,
}

/// A network device mirrored from the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Device {
    pub path: ObjectPath,
    pub device_type: DeviceType,
    pub interface: Option<String>,
    pub ip_interface: Option<String>,
    pub driver: Option<String>,
    pub driver_version: Option<String>,
    pub firmware_version: Option<String>,
    pub hw_address: Option<String>,
    pub udi: Option<String>,
    pub mtu: u32,

    // Lifecycle
    pub state: DeviceState,
    pub state_reason: DeviceStateReason,

    // Flags
    pub managed: bool,
    pub autoconnect: bool,
    pub firmware_missing: bool,
    pub nm_plugin_missing: bool,
    pub real: bool,
    pub capabilities: FlagSet<DeviceCapability>,
    pub interface_flags: u32,
    pub metered: Metered,
    pub ip4_connectivity: ConnectivityState,
    pub ip6_connectivity: ConnectivityState,

    // References
    pub active_connection: Option<ObjectPath>,
    /// Published config references; always empty unless ACTIVATED.
    pub configs: ConfigRefs,
    pub available_connections: Vec<ObjectPath>,

    // Type-specific
    pub wireless: Option<WirelessInfo>,
    pub wired: Option<WiredInfo>,

    /// Config references the remote has announced, held back until ACTIVATED.
    #[serde(skip)]
    pub(crate) announced: ConfigRefs,
}

impl Device {
    pub fn new(path: ObjectPath) -> Self {
        Self {
            path,
            device_type: DeviceType::Unknown,
            interface: None,
            ip_interface: None,
            driver: None,
            driver_version: None,
            firmware_version: None,
            hw_address: None,
            udi: None,
            mtu: 0,
            state: DeviceState::Unknown,
            state_reason: DeviceStateReason::NONE,
            managed: false,
            autoconnect: false,
            firmware_missing: false,
            nm_plugin_missing: false,
            real: true,
            capabilities: FlagSet::empty(),
            interface_flags: 0,
            metered: Metered::Unknown,
            ip4_connectivity: ConnectivityState::Unknown,
            ip6_connectivity: ConnectivityState::Unknown,
            active_connection: None,
            configs: ConfigRefs::default(),
            available_connections: Vec::new(),
            wireless: None,
            wired: None,
            announced: ConfigRefs::default(),
        }
    }

    /// Visible access points, empty for non-wireless devices.
    pub fn access_points(&self) -> &[ObjectPath] {
        self.wireless
            .as_ref()
            .map_or(&[], |w| w.access_points.as_slice())
    }

    pub fn display_name(&self) -> &str {
        self.interface.as_deref().unwrap_or(self.path.as_str())
    }
}
