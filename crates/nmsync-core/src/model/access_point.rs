// ── Wi-Fi access point ──

use serde::{Deserialize, Serialize};

use super::device::WifiMode;
use super::flags::{FlagSet, bit_flags};
use nmsync_bus::ObjectPath;

bit_flags! {
    /// General 802.11 access point capabilities.
    pub enum ApFlag {
        Privacy = 0x1,
        Wps = 0x2,
        WpsPbc = 0x4,
        WpsPin = 0x8,
    }
}

bit_flags! {
    /// Security requirements advertised in an access point's beacon.
    pub enum ApSecurityFlag {
        PairWep40 = 0x1,
        PairWep104 = 0x2,
        PairTkip = 0x4,
        PairCcmp = 0x8,
        GroupWep40 = 0x10,
        GroupWep104 = 0x20,
        GroupTkip = 0x40,
        GroupCcmp = 0x80,
        KeyMgmtPsk = 0x100,
        KeyMgmt8021x = 0x200,
        KeyMgmtSae = 0x400,
        KeyMgmtOwe = 0x800,
        KeyMgmtOweTm = 0x1000,
        KeyMgmtEapSuiteB192 = 0x2000,
    }
}

/// A visible Wi-Fi access point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPoint {
    pub path: ObjectPath,
    /// Raw SSID bytes; not guaranteed UTF-8.
    pub ssid: Vec<u8>,
    pub hw_address: Option<String>,
    pub mode: WifiMode,
    pub frequency_mhz: u32,
    pub max_bitrate_kbps: u32,
    /// Signal quality in percent.
    pub strength: u8,
    pub flags: FlagSet<ApFlag>,
    pub wpa_flags: FlagSet<ApSecurityFlag>,
    pub rsn_flags: FlagSet<ApSecurityFlag>,
    /// Boot-clock seconds when last found in a scan; -1 means never.
    pub last_seen: i64,
}

impl AccessPoint {
    pub const NEVER_SEEN: i64 = -1;

    pub fn new(path: ObjectPath) -> Self {
        Self {
            path,
            ssid: Vec::new(),
            hw_address: None,
            mode: WifiMode::Unknown,
            frequency_mhz: 0,
            max_bitrate_kbps: 0,
            strength: 0,
            flags: FlagSet::empty(),
            wpa_flags: FlagSet::empty(),
            rsn_flags: FlagSet::empty(),
            last_seen: Self::NEVER_SEEN,
        }
    }

    pub fn ssid_lossy(&self) -> String {
        String::from_utf8_lossy(&self.ssid).into_owned()
    }

    /// Seconds since last observed, given the current boot-clock time.
    /// `None` when the access point has never been observed.
    pub fn age(&self, now_boottime_secs: i64) -> Option<i64> {
        (self.last_seen >= 0).then(|| now_boottime_secs.saturating_sub(self.last_seen).max(0))
    }

    /// Whether the access point requires any form of authentication.
    pub fn is_secured(&self) -> bool {
        self.flags.contains(ApFlag::Privacy) || !self.wpa_flags.is_empty() || !self.rsn_flags.is_empty()
    }

    pub fn band(&self) -> Option<&'static str> {
        match self.frequency_mhz {
            2400..=2500 => Some("2.4GHz"),
            4900..=5900 => Some("5GHz"),
            5925..=7125 => Some("6GHz"),
            _ => None,
        }
    }
}
