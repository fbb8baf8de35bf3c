// ── IP and DHCP configuration records ──
//
// These are published atomically by the remote service. The store replaces
// the whole record on every change.

use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use nmsync_bus::ObjectPath;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressData {
    pub address: IpAddr,
    pub prefix: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteData {
    pub dest: IpAddr,
    pub prefix: u8,
    pub next_hop: Option<IpAddr>,
    pub metric: Option<u32>,
}

/// Fields shared by IPv4 and IPv6 configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpConfigData {
    pub addresses: Vec<AddressData>,
    pub gateway: Option<IpAddr>,
    pub routes: Vec<RouteData>,
    pub nameservers: Vec<IpAddr>,
    pub domains: Vec<String>,
    pub searches: Vec<String>,
    pub dns_options: Vec<String>,
    pub dns_priority: i32,

    /// Which lists arrived in structured form; legacy tuples never overwrite those.
    #[serde(skip)]
    pub(crate) structured: StructuredSeen,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct StructuredSeen {
    pub addresses: bool,
    pub routes: bool,
    pub nameservers: bool,
    pub gateway: bool,
    pub wins: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ip4Config {
    pub path: ObjectPath,
    #[serde(flatten)]
    pub ip: IpConfigData,
    pub wins_servers: Vec<IpAddr>,
}

impl Ip4Config {
    pub fn new(path: ObjectPath) -> Self {
        Self {
            path,
            ip: IpConfigData::default(),
            wins_servers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ip6Config {
    pub path: ObjectPath,
    #[serde(flatten)]
    pub ip: IpConfigData,
}

impl Ip6Config {
    pub fn new(path: ObjectPath) -> Self {
        Self {
            path,
            ip: IpConfigData::default(),
        }
    }
}

/// DHCP lease options, keyed by option name.
pub type DhcpOptions = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dhcp4Config {
    pub path: ObjectPath,
    pub options: DhcpOptions,
}

impl Dhcp4Config {
    pub fn new(path: ObjectPath) -> Self {
        Self {
            path,
            options: DhcpOptions::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dhcp6Config {
    pub path: ObjectPath,
    pub options: DhcpOptions,
}

impl Dhcp6Config {
    pub fn new(path: ObjectPath) -> Self {
        Self {
            path,
            options: DhcpOptions::new(),
        }
    }
}
