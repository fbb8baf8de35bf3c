// ── Wire property decoding ──
//
// Applies remote property values onto domain records one field at a time.
// A value of the wrong shape fails only that field; callers keep going with
// the rest of the payload. Properties a record does not model are ignored.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use serde_json::Value;

use nmsync_bus::{ObjectKind, ObjectPath, PropertyMap};

use crate::model::{
    AccessPoint, ActiveConnection, ActiveConnectionState, AddressData, ConfigRefs,
    ConnectivityState, Device, DeviceState, DeviceStateReason, DeviceType, Dhcp4Config,
    Dhcp6Config, DhcpOptions, FlagSet, Ip4Config, Ip6Config, IpConfigData, Manager, Metered,
    NmState, RouteData, Settings, WifiMode, WiredInfo, WirelessInfo,
};

// ── Field errors ───────────────────────────────────────────────────

/// A single property value that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldError {
    pub expected: &'static str,
    pub found: String,
}

pub(crate) type FieldResult<T> = Result<T, FieldError>;

const FOUND_PREVIEW_CHARS: usize = 48;

fn mismatch(expected: &'static str, value: &Value) -> FieldError {
    let mut found = value.to_string();
    if let Some((idx, _)) = found.char_indices().nth(FOUND_PREVIEW_CHARS) {
        found.truncate(idx);
        found.push('…');
    }
    FieldError { expected, found }
}

// ── Scalar decoders ────────────────────────────────────────────────

fn boolean(v: &Value) -> FieldResult<bool> {
    v.as_bool().ok_or_else(|| mismatch("boolean", v))
}

fn uint(v: &Value) -> FieldResult<u32> {
    v.as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| mismatch("unsigned 32-bit integer", v))
}

fn int(v: &Value) -> FieldResult<i32> {
    v.as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| mismatch("signed 32-bit integer", v))
}

fn long(v: &Value) -> FieldResult<i64> {
    v.as_i64().ok_or_else(|| mismatch("signed integer", v))
}

fn byte(v: &Value) -> FieldResult<u8> {
    v.as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .ok_or_else(|| mismatch("integer 0-255", v))
}

/// Empty strings are the remote's way of saying "unset".
fn opt_string(v: &Value) -> FieldResult<Option<String>> {
    let s = v.as_str().ok_or_else(|| mismatch("string", v))?;
    Ok((!s.is_empty()).then(|| s.to_owned()))
}

fn strings(v: &Value) -> FieldResult<Vec<String>> {
    array(v, "array of strings")?
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_owned)
                .ok_or_else(|| mismatch("array of strings", v))
        })
        .collect()
}

fn array<'a>(v: &'a Value, expected: &'static str) -> FieldResult<&'a Vec<Value>> {
    v.as_array().ok_or_else(|| mismatch(expected, v))
}

/// The null path `/` decodes to `None`.
fn opt_path(v: &Value) -> FieldResult<Option<ObjectPath>> {
    let s = v.as_str().ok_or_else(|| mismatch("object path", v))?;
    let path = ObjectPath::new(s);
    Ok((!path.is_null()).then_some(path))
}

fn paths(v: &Value) -> FieldResult<Vec<ObjectPath>> {
    let items = array(v, "array of object paths")?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if let Some(path) = opt_path(item).map_err(|_| mismatch("array of object paths", v))? {
            out.push(path);
        }
    }
    Ok(out)
}

fn coded<T>(v: &Value, expected: &'static str, from_code: fn(u32) -> Option<T>) -> FieldResult<T> {
    uint(v)
        .ok()
        .and_then(from_code)
        .ok_or_else(|| mismatch(expected, v))
}

fn flags<F: crate::model::Flag>(v: &Value) -> FieldResult<FlagSet<F>> {
    uint(v).map(FlagSet::from_bits)
}

/// Byte arrays arrive as JSON arrays of numbers; strings are taken as UTF-8 bytes.
fn bytes(v: &Value) -> FieldResult<Vec<u8>> {
    match v {
        Value::String(s) => Ok(s.as_bytes().to_vec()),
        Value::Array(items) => items
            .iter()
            .map(|b| byte(b).map_err(|_| mismatch("byte array", v)))
            .collect(),
        _ => Err(mismatch("byte array", v)),
    }
}

// ── Address decoders ───────────────────────────────────────────────

/// Legacy IPv4 integers are network byte order as laid out in memory.
fn ipv4_from_legacy(raw: u32) -> Ipv4Addr {
    Ipv4Addr::from(raw.to_le_bytes())
}

fn ip_from_bytes(raw: &[u8]) -> Option<IpAddr> {
    match raw.len() {
        4 => <[u8; 4]>::try_from(raw).ok().map(|b| IpAddr::V4(Ipv4Addr::from(b))),
        16 => <[u8; 16]>::try_from(raw).ok().map(|b| IpAddr::V6(Ipv6Addr::from(b))),
        _ => None,
    }
}

/// An address in any of the encodings the remote uses: text, legacy
/// IPv4 integer, or raw bytes.
fn ip(v: &Value) -> FieldResult<IpAddr> {
    match v {
        Value::String(s) => s.parse().map_err(|_| mismatch("IP address", v)),
        Value::Number(_) => uint(v).map(|n| IpAddr::V4(ipv4_from_legacy(n))),
        Value::Array(_) => bytes(v)
            .ok()
            .and_then(|b| ip_from_bytes(&b))
            .ok_or_else(|| mismatch("IP address", v)),
        _ => Err(mismatch("IP address", v)),
    }
}

/// Unspecified addresses (`0.0.0.0`, `::`, empty string) mean "none".
fn opt_ip(v: &Value) -> FieldResult<Option<IpAddr>> {
    if v.as_str().is_some_and(str::is_empty) {
        return Ok(None);
    }
    ip(v).map(|addr| (!addr.is_unspecified()).then_some(addr))
}

fn ips(v: &Value) -> FieldResult<Vec<IpAddr>> {
    array(v, "array of IP addresses")?
        .iter()
        .map(|item| ip(item).map_err(|_| mismatch("array of IP addresses", v)))
        .collect()
}

fn prefix(v: &Value) -> FieldResult<u8> {
    byte(v).map_err(|_| mismatch("prefix length", v))
}

fn field<'a>(obj: &'a Value, key: &str, expected: &'static str) -> FieldResult<&'a Value> {
    obj.get(key).ok_or_else(|| mismatch(expected, obj))
}

fn address_data(v: &Value) -> FieldResult<Vec<AddressData>> {
    const EXPECTED: &str = "array of {address, prefix}";
    array(v, EXPECTED)?
        .iter()
        .map(|item| {
            Ok(AddressData {
                address: ip(field(item, "address", EXPECTED)?)?,
                prefix: prefix(field(item, "prefix", EXPECTED)?)?,
            })
        })
        .collect()
}

fn route_data(v: &Value) -> FieldResult<Vec<RouteData>> {
    const EXPECTED: &str = "array of {dest, prefix, next-hop?, metric?}";
    array(v, EXPECTED)?
        .iter()
        .map(|item| {
            Ok(RouteData {
                dest: ip(field(item, "dest", EXPECTED)?)?,
                prefix: prefix(field(item, "prefix", EXPECTED)?)?,
                next_hop: item.get("next-hop").map(opt_ip).transpose()?.flatten(),
                metric: item.get("metric").map(uint).transpose()?,
            })
        })
        .collect()
}

fn nameserver_data(v: &Value) -> FieldResult<Vec<IpAddr>> {
    const EXPECTED: &str = "array of {address}";
    array(v, EXPECTED)?
        .iter()
        .map(|item| ip(field(item, "address", EXPECTED)?))
        .collect()
}

/// Legacy `[address, prefix, gateway]` tuples. Returns the addresses and
/// the first non-empty gateway.
fn legacy_addresses(v: &Value) -> FieldResult<(Vec<AddressData>, Option<IpAddr>)> {
    const EXPECTED: &str = "array of [address, prefix, gateway]";
    let mut out = Vec::new();
    let mut gateway = None;
    for tuple in array(v, EXPECTED)? {
        let parts = array(tuple, EXPECTED)?;
        let [address, pfx, rest @ ..] = parts.as_slice() else {
            return Err(mismatch(EXPECTED, v));
        };
        out.push(AddressData {
            address: ip(address)?,
            prefix: prefix(pfx)?,
        });
        if gateway.is_none() {
            gateway = rest.first().map(opt_ip).transpose()?.flatten();
        }
    }
    Ok((out, gateway))
}

/// Legacy `[dest, prefix, next_hop, metric]` tuples.
fn legacy_routes(v: &Value) -> FieldResult<Vec<RouteData>> {
    const EXPECTED: &str = "array of [dest, prefix, next-hop, metric]";
    array(v, EXPECTED)?
        .iter()
        .map(|tuple| {
            let parts = array(tuple, EXPECTED)?;
            let [dest, pfx, rest @ ..] = parts.as_slice() else {
                return Err(mismatch(EXPECTED, v));
            };
            Ok(RouteData {
                dest: ip(dest)?,
                prefix: prefix(pfx)?,
                next_hop: rest.first().map(opt_ip).transpose()?.flatten(),
                metric: rest.get(1).map(uint).transpose()?,
            })
        })
        .collect()
}

// ── Composite decoders ─────────────────────────────────────────────

/// `StateReason` arrives either as `{"<state>": reason}` or `[state, reason]`.
fn state_reason(v: &Value) -> FieldResult<(DeviceState, DeviceStateReason)> {
    const EXPECTED: &str = "{state: reason} or [state, reason]";
    let (state_code, reason) = match v {
        Value::Object(map) if map.len() == 1 => {
            let Some((key, reason)) = map.iter().next() else {
                return Err(mismatch(EXPECTED, v));
            };
            let code: u32 = key.parse().map_err(|_| mismatch(EXPECTED, v))?;
            (code, uint(reason).map_err(|_| mismatch(EXPECTED, v))?)
        }
        Value::Array(pair) if pair.len() == 2 => {
            let code = uint(&pair[0]).map_err(|_| mismatch(EXPECTED, v))?;
            (code, uint(&pair[1]).map_err(|_| mismatch(EXPECTED, v))?)
        }
        _ => return Err(mismatch(EXPECTED, v)),
    };
    let state = DeviceState::from_code(state_code).ok_or_else(|| mismatch(EXPECTED, v))?;
    Ok((state, DeviceStateReason(reason)))
}

fn dhcp_options(v: &Value) -> FieldResult<DhcpOptions> {
    const EXPECTED: &str = "map of DHCP options";
    match v {
        Value::Object(map) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        Value::Array(items) => {
            let mut out = DhcpOptions::new();
            for item in items {
                let map = item.as_object().ok_or_else(|| mismatch(EXPECTED, v))?;
                out.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Ok(out)
        }
        _ => Err(mismatch(EXPECTED, v)),
    }
}

fn announce(refs: &mut ConfigRefs, name: &str, v: &Value) -> FieldResult<bool> {
    let slot = match name {
        "Ip4Config" => &mut refs.ip4,
        "Ip6Config" => &mut refs.ip6,
        "Dhcp4Config" => &mut refs.dhcp4,
        "Dhcp6Config" => &mut refs.dhcp6,
        _ => return Ok(false),
    };
    *slot = opt_path(v)?;
    Ok(true)
}

// ── Record decoding ────────────────────────────────────────────────

/// Applies named wire properties onto a record.
pub(crate) trait Decode {
    /// Apply one property. `Ok(false)` means the property is not modeled.
    fn apply_property(&mut self, name: &str, value: &Value) -> FieldResult<bool>;

    /// Normalize derived fields after a batch of properties.
    fn finish(&mut self) {}
}

fn wireless(device: &mut Device) -> &mut WirelessInfo {
    device.wireless.get_or_insert_with(|| WirelessInfo {
        last_scan_ms: -1,
        ..WirelessInfo::default()
    })
}

fn wired(device: &mut Device) -> &mut WiredInfo {
    device.wired.get_or_insert_with(WiredInfo::default)
}

impl Decode for Device {
    fn apply_property(&mut self, name: &str, v: &Value) -> FieldResult<bool> {
        match name {
            "Udi" => self.udi = opt_string(v)?,
            "Interface" => self.interface = opt_string(v)?,
            "IpInterface" => self.ip_interface = opt_string(v)?,
            "Driver" => self.driver = opt_string(v)?,
            "DriverVersion" => self.driver_version = opt_string(v)?,
            "FirmwareVersion" => self.firmware_version = opt_string(v)?,
            "HwAddress" => self.hw_address = opt_string(v)?,
            "Mtu" => self.mtu = uint(v)?,
            "DeviceType" => self.device_type = DeviceType::from_code(uint(v)?),
            "State" => self.state = coded(v, "device state", DeviceState::from_code)?,
            "StateReason" => (self.state, self.state_reason) = state_reason(v)?,
            "Managed" => self.managed = boolean(v)?,
            "Autoconnect" => self.autoconnect = boolean(v)?,
            "FirmwareMissing" => self.firmware_missing = boolean(v)?,
            "NmPluginMissing" => self.nm_plugin_missing = boolean(v)?,
            "Real" => self.real = boolean(v)?,
            "Capabilities" => self.capabilities = flags(v)?,
            "InterfaceFlags" => self.interface_flags = uint(v)?,
            "Metered" => self.metered = coded(v, "metered value", Metered::from_code)?,
            "Ip4Connectivity" => {
                self.ip4_connectivity = coded(v, "connectivity", ConnectivityState::from_code)?;
            }
            "Ip6Connectivity" => {
                self.ip6_connectivity = coded(v, "connectivity", ConnectivityState::from_code)?;
            }
            "ActiveConnection" => self.active_connection = opt_path(v)?,
            "AvailableConnections" => self.available_connections = paths(v)?,
            "Ip4Config" | "Ip6Config" | "Dhcp4Config" | "Dhcp6Config" => {
                return announce(&mut self.announced, name, v);
            }

            // Wireless
            "Mode" => wireless(self).mode = coded(v, "802.11 mode", WifiMode::from_code)?,
            "Bitrate" => wireless(self).bitrate_kbps = uint(v)?,
            "AccessPoints" => wireless(self).access_points = paths(v)?,
            "ActiveAccessPoint" => wireless(self).active_access_point = opt_path(v)?,
            "WirelessCapabilities" => wireless(self).capabilities = flags(v)?,
            "LastScan" => wireless(self).last_scan_ms = long(v)?,

            // Wired
            "Speed" => wired(self).speed_mbps = uint(v)?,
            "Carrier" => wired(self).carrier = boolean(v)?,

            "PermHwAddress" => {
                let value = opt_string(v)?;
                if self.wireless.is_some() || self.device_type.is_wireless() {
                    wireless(self).perm_hw_address = value;
                } else {
                    wired(self).perm_hw_address = value;
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn finish(&mut self) {
        match self.device_type {
            DeviceType::Wifi => {
                wireless(self);
            }
            DeviceType::Ethernet => {
                wired(self);
            }
            _ => {}
        }
    }
}

impl Decode for AccessPoint {
    fn apply_property(&mut self, name: &str, v: &Value) -> FieldResult<bool> {
        match name {
            "Ssid" => self.ssid = bytes(v)?,
            "HwAddress" => self.hw_address = opt_string(v)?,
            "Mode" => self.mode = coded(v, "802.11 mode", WifiMode::from_code)?,
            "Frequency" => self.frequency_mhz = uint(v)?,
            "MaxBitrate" => self.max_bitrate_kbps = uint(v)?,
            "Strength" => self.strength = byte(v)?,
            "Flags" => self.flags = flags(v)?,
            "WpaFlags" => self.wpa_flags = flags(v)?,
            "RsnFlags" => self.rsn_flags = flags(v)?,
            // Some emitters misspell it.
            "LastSeen" | "LastSteen" => self.last_seen = long(v)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Decode for ActiveConnection {
    fn apply_property(&mut self, name: &str, v: &Value) -> FieldResult<bool> {
        match name {
            "Connection" => self.connection = opt_path(v)?,
            "SpecificObject" => self.specific_object = opt_path(v)?,
            "Id" => self.id = opt_string(v)?,
            "Uuid" => self.uuid = opt_string(v)?,
            "Type" => self.connection_type = opt_string(v)?,
            "Devices" => self.devices = paths(v)?,
            "State" => {
                self.state = coded(v, "activation state", ActiveConnectionState::from_code)?;
            }
            "StateFlags" => self.state_flags = flags(v)?,
            "StateReason" => self.state_reason = uint(v)?,
            "Default" => self.default = boolean(v)?,
            "Default6" => self.default6 = boolean(v)?,
            "Vpn" => self.vpn = boolean(v)?,
            "Master" => self.master = opt_path(v)?,
            "Ip4Config" | "Ip6Config" | "Dhcp4Config" | "Dhcp6Config" => {
                return announce(&mut self.announced, name, v);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Decode for Manager {
    fn apply_property(&mut self, name: &str, v: &Value) -> FieldResult<bool> {
        match name {
            "Version" => self.version = opt_string(v)?,
            "State" => self.state = coded(v, "manager state", NmState::from_code)?,
            "Connectivity" => {
                self.connectivity = coded(v, "connectivity", ConnectivityState::from_code)?;
            }
            "Metered" => self.metered = coded(v, "metered value", Metered::from_code)?,
            "Startup" => self.startup = boolean(v)?,
            "NetworkingEnabled" | "NetworkingEnables" => self.networking_enabled = boolean(v)?,
            "WirelessEnabled" => self.wireless_enabled = boolean(v)?,
            "WirelessHardwareEnabled" => self.wireless_hardware_enabled = boolean(v)?,
            "WwanEnabled" => self.wwan_enabled = boolean(v)?,
            "WwanHardwareEnabled" => self.wwan_hardware_enabled = boolean(v)?,
            "ConnectivityCheckAvailable" => self.connectivity_check_available = boolean(v)?,
            "ConnectivityCheckEnabled" => self.connectivity_check_enabled = boolean(v)?,
            "ConnectivityCheckUri" => self.connectivity_check_uri = opt_string(v)?,
            "Devices" => self.devices = paths(v)?,
            "AllDevices" => self.all_devices = paths(v)?,
            "ActiveConnections" => self.active_connections = paths(v)?,
            "PrimaryConnection" => self.primary_connection = opt_path(v)?,
            "PrimaryConnectionType" => self.primary_connection_type = opt_string(v)?,
            "ActivatingConnection" => self.activating_connection = opt_path(v)?,
            "Capabilities" => {
                let mut caps = array(v, "array of capability numbers")?
                    .iter()
                    .map(uint)
                    .collect::<FieldResult<Vec<_>>>()?;
                caps.sort_unstable();
                self.capabilities = caps;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Decode for Settings {
    fn apply_property(&mut self, name: &str, v: &Value) -> FieldResult<bool> {
        match name {
            "Connections" => self.connections = paths(v)?,
            "Hostname" => self.hostname = opt_string(v)?,
            "CanModify" => self.can_modify = boolean(v)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Properties shared by both IP families. Legacy encodings only fill a list
/// when its structured counterpart has not been seen.
fn apply_ip_common(ip: &mut IpConfigData, name: &str, v: &Value) -> FieldResult<bool> {
    match name {
        "AddressData" => {
            ip.addresses = address_data(v)?;
            ip.structured.addresses = true;
        }
        "Addresses" => {
            let (addresses, gateway) = legacy_addresses(v)?;
            if !ip.structured.addresses {
                ip.addresses = addresses;
            }
            if !ip.structured.gateway && gateway.is_some() {
                ip.gateway = gateway;
            }
        }
        "Gateway" => {
            ip.gateway = opt_ip(v)?;
            ip.structured.gateway = true;
        }
        "RouteData" => {
            ip.routes = route_data(v)?;
            ip.structured.routes = true;
        }
        "Routes" => {
            let routes = legacy_routes(v)?;
            if !ip.structured.routes {
                ip.routes = routes;
            }
        }
        "Domains" => ip.domains = strings(v)?,
        "Searches" => ip.searches = strings(v)?,
        "DnsOptions" => ip.dns_options = strings(v)?,
        "DnsPriority" => ip.dns_priority = int(v)?,
        _ => return Ok(false),
    }
    Ok(true)
}

impl Decode for Ip4Config {
    fn apply_property(&mut self, name: &str, v: &Value) -> FieldResult<bool> {
        match name {
            "NameserverData" => {
                self.ip.nameservers = nameserver_data(v)?;
                self.ip.structured.nameservers = true;
            }
            "Nameservers" => {
                let servers = ips(v)?;
                if !self.ip.structured.nameservers {
                    self.ip.nameservers = servers;
                }
            }
            "WinsServerData" => {
                self.wins_servers = ips(v)?;
                self.ip.structured.wins = true;
            }
            "WinsServers" => {
                let servers = ips(v)?;
                if !self.ip.structured.wins {
                    self.wins_servers = servers;
                }
            }
            _ => return apply_ip_common(&mut self.ip, name, v),
        }
        Ok(true)
    }
}

impl Decode for Ip6Config {
    fn apply_property(&mut self, name: &str, v: &Value) -> FieldResult<bool> {
        if name == "Nameservers" {
            self.ip.nameservers = ips(v)?;
            return Ok(true);
        }
        apply_ip_common(&mut self.ip, name, v)
    }
}

impl Decode for Dhcp4Config {
    fn apply_property(&mut self, name: &str, v: &Value) -> FieldResult<bool> {
        if name != "Options" {
            return Ok(false);
        }
        self.options = dhcp_options(v)?;
        Ok(true)
    }
}

impl Decode for Dhcp6Config {
    fn apply_property(&mut self, name: &str, v: &Value) -> FieldResult<bool> {
        if name != "Options" {
            return Ok(false);
        }
        self.options = dhcp_options(v)?;
        Ok(true)
    }
}

// ── Kind inference ─────────────────────────────────────────────────

/// Guess the kind of an unseen object from the property names it reports.
pub(crate) fn infer_kind(properties: &PropertyMap) -> Option<ObjectKind> {
    properties
        .iter()
        .find_map(|(name, value)| infer_from_property(name, value))
}

fn infer_from_property(name: &str, value: &Value) -> Option<ObjectKind> {
    let kind = match name {
        "DeviceType" | "Interface" | "IpInterface" | "Udi" | "Driver" | "DriverVersion"
        | "FirmwareVersion" | "AvailableConnections" | "Managed" | "Autoconnect"
        | "AccessPoints" | "ActiveAccessPoint" | "Carrier" | "Speed" => ObjectKind::Device,
        "Ssid" | "Strength" | "Frequency" | "WpaFlags" | "RsnFlags" | "LastSeen"
        | "LastSteen" | "MaxBitrate" => ObjectKind::AccessPoint,
        "Vpn" | "Connection" | "SpecificObject" | "Uuid" | "Default6" | "Master" => {
            ObjectKind::ActiveConnection
        }
        "NetworkingEnabled" | "NetworkingEnables" | "WirelessEnabled" | "PrimaryConnection"
        | "ActivatingConnection" | "ActiveConnections" | "AllDevices" | "Startup" => {
            ObjectKind::Manager
        }
        "Connections" | "Hostname" | "CanModify" => ObjectKind::Settings,
        "WinsServerData" | "WinsServers" | "NameserverData" => ObjectKind::Ip4Config,
        "AddressData" | "Gateway" => return infer_ip_family(name, value),
        _ => return None,
    };
    Some(kind)
}

fn infer_ip_family(name: &str, value: &Value) -> Option<ObjectKind> {
    let addr = match name {
        "Gateway" => opt_ip(value).ok().flatten(),
        _ => address_data(value)
            .ok()
            .and_then(|list| list.first().map(|a| a.address)),
    }?;
    Some(match addr {
        IpAddr::V4(_) => ObjectKind::Ip4Config,
        IpAddr::V6(_) => ObjectKind::Ip6Config,
    })
}

/// Properties whose arrival completes a degraded entity.
pub(crate) fn defining_properties(kind: ObjectKind) -> &'static [&'static str] {
    match kind {
        ObjectKind::Manager => &["State", "Devices", "ActiveConnections"],
        ObjectKind::Settings => &["Connections"],
        ObjectKind::Device => &["DeviceType", "Interface", "State"],
        ObjectKind::AccessPoint => &["Ssid", "Strength", "Frequency"],
        ObjectKind::ActiveConnection => &["Connection", "State", "Devices"],
        ObjectKind::Ip4Config | ObjectKind::Ip6Config => &["AddressData", "Gateway"],
        ObjectKind::Dhcp4Config | ObjectKind::Dhcp6Config => &["Options"],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::model::{ApFlag, ApSecurityFlag};

    fn props(value: Value) -> PropertyMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn state_reason_accepts_map_and_pair() {
        assert_eq!(
            state_reason(&json!({ "40": 0 })).unwrap(),
            (DeviceState::Prepare, DeviceStateReason(0))
        );
        assert_eq!(
            state_reason(&json!([100, 39])).unwrap(),
            (DeviceState::Activated, DeviceStateReason(39))
        );
        assert!(state_reason(&json!({ "45": 0 })).is_err());
        assert!(state_reason(&json!("40")).is_err());
    }

    #[test]
    fn device_fields_apply_independently() {
        let mut device = Device::new(ObjectPath::new("/dev/0"));
        assert!(device.apply_property("Interface", &json!("wlan0")).unwrap());
        assert!(device.apply_property("Mtu", &json!("big")).is_err());
        assert!(!device.apply_property("LldpNeighbors", &json!([])).unwrap());
        assert_eq!(device.interface.as_deref(), Some("wlan0"));
        assert_eq!(device.mtu, 0);
    }

    #[test]
    fn unrecognized_state_code_is_malformed() {
        let mut device = Device::new(ObjectPath::new("/dev/0"));
        let err = device.apply_property("State", &json!(55)).unwrap_err();
        assert_eq!(err.expected, "device state");
        assert_eq!(err.found, "55");
    }

    #[test]
    fn null_path_reads_as_absent() {
        let mut device = Device::new(ObjectPath::new("/dev/0"));
        device
            .apply_property("ActiveConnection", &json!("/ac/1"))
            .unwrap();
        device.apply_property("ActiveConnection", &json!("/")).unwrap();
        assert!(device.active_connection.is_none());
    }

    #[test]
    fn config_refs_are_only_announced() {
        let mut device = Device::new(ObjectPath::new("/dev/0"));
        device.apply_property("Ip4Config", &json!("/ip4/1")).unwrap();
        assert_eq!(device.announced.ip4, Some(ObjectPath::new("/ip4/1")));
        assert!(device.configs.is_empty());
    }

    #[test]
    fn wifi_device_gets_wireless_extension() {
        let mut device = Device::new(ObjectPath::new("/dev/1"));
        device.apply_property("DeviceType", &json!(2)).unwrap();
        device.finish();
        let wireless = device.wireless.as_ref().unwrap();
        assert_eq!(wireless.last_scan_ms, -1);
        assert!(device.wired.is_none());
    }

    #[test]
    fn access_point_flags_and_ssid() {
        let mut ap = AccessPoint::new(ObjectPath::new("/ap/1"));
        ap.apply_property("Ssid", &json!([104, 111, 109, 101])).unwrap();
        ap.apply_property("Flags", &json!(1)).unwrap();
        ap.apply_property("RsnFlags", &json!(0x188 | 0x10_0000)).unwrap();
        ap.apply_property("LastSteen", &json!(-1)).unwrap();

        assert_eq!(ap.ssid_lossy(), "home");
        assert!(ap.flags.contains(ApFlag::Privacy));
        assert!(ap.rsn_flags.contains(ApSecurityFlag::KeyMgmtPsk));
        assert_eq!(ap.rsn_flags.unknown_bits(), 0x10_0000);
        assert_eq!(ap.last_seen, -1);
        assert!(ap.apply_property("Strength", &json!(300)).is_err());
    }

    #[test]
    fn legacy_ipv4_synthesizes_structured_form() {
        let mut cfg = Ip4Config::new(ObjectPath::new("/ip4/1"));
        // 192.168.1.10/24 via 192.168.1.1, little-endian memory layout.
        let addr = u32::from_le_bytes([192, 168, 1, 10]);
        let gw = u32::from_le_bytes([192, 168, 1, 1]);
        cfg.apply_property("Addresses", &json!([[addr, 24, gw]]))
            .unwrap();
        cfg.apply_property("Nameservers", &json!([u32::from_le_bytes([9, 9, 9, 9])]))
            .unwrap();

        assert_eq!(
            cfg.ip.addresses,
            vec![AddressData {
                address: "192.168.1.10".parse().unwrap(),
                prefix: 24,
            }]
        );
        assert_eq!(cfg.ip.gateway, Some("192.168.1.1".parse().unwrap()));
        assert_eq!(cfg.ip.nameservers, vec!["9.9.9.9".parse::<IpAddr>().unwrap()]);
    }

    #[test]
    fn structured_form_wins_over_legacy_in_any_order() {
        let mut cfg = Ip4Config::new(ObjectPath::new("/ip4/1"));
        cfg.apply_property(
            "AddressData",
            &json!([{ "address": "10.0.0.2", "prefix": 8 }]),
        )
        .unwrap();
        let legacy = u32::from_le_bytes([172, 16, 0, 1]);
        cfg.apply_property("Addresses", &json!([[legacy, 16, 0]]))
            .unwrap();

        assert_eq!(cfg.ip.addresses.len(), 1);
        assert_eq!(cfg.ip.addresses[0].address, "10.0.0.2".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn ipv6_legacy_byte_arrays() {
        let mut cfg = Ip6Config::new(ObjectPath::new("/ip6/1"));
        let addr: Vec<u8> = "fd00::5".parse::<Ipv6Addr>().unwrap().octets().to_vec();
        let zero = vec![0u8; 16];
        cfg.apply_property("Addresses", &json!([[addr, 64, zero]]))
            .unwrap();
        cfg.apply_property("Nameservers", &json!([addr])).unwrap();

        assert_eq!(cfg.ip.addresses[0].prefix, 64);
        assert_eq!(cfg.ip.addresses[0].address, "fd00::5".parse::<IpAddr>().unwrap());
        assert!(cfg.ip.gateway.is_none());
        assert_eq!(cfg.ip.nameservers.len(), 1);
    }

    #[test]
    fn route_data_with_optional_fields() {
        let routes = route_data(&json!([
            { "dest": "0.0.0.0", "prefix": 0, "next-hop": "10.0.0.1", "metric": 100 },
            { "dest": "10.0.0.0", "prefix": 8 }
        ]))
        .unwrap();
        assert_eq!(routes[0].next_hop, Some("10.0.0.1".parse().unwrap()));
        assert_eq!(routes[0].metric, Some(100));
        assert_eq!(routes[1].next_hop, None);
    }

    #[test]
    fn dhcp_options_from_map_or_list() {
        let mut cfg = Dhcp4Config::new(ObjectPath::new("/dhcp4/1"));
        cfg.apply_property("Options", &json!({ "ip_address": "10.0.0.2" }))
            .unwrap();
        assert_eq!(cfg.options["ip_address"], "10.0.0.2");

        cfg.apply_property("Options", &json!([{ "a": 1 }, { "b": 2 }]))
            .unwrap();
        assert_eq!(cfg.options.len(), 2);
    }

    #[test]
    fn kind_inference() {
        assert_eq!(
            infer_kind(&props(json!({ "Interface": "eth0" }))),
            Some(ObjectKind::Device)
        );
        assert_eq!(
            infer_kind(&props(json!({ "Strength": 80 }))),
            Some(ObjectKind::AccessPoint)
        );
        assert_eq!(
            infer_kind(&props(json!({ "Vpn": true }))),
            Some(ObjectKind::ActiveConnection)
        );
        assert_eq!(
            infer_kind(&props(json!({ "Gateway": "fe80::1" }))),
            Some(ObjectKind::Ip6Config)
        );
        assert_eq!(infer_kind(&props(json!({ "State": 100 }))), None);
        assert_eq!(infer_kind(&props(json!({ "Options": {} }))), None);
    }

    #[test]
    fn long_values_are_truncated_in_errors() {
        let err = mismatch("boolean", &json!("x".repeat(200)));
        assert!(err.found.chars().count() <= FOUND_PREVIEW_CHARS + 1);
        assert!(err.found.ends_with('…'));
    }
}
