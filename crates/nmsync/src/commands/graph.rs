//! Graph query handlers: snapshot, get, devices, access points.

use std::sync::Arc;

use tabled::Tabled;

use nmsync_core::{AccessPoint, Device, Engine, Entity, ObjectPath, Snapshot, Subgraph};

use crate::cli::{AccessPointsArgs, GetArgs, SnapshotArgs};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::util::or_dash;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Summary")]
    summary: String,
    #[tabled(rename = "Complete")]
    complete: String,
}

impl EntityRow {
    fn new(entity: &Entity, degraded: bool) -> Self {
        Self {
            path: entity.path().to_string(),
            kind: entity.kind().to_string(),
            summary: summarize(entity),
            complete: if degraded { "no" } else { "yes" }.into(),
        }
    }
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Type")]
    dtype: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Connection")]
    connection: String,
    #[tabled(rename = "IPv4")]
    ipv4: String,
}

impl DeviceRow {
    fn new(snap: &Snapshot, d: &Device) -> Self {
        Self {
            path: d.path.to_string(),
            interface: or_dash(d.interface.as_deref()),
            dtype: format!("{:?}", d.device_type),
            state: d.state.to_string(),
            reason: d.state_reason.to_string(),
            connection: snap
                .resolve_active_connection(d)
                .map_or_else(|| "-".into(), |ac| ac.display_name().to_owned()),
            ipv4: snap
                .ip4_config_of(d)
                .and_then(|c| c.ip.addresses.first())
                .map_or_else(|| "-".into(), |a| format!("{}/{}", a.address, a.prefix)),
        }
    }
}

#[derive(Tabled)]
struct AccessPointRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "SSID")]
    ssid: String,
    #[tabled(rename = "BSSID")]
    bssid: String,
    #[tabled(rename = "Band")]
    band: String,
    #[tabled(rename = "Signal")]
    strength: String,
    #[tabled(rename = "Secured")]
    secured: String,
    #[tabled(rename = "Age")]
    age: String,
}

impl AccessPointRow {
    fn new(ap: &AccessPoint, now: i64) -> Self {
        Self {
            path: ap.path.to_string(),
            ssid: ap.ssid_lossy(),
            bssid: or_dash(ap.hw_address.as_deref()),
            band: or_dash(ap.band()),
            strength: format!("{}%", ap.strength),
            secured: if ap.is_secured() { "yes" } else { "no" }.into(),
            age: ap
                .age(now)
                .map_or_else(|| "never".into(), |secs| format!("{secs}s")),
        }
    }
}

// ── Summaries and detail views ──────────────────────────────────────

fn summarize(entity: &Entity) -> String {
    match entity {
        Entity::Manager(m) => format!(
            "{} v{}",
            m.state,
            m.version.as_deref().unwrap_or("?")
        ),
        Entity::Settings(s) => format!(
            "{} connections, hostname {}",
            s.connections.len(),
            s.hostname.as_deref().unwrap_or("-")
        ),
        Entity::Device(d) => format!("{} {:?} {}", d.display_name(), d.device_type, d.state),
        Entity::AccessPoint(ap) => format!("{} {}%", ap.ssid_lossy(), ap.strength),
        Entity::ActiveConnection(ac) => format!("{} {}", ac.display_name(), ac.state),
        Entity::Ip4Config(c) => addresses(&c.ip.addresses),
        Entity::Ip6Config(c) => addresses(&c.ip.addresses),
        Entity::Dhcp4Config(c) => format!("{} options", c.options.len()),
        Entity::Dhcp6Config(c) => format!("{} options", c.options.len()),
    }
}

fn addresses(list: &[nmsync_core::AddressData]) -> String {
    if list.is_empty() {
        return "-".into();
    }
    list.iter()
        .map(|a| format!("{}/{}", a.address, a.prefix))
        .collect::<Vec<_>>()
        .join(", ")
}

fn detail(entity: &Entity) -> String {
    match entity {
        Entity::Device(d) => device_detail(d),
        Entity::AccessPoint(ap) => [
            format!("Path:      {}", ap.path),
            format!("SSID:      {}", ap.ssid_lossy()),
            format!("BSSID:     {}", ap.hw_address.as_deref().unwrap_or("-")),
            format!("Frequency: {} MHz", ap.frequency_mhz),
            format!("Strength:  {}%", ap.strength),
            format!("Mode:      {}", ap.mode),
            format!("Secured:   {}", ap.is_secured()),
            format!("WPA flags: {:?}", ap.wpa_flags),
            format!("RSN flags: {:?}", ap.rsn_flags),
        ]
        .join("\n"),
        Entity::ActiveConnection(ac) => [
            format!("Path:    {}", ac.path),
            format!("Id:      {}", ac.id.as_deref().unwrap_or("-")),
            format!("UUID:    {}", ac.uuid.as_deref().unwrap_or("-")),
            format!("Type:    {}", ac.connection_type.as_deref().unwrap_or("-")),
            format!("State:   {}", ac.state),
            format!(
                "Reason:  {}",
                ac.reason()
                    .map_or_else(|| ac.state_reason.to_string(), |r| r.to_string())
            ),
            format!("VPN:     {}", ac.vpn),
            format!("Devices: {}", join_paths(&ac.devices)),
        ]
        .join("\n"),
        other => serde_json::to_string_pretty(other).unwrap_or_default(),
    }
}

fn device_detail(d: &Device) -> String {
    let mut lines = vec![
        format!("Path:       {}", d.path),
        format!("Interface:  {}", d.interface.as_deref().unwrap_or("-")),
        format!("Type:       {:?}", d.device_type),
        format!("Driver:     {}", d.driver.as_deref().unwrap_or("-")),
        format!("HW address: {}", d.hw_address.as_deref().unwrap_or("-")),
        format!("MTU:        {}", d.mtu),
        format!("State:      {} ({})", d.state, d.state_reason),
        format!(
            "Connection: {}",
            d.active_connection.as_ref().map_or("-", ObjectPath::as_str)
        ),
    ];
    for config in d.configs.iter() {
        lines.push(format!("Config:     {config}"));
    }
    if let Some(w) = &d.wireless {
        lines.push(format!("Visible:    {} access points", w.access_points.len()));
        lines.push(format!(
            "Active AP:  {}",
            w.active_access_point.as_ref().map_or("-", ObjectPath::as_str)
        ));
    }
    if let Some(w) = &d.wired {
        lines.push(format!("Carrier:    {} ({} Mb/s)", w.carrier, w.speed_mbps));
    }
    lines.join("\n")
}

fn join_paths(paths: &[ObjectPath]) -> String {
    if paths.is_empty() {
        return "-".into();
    }
    paths
        .iter()
        .map(ObjectPath::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn subgraph_detail(sub: &Subgraph) -> String {
    let mut lines = vec![format!(
        "{} entities within {} hops of {} (generation {})",
        sub.len(),
        sub.depth,
        sub.root,
        sub.generation
    )];
    for (path, entity) in &sub.entities {
        lines.push(format!("  {path:<48} {:<18} {}", entity.kind().to_string(), summarize(entity)));
    }
    lines.join("\n")
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn snapshot(engine: &Engine, args: &SnapshotArgs, settings: &Settings) -> Result<(), CliError> {
    let snap = engine.snapshot();
    let entities = match args.kind {
        Some(kind) => snap.entities_of(kind),
        None => snap.entities(),
    };

    let out = output::render_list(
        settings.output,
        &entities,
        |e| EntityRow::new(e, snap.is_degraded(e.path())),
        |e| e.path().to_string(),
    )?;
    output::print_output(&out, settings.quiet);
    Ok(())
}

pub fn get(engine: &Engine, args: &GetArgs, settings: &Settings) -> Result<(), CliError> {
    let path = ObjectPath::new(&args.path);

    let out = if args.depth == 0 {
        let entity = engine.snapshot().require(&path)?;
        output::render_single(settings.output, &entity, detail, |e| e.path().to_string())?
    } else {
        let sub = engine.subgraph(&path, args.depth)?;
        output::render_single(settings.output, &sub, subgraph_detail, |s| {
            s.entities
                .keys()
                .map(ObjectPath::as_str)
                .collect::<Vec<_>>()
                .join("\n")
        })?
    };
    output::print_output(&out, settings.quiet);
    Ok(())
}

pub fn devices(engine: &Engine, settings: &Settings) -> Result<(), CliError> {
    let snap = engine.snapshot();
    let devices: Vec<Arc<Device>> = snap.devices().into_iter().cloned().collect();

    let out = output::render_list(
        settings.output,
        &devices,
        |d| DeviceRow::new(&snap, d),
        |d| d.path.to_string(),
    )?;
    output::print_output(&out, settings.quiet);
    Ok(())
}

pub fn access_points(
    engine: &Engine,
    args: &AccessPointsArgs,
    settings: &Settings,
) -> Result<(), CliError> {
    let snap = engine.snapshot();
    let aps: Vec<Arc<AccessPoint>> = snap.access_points().into_iter().cloned().collect();

    // Without an explicit clock, ages are relative to the freshest sighting.
    let now = args
        .now
        .unwrap_or_else(|| aps.iter().map(|ap| ap.last_seen).max().unwrap_or(0));

    let out = output::render_list(
        settings.output,
        &aps,
        |ap| AccessPointRow::new(ap, now),
        |ap| ap.path.to_string(),
    )?;
    output::print_output(&out, settings.quiet);
    Ok(())
}
