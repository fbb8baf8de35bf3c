// ── Change ingestion pipeline ──
//
// Applies one `ChangeEvent` to a draft graph. The engine publishes the
// draft only after the whole event has been applied, so readers never see
// an entity mid-update. Conflicts are detected before the draft is touched.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use nmsync_bus::{ChangeEvent, ObjectKind, ObjectPath, PropertyMap};

use crate::decode::{FieldError, defining_properties, infer_kind};
use crate::error::{CoreError, IngestWarning};
use crate::model::{
    AccessPoint, ActiveConnection, Device, Dhcp4Config, Dhcp6Config, Entity, Ip4Config,
    Ip6Config, Manager, Settings,
};
use crate::store::{Graph, Record};
use crate::stream::Change;
use crate::tracker::Track;

/// A change not yet stamped with a generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingChange {
    pub path: ObjectPath,
    pub kind: ObjectKind,
    pub change: Change,
}

#[derive(Debug, Default)]
pub(crate) struct IngestOutcome {
    pub changes: Vec<PendingChange>,
    pub warnings: Vec<IngestWarning>,
    /// Whether the draft differs from the graph it was cloned from.
    pub dirty: bool,
}

/// Apply `event` to `graph`. On error the graph is left untouched.
pub(crate) fn ingest_event(
    graph: &mut Graph,
    event: &ChangeEvent,
) -> Result<IngestOutcome, CoreError> {
    let mut ingest = Ingest {
        graph,
        outcome: IngestOutcome::default(),
    };
    ingest.apply(event)?;
    Ok(ingest.outcome)
}

pub(crate) struct Ingest<'g> {
    graph: &'g mut Graph,
    outcome: IngestOutcome,
}

macro_rules! for_kind {
    ($kind:expr, $method:ident ( $($arg:expr),* )) => {
        match $kind {
            ObjectKind::Manager => $method::<Manager>($($arg),*),
            ObjectKind::Settings => $method::<Settings>($($arg),*),
            ObjectKind::Device => $method::<Device>($($arg),*),
            ObjectKind::AccessPoint => $method::<AccessPoint>($($arg),*),
            ObjectKind::ActiveConnection => $method::<ActiveConnection>($($arg),*),
            ObjectKind::Ip4Config => $method::<Ip4Config>($($arg),*),
            ObjectKind::Ip6Config => $method::<Ip6Config>($($arg),*),
            ObjectKind::Dhcp4Config => $method::<Dhcp4Config>($($arg),*),
            ObjectKind::Dhcp6Config => $method::<Dhcp6Config>($($arg),*),
        }
    };
}

impl Ingest<'_> {
    fn apply(&mut self, event: &ChangeEvent) -> Result<(), CoreError> {
        match event {
            ChangeEvent::ObjectAdded {
                path,
                kind,
                properties,
            } => {
                self.admit(path, *kind)?;
                for_kind!(*kind, add_object(self, path, properties));
            }
            ChangeEvent::ObjectRemoved { path } => self.remove_object(path),
            ChangeEvent::PropertiesChanged {
                path,
                kind_hint,
                properties,
            } => {
                let Some(kind) = self.resolve_kind(path, *kind_hint, properties)? else {
                    return Ok(());
                };
                for_kind!(kind, update_object(self, path, properties));
            }
        }
        Ok(())
    }

    /// Check a claimed kind against the registry without mutating anything.
    fn admit(&self, path: &ObjectPath, kind: ObjectKind) -> Result<(), CoreError> {
        self.graph
            .registry
            .check(path, kind)
            .map_err(|conflict| CoreError::ConsistencyViolation {
                path: path.clone(),
                conflict,
            })
    }

    /// The kind a `PropertiesChanged` applies to: the registered kind, or
    /// the hint, or one inferred from the payload. `None` skips the event.
    fn resolve_kind(
        &mut self,
        path: &ObjectPath,
        hint: Option<ObjectKind>,
        properties: &PropertyMap,
    ) -> Result<Option<ObjectKind>, CoreError> {
        if let Some(registered) = self.graph.registry.kind_of(path) {
            if let Some(hint) = hint {
                self.admit(path, hint)?;
            }
            return Ok(Some(registered));
        }

        let Some(kind) = hint.or_else(|| infer_kind(properties)) else {
            let names = properties.keys().cloned().collect::<Vec<_>>().join(", ");
            warn!(%path, properties = %names, "cannot infer kind of unseen object, event skipped");
            self.outcome.warnings.push(IngestWarning::UnknownKind {
                path: path.clone(),
                properties: names,
            });
            return Ok(None);
        };
        self.admit(path, kind)?;
        Ok(Some(kind))
    }

    /// Decode every property onto `entity`, recording malformed ones.
    /// Returns the names that were applied.
    fn decode_into<T: Record>(
        &mut self,
        entity: &mut T,
        path: &ObjectPath,
        properties: &PropertyMap,
    ) -> Vec<String> {
        let mut applied = Vec::with_capacity(properties.len());
        for (name, value) in properties {
            match entity.apply_property(name, value) {
                Ok(true) => applied.push(name.clone()),
                Ok(false) => trace!(%path, property = %name, "property not modeled"),
                Err(FieldError { expected, found }) => {
                    warn!(%path, property = %name, expected, %found, "malformed property skipped");
                    self.outcome.warnings.push(IngestWarning::MalformedField {
                        path: path.clone(),
                        property: name.clone(),
                        expected: expected.to_owned(),
                        found,
                    });
                }
            }
        }
        entity.finish();
        applied
    }

    /// Store `new` in place of `old`, then run the tracker hooks. Returns
    /// `false` when reconciliation left nothing to write.
    fn commit<T: Track>(
        &mut self,
        old: Option<Arc<T>>,
        mut new: T,
        properties: &PropertyMap,
        applied: Vec<String>,
    ) -> bool {
        T::reconcile(old.as_deref(), &mut new, properties);

        let change = match &old {
            None => Change::Added,
            Some(prev) if **prev == new => return false,
            Some(_) => Change::Updated { changed: applied },
        };

        let path = new.path().clone();
        let new = Arc::new(new);
        self.graph.put(Arc::clone(&new));
        self.outcome.dirty = true;
        debug!(%path, kind = %T::KIND, change = change.label(), "entity committed");
        self.push(path, T::KIND, change);

        T::after_commit(self, old.as_deref(), &new);
        true
    }

    // ── Tracker-facing helpers ───────────────────────────────────────

    pub(crate) fn push(&mut self, path: ObjectPath, kind: ObjectKind, change: Change) {
        self.outcome.changes.push(PendingChange { path, kind, change });
    }

    pub(crate) fn warn(&mut self, warning: IngestWarning) {
        self.outcome.warnings.push(warning);
    }

    /// Delete access points no remaining device lists in its visible-set.
    pub(crate) fn drop_orphan_access_points<'p>(
        &mut self,
        candidates: impl IntoIterator<Item = &'p ObjectPath>,
    ) {
        for ap in candidates {
            let still_listed = self
                .graph
                .devices
                .values()
                .any(|d| d.access_points().contains(ap));
            if still_listed || self.graph.typed::<AccessPoint>(ap).is_none() {
                continue;
            }
            if self.graph.remove(ap).is_some() {
                debug!(path = %ap, "access point left every visible-set, removed");
                self.outcome.dirty = true;
                self.push(ap.clone(), ObjectKind::AccessPoint, Change::Removed);
            }
        }
    }

    // ── Removal and cascades ─────────────────────────────────────────

    fn remove_object(&mut self, path: &ObjectPath) {
        let Some(entity) = self.graph.remove(path) else {
            trace!(%path, "removal of unknown path ignored");
            return;
        };
        self.outcome.dirty = true;
        self.push(path.clone(), entity.kind(), Change::Removed);

        match &entity {
            Entity::Device(device) => self.cascade_device_removal(device),
            Entity::ActiveConnection(_) => self.cascade_active_connection_removal(path),
            Entity::AccessPoint(_) => self.cascade_access_point_removal(path),
            _ => {}
        }
    }

    fn cascade_device_removal(&mut self, device: &Device) {
        let path = &device.path;

        let touched = self.graph.active_connections.update_where(
            |ac| ac.devices.contains(path),
            |ac| ac.devices.retain(|p| p != path),
        );
        for ac in touched {
            self.push_cascade(ac, ObjectKind::ActiveConnection, &["Devices"]);
        }

        // Slave connections name their master device.
        let touched = self.graph.active_connections.update_where(
            |ac| ac.master.as_ref() == Some(path),
            |ac| ac.master = None,
        );
        for ac in touched {
            self.push_cascade(ac, ObjectKind::ActiveConnection, &["Master"]);
        }

        let mut manager_edits = Vec::new();
        self.graph.managers.update_where(
            |m| m.devices.contains(path) || m.all_devices.contains(path),
            |m| {
                let mut names = Vec::new();
                if m.devices.contains(path) {
                    m.devices.retain(|p| p != path);
                    names.push("Devices");
                }
                if m.all_devices.contains(path) {
                    m.all_devices.retain(|p| p != path);
                    names.push("AllDevices");
                }
                manager_edits.push((m.path.clone(), names));
            },
        );
        for (mgr, names) in manager_edits {
            self.push_cascade(mgr, ObjectKind::Manager, &names);
        }

        self.drop_orphan_access_points(device.access_points());
    }

    fn cascade_active_connection_removal(&mut self, path: &ObjectPath) {
        let touched = self.graph.devices.update_where(
            |d| d.active_connection.as_ref() == Some(path),
            |d| d.active_connection = None,
        );
        for dev in touched {
            self.push_cascade(dev, ObjectKind::Device, &["ActiveConnection"]);
        }

        let touched = self.graph.active_connections.update_where(
            |ac| ac.master.as_ref() == Some(path),
            |ac| ac.master = None,
        );
        for ac in touched {
            self.push_cascade(ac, ObjectKind::ActiveConnection, &["Master"]);
        }

        let mut manager_edits = Vec::new();
        self.graph.managers.update_where(
            |m| {
                m.active_connections.contains(path)
                    || m.primary_connection.as_ref() == Some(path)
                    || m.activating_connection.as_ref() == Some(path)
            },
            |m| {
                let mut names = Vec::new();
                if m.active_connections.contains(path) {
                    m.active_connections.retain(|p| p != path);
                    names.push("ActiveConnections");
                }
                if m.primary_connection.as_ref() == Some(path) {
                    m.primary_connection = None;
                    names.push("PrimaryConnection");
                }
                if m.activating_connection.as_ref() == Some(path) {
                    m.activating_connection = None;
                    names.push("ActivatingConnection");
                }
                manager_edits.push((m.path.clone(), names));
            },
        );
        for (mgr, names) in manager_edits {
            self.push_cascade(mgr, ObjectKind::Manager, &names);
        }
    }

    fn cascade_access_point_removal(&mut self, path: &ObjectPath) {
        let mut edits = Vec::new();
        self.graph.devices.update_where(
            |d| {
                d.wireless.as_ref().is_some_and(|w| {
                    w.access_points.contains(path) || w.active_access_point.as_ref() == Some(path)
                })
            },
            |d| {
                let mut names = Vec::new();
                if let Some(w) = d.wireless.as_mut() {
                    if w.access_points.contains(path) {
                        w.access_points.retain(|p| p != path);
                        names.push("AccessPoints");
                    }
                    if w.active_access_point.as_ref() == Some(path) {
                        w.active_access_point = None;
                        names.push("ActiveAccessPoint");
                    }
                }
                edits.push((d.path.clone(), names));
            },
        );
        for (dev, names) in edits {
            self.push_cascade(dev, ObjectKind::Device, &names);
        }
    }

    fn push_cascade(&mut self, path: ObjectPath, kind: ObjectKind, names: &[&str]) {
        debug!(%path, %kind, fields = ?names, "reference cleared by cascade");
        self.push(
            path,
            kind,
            Change::Updated {
                changed: names.iter().map(|n| (*n).to_owned()).collect(),
            },
        );
    }
}

// ── Per-kind entry points ──────────────────────────────────────────

/// `ObjectAdded` is authoritative: the entity is rebuilt from the payload
/// alone, replacing whatever was known before.
fn add_object<T: Track>(ingest: &mut Ingest<'_>, path: &ObjectPath, properties: &PropertyMap) {
    let registry = &mut ingest.graph.registry;
    let was_degraded = registry.is_degraded(path);
    if registry.upsert(path, T::KIND, false).is_err() {
        // `admit` already checked; nothing can have changed since.
        return;
    }
    registry.mark_complete(path);
    if was_degraded {
        debug!(%path, "degraded entity replaced by authoritative add");
        ingest.outcome.dirty = true;
    }

    let old = ingest.graph.typed::<T>(path).cloned();
    let mut fresh = T::new(path.clone());
    let applied = ingest.decode_into(&mut fresh, path, properties);
    ingest.commit(old, fresh, properties, applied);
}

/// `PropertiesChanged` replaces only the named fields. Unseen paths are
/// admitted as degraded entities.
fn update_object<T: Track>(ingest: &mut Ingest<'_>, path: &ObjectPath, properties: &PropertyMap) {
    let old = ingest.graph.typed::<T>(path).cloned();

    if old.is_none() {
        if ingest.graph.registry.upsert(path, T::KIND, true).is_err() {
            return;
        }
        debug!(%path, kind = %T::KIND, "admitted degraded entity from property change");
        ingest.outcome.dirty = true;
    }

    let terminal = old.as_deref().is_some_and(T::is_terminal);

    let mut draft = old
        .as_deref()
        .cloned()
        .unwrap_or_else(|| T::new(path.clone()));
    let applied = ingest.decode_into(&mut draft, path, properties);

    if ingest.graph.registry.note_seen(
        path,
        applied.iter().map(String::as_str),
        defining_properties(T::KIND),
    ) {
        debug!(%path, "degraded entity now complete");
        ingest.outcome.dirty = true;
    }

    // Only real changes after a terminal state are flagged.
    if ingest.commit(old, draft, properties, applied) && terminal {
        warn!(%path, "property change after terminal state, applied anyway");
        ingest.warn(IngestWarning::PostTerminalUpdate { path: path.clone() });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::error::Conflict;
    use crate::model::DeviceState;

    fn props(value: serde_json::Value) -> PropertyMap {
        value.as_object().cloned().unwrap()
    }

    fn added(path: &str, kind: ObjectKind, properties: serde_json::Value) -> ChangeEvent {
        ChangeEvent::ObjectAdded {
            path: ObjectPath::new(path),
            kind,
            properties: props(properties),
        }
    }

    fn changed(path: &str, properties: serde_json::Value) -> ChangeEvent {
        ChangeEvent::PropertiesChanged {
            path: ObjectPath::new(path),
            kind_hint: None,
            properties: props(properties),
        }
    }

    fn removed(path: &str) -> ChangeEvent {
        ChangeEvent::ObjectRemoved {
            path: ObjectPath::new(path),
        }
    }

    fn labels(outcome: &IngestOutcome) -> Vec<(&str, &'static str)> {
        outcome
            .changes
            .iter()
            .map(|c| (c.path.as_str(), c.change.label()))
            .collect()
    }

    #[test]
    fn malformed_field_does_not_block_the_rest() {
        let mut graph = Graph::default();
        let outcome = ingest_event(
            &mut graph,
            &added(
                "/dev/0",
                ObjectKind::Device,
                json!({ "Interface": "eth0", "Mtu": "nope", "Managed": true }),
            ),
        )
        .unwrap();

        let dev = graph.typed::<Device>(&ObjectPath::new("/dev/0")).unwrap();
        assert_eq!(dev.interface.as_deref(), Some("eth0"));
        assert!(dev.managed);
        assert_eq!(dev.mtu, 0);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].label(), "malformed_field");
    }

    #[test]
    fn kind_conflict_leaves_graph_untouched() {
        let mut graph = Graph::default();
        ingest_event(&mut graph, &added("/x", ObjectKind::Device, json!({}))).unwrap();

        let err = ingest_event(&mut graph, &added("/x", ObjectKind::AccessPoint, json!({})))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::ConsistencyViolation {
                conflict: Conflict::KindMismatch { .. },
                ..
            }
        ));
        assert!(graph.typed::<Device>(&ObjectPath::new("/x")).is_some());
        assert!(graph.access_points.is_empty());
    }

    #[test]
    fn kind_hint_conflicting_with_registration_is_rejected() {
        let mut graph = Graph::default();
        ingest_event(&mut graph, &added("/x", ObjectKind::Device, json!({}))).unwrap();
        let event = ChangeEvent::PropertiesChanged {
            path: ObjectPath::new("/x"),
            kind_hint: Some(ObjectKind::Settings),
            properties: props(json!({ "Hostname": "box" })),
        };
        assert!(ingest_event(&mut graph, &event).is_err());
    }

    #[test]
    fn second_manager_is_rejected() {
        let mut graph = Graph::default();
        ingest_event(&mut graph, &added("/mgr", ObjectKind::Manager, json!({}))).unwrap();
        let err = ingest_event(&mut graph, &added("/mgr2", ObjectKind::Manager, json!({})))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::ConsistencyViolation {
                conflict: Conflict::SingletonTaken { .. },
                ..
            }
        ));
    }

    #[test]
    fn unknown_kind_is_skipped_with_warning() {
        let mut graph = Graph::default();
        let outcome = ingest_event(&mut graph, &changed("/mystery", json!({ "State": 3 }))).unwrap();
        assert!(!outcome.dirty);
        assert!(graph.is_empty());
        assert!(matches!(
            outcome.warnings.as_slice(),
            [IngestWarning::UnknownKind { .. }]
        ));
    }

    #[test]
    fn identical_update_is_a_noop() {
        let mut graph = Graph::default();
        ingest_event(&mut graph, &added("/dev/0", ObjectKind::Device, json!({ "Mtu": 1500 })))
            .unwrap();
        let first = ingest_event(&mut graph, &changed("/dev/0", json!({ "Mtu": 9000 }))).unwrap();
        assert!(first.dirty);
        let second = ingest_event(&mut graph, &changed("/dev/0", json!({ "Mtu": 9000 }))).unwrap();
        assert!(!second.dirty);
        assert!(second.changes.is_empty());
    }

    #[test]
    fn device_removal_cascades() {
        let mut graph = Graph::default();
        for event in [
            added("/mgr", ObjectKind::Manager, json!({ "Devices": ["/dev/0"], "AllDevices": ["/dev/0"] })),
            added("/dev/0", ObjectKind::Device, json!({ "DeviceType": 2, "AccessPoints": ["/ap/1"] })),
            added("/ap/1", ObjectKind::AccessPoint, json!({ "Strength": 50 })),
            added("/ac/0", ObjectKind::ActiveConnection, json!({ "Devices": ["/dev/0"] })),
        ] {
            ingest_event(&mut graph, &event).unwrap();
        }

        let outcome = ingest_event(&mut graph, &removed("/dev/0")).unwrap();
        assert_eq!(
            labels(&outcome),
            vec![
                ("/dev/0", "removed"),
                ("/ac/0", "updated"),
                ("/mgr", "updated"),
                ("/ap/1", "removed"),
            ]
        );

        let ac = graph
            .typed::<ActiveConnection>(&ObjectPath::new("/ac/0"))
            .unwrap();
        assert!(ac.devices.is_empty());
        let mgr = graph.typed::<Manager>(&ObjectPath::new("/mgr")).unwrap();
        assert!(mgr.devices.is_empty() && mgr.all_devices.is_empty());
        assert!(!graph.exists(&ObjectPath::new("/ap/1")));
    }

    #[test]
    fn active_connection_removal_clears_references() {
        let mut graph = Graph::default();
        for event in [
            added("/mgr", ObjectKind::Manager, json!({
                "ActiveConnections": ["/ac/0"],
                "PrimaryConnection": "/ac/0",
                "ActivatingConnection": "/"
            })),
            added("/dev/0", ObjectKind::Device, json!({ "ActiveConnection": "/ac/0" })),
            added("/ac/0", ObjectKind::ActiveConnection, json!({})),
            added("/ac/vpn", ObjectKind::ActiveConnection, json!({ "Vpn": true, "Master": "/ac/0" })),
        ] {
            ingest_event(&mut graph, &event).unwrap();
        }

        ingest_event(&mut graph, &removed("/ac/0")).unwrap();

        let dev = graph.typed::<Device>(&ObjectPath::new("/dev/0")).unwrap();
        assert!(dev.active_connection.is_none());
        let vpn = graph
            .typed::<ActiveConnection>(&ObjectPath::new("/ac/vpn"))
            .unwrap();
        assert!(vpn.master.is_none());
        let mgr = graph.typed::<Manager>(&ObjectPath::new("/mgr")).unwrap();
        assert!(mgr.active_connections.is_empty());
        assert!(mgr.primary_connection.is_none());
    }

    #[test]
    fn removing_unknown_path_is_noop() {
        let mut graph = Graph::default();
        let outcome = ingest_event(&mut graph, &removed("/nothing")).unwrap();
        assert!(!outcome.dirty);
        assert!(outcome.changes.is_empty());
    }

    #[test]
    fn degraded_entity_completes_from_property_changes() {
        let mut graph = Graph::default();
        ingest_event(&mut graph, &changed("/dev/9", json!({ "Interface": "eth9" }))).unwrap();
        assert!(graph.registry.is_degraded(&ObjectPath::new("/dev/9")));

        ingest_event(
            &mut graph,
            &changed("/dev/9", json!({ "DeviceType": 1, "State": 30 })),
        )
        .unwrap();
        assert!(!graph.registry.is_degraded(&ObjectPath::new("/dev/9")));
        let dev = graph.typed::<Device>(&ObjectPath::new("/dev/9")).unwrap();
        assert_eq!(dev.state, DeviceState::Disconnected);
        assert_eq!(dev.interface.as_deref(), Some("eth9"));
    }
}
