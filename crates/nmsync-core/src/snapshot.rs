// ── Point-in-time graph views ──
//
// A `Snapshot` pins one published generation. Ingestion publishes new
// generations beside it; the pinned one stays intact until the last
// holder drops it.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use nmsync_bus::{ObjectKind, ObjectPath};

use crate::error::CoreError;
use crate::model::{
    AccessPoint, ActiveConnection, Device, Dhcp4Config, Dhcp6Config, Entity, Ip4Config,
    Ip6Config, Manager, Settings,
};
use crate::store::{Graph, Record};

/// An immutable view of the whole graph at one generation.
#[derive(Debug, Clone)]
pub struct Snapshot {
    graph: Arc<Graph>,
}

impl Snapshot {
    pub(crate) fn new(graph: Arc<Graph>) -> Self {
        Self { graph }
    }

    /// Starts at 0 for the empty graph; bumped once per state-changing event.
    pub fn generation(&self) -> u64 {
        self.graph.generation
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn exists(&self, path: &ObjectPath) -> bool {
        self.graph.exists(path)
    }

    pub fn kind_of(&self, path: &ObjectPath) -> Option<ObjectKind> {
        self.graph.registry.kind_of(path)
    }

    /// Whether the entity was created from a property change and has not
    /// yet been confirmed by an add or a full property set.
    pub fn is_degraded(&self, path: &ObjectPath) -> bool {
        self.graph.registry.is_degraded(path)
    }

    pub fn get(&self, path: &ObjectPath) -> Option<Entity> {
        self.graph.get(path)
    }

    /// Like [`get`](Self::get), but a missing path is an error.
    pub fn require(&self, path: &ObjectPath) -> Result<Entity, CoreError> {
        self.get(path)
            .ok_or_else(|| CoreError::NotFound { path: path.clone() })
    }

    /// Every entity, ordered by path.
    pub fn entities(&self) -> Vec<Entity> {
        self.graph.entities()
    }

    /// Entities of one kind, ordered by path.
    pub fn entities_of(&self, kind: ObjectKind) -> Vec<Entity> {
        self.entities()
            .into_iter()
            .filter(|e| e.kind() == kind)
            .collect()
    }

    // ── Typed access ─────────────────────────────────────────────────

    pub fn manager(&self) -> Option<&Arc<Manager>> {
        self.graph.managers.values().next()
    }

    pub fn settings(&self) -> Option<&Arc<Settings>> {
        self.graph.settings.values().next()
    }

    pub fn device(&self, path: &ObjectPath) -> Option<&Arc<Device>> {
        self.graph.typed(path)
    }

    pub fn access_point(&self, path: &ObjectPath) -> Option<&Arc<AccessPoint>> {
        self.graph.typed(path)
    }

    pub fn active_connection(&self, path: &ObjectPath) -> Option<&Arc<ActiveConnection>> {
        self.graph.typed(path)
    }

    pub fn ip4_config(&self, path: &ObjectPath) -> Option<&Arc<Ip4Config>> {
        self.graph.typed(path)
    }

    pub fn ip6_config(&self, path: &ObjectPath) -> Option<&Arc<Ip6Config>> {
        self.graph.typed(path)
    }

    pub fn dhcp4_config(&self, path: &ObjectPath) -> Option<&Arc<Dhcp4Config>> {
        self.graph.typed(path)
    }

    pub fn dhcp6_config(&self, path: &ObjectPath) -> Option<&Arc<Dhcp6Config>> {
        self.graph.typed(path)
    }

    pub fn devices(&self) -> Vec<&Arc<Device>> {
        sorted(self.graph.devices.values())
    }

    pub fn access_points(&self) -> Vec<&Arc<AccessPoint>> {
        sorted(self.graph.access_points.values())
    }

    pub fn active_connections(&self) -> Vec<&Arc<ActiveConnection>> {
        sorted(self.graph.active_connections.values())
    }

    // ── Reference resolution ─────────────────────────────────────────
    //
    // Dangling references resolve to `None`.

    pub fn resolve_active_connection(&self, device: &Device) -> Option<&Arc<ActiveConnection>> {
        device
            .active_connection
            .as_ref()
            .and_then(|p| self.active_connection(p))
    }

    pub fn ip4_config_of(&self, device: &Device) -> Option<&Arc<Ip4Config>> {
        device.configs.ip4.as_ref().and_then(|p| self.ip4_config(p))
    }

    pub fn ip6_config_of(&self, device: &Device) -> Option<&Arc<Ip6Config>> {
        device.configs.ip6.as_ref().and_then(|p| self.ip6_config(p))
    }

    pub fn dhcp4_config_of(&self, device: &Device) -> Option<&Arc<Dhcp4Config>> {
        device
            .configs
            .dhcp4
            .as_ref()
            .and_then(|p| self.dhcp4_config(p))
    }

    /// The visible-set of a wireless device, skipping unknown paths.
    pub fn visible_access_points(&self, device: &Device) -> Vec<&Arc<AccessPoint>> {
        device
            .access_points()
            .iter()
            .filter_map(|p| self.access_point(p))
            .collect()
    }

    pub fn active_access_point(&self, device: &Device) -> Option<&Arc<AccessPoint>> {
        device
            .wireless
            .as_ref()
            .and_then(|w| w.active_access_point.as_ref())
            .and_then(|p| self.access_point(p))
    }

    /// A VPN's master may be a device or another active connection.
    pub fn resolve_master(&self, connection: &ActiveConnection) -> Option<Entity> {
        connection.master.as_ref().and_then(|p| self.get(p))
    }

    /// Entities reachable from `root` within `depth` reference hops.
    pub fn subgraph(&self, root: &ObjectPath, depth: usize) -> Result<Subgraph, CoreError> {
        let root_entity = self.require(root)?;

        let mut entities = BTreeMap::new();
        entities.insert(root.clone(), root_entity.clone());
        let mut queue = VecDeque::from([(root_entity, 0usize)]);

        while let Some((entity, level)) = queue.pop_front() {
            if level >= depth {
                continue;
            }
            for reference in entity.references() {
                if entities.contains_key(&reference) {
                    continue;
                }
                if let Some(next) = self.get(&reference) {
                    entities.insert(reference, next.clone());
                    queue.push_back((next, level + 1));
                }
            }
        }

        Ok(Subgraph {
            root: root.clone(),
            depth,
            generation: self.generation(),
            entities,
        })
    }
}

fn sorted<'a, T: Record>(values: impl Iterator<Item = &'a Arc<T>>) -> Vec<&'a Arc<T>> {
    let mut out: Vec<&Arc<T>> = values.collect();
    out.sort_by(|a, b| a.path().cmp(b.path()));
    out
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Snapshot", 2)?;
        state.serialize_field("generation", &self.generation())?;
        state.serialize_field("entities", &self.entities())?;
        state.end()
    }
}

/// The part of a snapshot reachable from one root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subgraph {
    pub root: ObjectPath,
    pub depth: usize,
    pub generation: u64,
    pub entities: BTreeMap<ObjectPath, Entity>,
}

impl Subgraph {
    pub fn contains(&self, path: &ObjectPath) -> bool {
        self.entities.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::ingest::ingest_event;
    use nmsync_bus::ChangeEvent;

    fn build(events: &[(&str, ObjectKind, serde_json::Value)]) -> Snapshot {
        let mut graph = Graph::default();
        for (path, kind, props) in events {
            let event = ChangeEvent::ObjectAdded {
                path: ObjectPath::new(*path),
                kind: *kind,
                properties: props.as_object().cloned().unwrap(),
            };
            ingest_event(&mut graph, &event).unwrap();
        }
        Snapshot::new(Arc::new(graph))
    }

    fn sample() -> Snapshot {
        build(&[
            ("/mgr", ObjectKind::Manager, json!({ "Devices": ["/dev/0"], "ActiveConnections": ["/ac/0"] })),
            (
                "/dev/0",
                ObjectKind::Device,
                json!({
                    "DeviceType": 2,
                    "State": 100,
                    "ActiveConnection": "/ac/0",
                    "Ip4Config": "/ip4/0",
                    "AccessPoints": ["/ap/1", "/ap/gone"]
                }),
            ),
            ("/ac/0", ObjectKind::ActiveConnection, json!({ "Devices": ["/dev/0"] })),
            ("/ap/1", ObjectKind::AccessPoint, json!({ "Strength": 70 })),
            ("/ip4/0", ObjectKind::Ip4Config, json!({ "Gateway": "10.0.0.1" })),
        ])
    }

    #[test]
    fn missing_path_is_not_found() {
        let snap = sample();
        let err = snap.require(&ObjectPath::new("/nope")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert!(snap.subgraph(&ObjectPath::new("/nope"), 2).is_err());
    }

    #[test]
    fn typed_resolution_skips_dangling_references() {
        let snap = sample();
        let dev = snap.device(&ObjectPath::new("/dev/0")).unwrap();

        assert_eq!(
            snap.resolve_active_connection(dev).unwrap().path,
            ObjectPath::new("/ac/0")
        );
        assert!(snap.ip4_config_of(dev).is_some());
        assert_eq!(snap.visible_access_points(dev).len(), 1);
        assert!(snap.manager().is_some());
        assert!(snap.settings().is_none());
    }

    #[test]
    fn subgraph_respects_depth() {
        let snap = sample();
        let mgr = ObjectPath::new("/mgr");

        let zero = snap.subgraph(&mgr, 0).unwrap();
        assert_eq!(zero.len(), 1);

        let one = snap.subgraph(&mgr, 1).unwrap();
        assert!(one.contains(&ObjectPath::new("/dev/0")));
        assert!(one.contains(&ObjectPath::new("/ac/0")));
        assert!(!one.contains(&ObjectPath::new("/ap/1")));

        let two = snap.subgraph(&mgr, 2).unwrap();
        assert!(two.contains(&ObjectPath::new("/ap/1")));
        assert!(two.contains(&ObjectPath::new("/ip4/0")));
        assert!(!two.contains(&ObjectPath::new("/ap/gone")));
    }

    #[test]
    fn entities_are_ordered_by_path() {
        let snap = sample();
        let paths: Vec<String> = snap
            .entities()
            .iter()
            .map(|e| e.path().to_string())
            .collect();
        let mut expected = paths.clone();
        expected.sort();
        assert_eq!(paths, expected);
        assert_eq!(snap.entities_of(ObjectKind::AccessPoint).len(), 1);
    }

    #[test]
    fn serializes_generation_and_entities() {
        let snap = sample();
        let value = serde_json::to_value(&snap).unwrap();
        assert_eq!(value["generation"], 0);
        assert_eq!(value["entities"].as_array().unwrap().len(), 5);
        assert_eq!(value["entities"][0]["kind"], "ActiveConnection");
    }
}
