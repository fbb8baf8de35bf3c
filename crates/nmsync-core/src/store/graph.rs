// ── Entity graph ──
//
// One immutable generation of the mirrored object graph. Writers clone the
// current generation, mutate the draft and publish it whole.

use std::sync::Arc;

use nmsync_bus::{ObjectKind, ObjectPath};

use super::collection::Collection;
use super::registry::PathRegistry;
use crate::decode::Decode;
use crate::model::{
    AccessPoint, ActiveConnection, Device, Dhcp4Config, Dhcp6Config, Entity, Ip4Config,
    Ip6Config, Manager, Settings,
};

/// Ties a record type to its kind and its collection in the graph.
pub(crate) trait Record: Decode + Clone + PartialEq + Send + Sync + 'static {
    const KIND: ObjectKind;

    fn new(path: ObjectPath) -> Self;
    fn path(&self) -> &ObjectPath;
    fn collection(graph: &Graph) -> &Collection<Self>;
    fn collection_mut(graph: &mut Graph) -> &mut Collection<Self>;
    fn wrap(entity: Arc<Self>) -> Entity;
}

macro_rules! impl_record {
    ($ty:ident, $field:ident) => {
        impl Record for $ty {
            const KIND: ObjectKind = ObjectKind::$ty;

            fn new(path: ObjectPath) -> Self {
                $ty::new(path)
            }

            fn path(&self) -> &ObjectPath {
                &self.path
            }

            fn collection(graph: &Graph) -> &Collection<Self> {
                &graph.$field
            }

            fn collection_mut(graph: &mut Graph) -> &mut Collection<Self> {
                &mut graph.$field
            }

            fn wrap(entity: Arc<Self>) -> Entity {
                Entity::$ty(entity)
            }
        }
    };
}

impl_record!(Manager, managers);
impl_record!(Settings, settings);
impl_record!(Device, devices);
impl_record!(AccessPoint, access_points);
impl_record!(ActiveConnection, active_connections);
impl_record!(Ip4Config, ip4_configs);
impl_record!(Ip6Config, ip6_configs);
impl_record!(Dhcp4Config, dhcp4_configs);
impl_record!(Dhcp6Config, dhcp6_configs);

#[derive(Debug, Clone, Default)]
pub(crate) struct Graph {
    pub(crate) generation: u64,
    pub(crate) registry: PathRegistry,

    pub(crate) managers: Collection<Manager>,
    pub(crate) settings: Collection<Settings>,
    pub(crate) devices: Collection<Device>,
    pub(crate) access_points: Collection<AccessPoint>,
    pub(crate) active_connections: Collection<ActiveConnection>,
    pub(crate) ip4_configs: Collection<Ip4Config>,
    pub(crate) ip6_configs: Collection<Ip6Config>,
    pub(crate) dhcp4_configs: Collection<Dhcp4Config>,
    pub(crate) dhcp6_configs: Collection<Dhcp6Config>,
}

impl Graph {
    pub fn get(&self, path: &ObjectPath) -> Option<Entity> {
        match self.registry.kind_of(path)? {
            ObjectKind::Manager => self.lookup::<Manager>(path),
            ObjectKind::Settings => self.lookup::<Settings>(path),
            ObjectKind::Device => self.lookup::<Device>(path),
            ObjectKind::AccessPoint => self.lookup::<AccessPoint>(path),
            ObjectKind::ActiveConnection => self.lookup::<ActiveConnection>(path),
            ObjectKind::Ip4Config => self.lookup::<Ip4Config>(path),
            ObjectKind::Ip6Config => self.lookup::<Ip6Config>(path),
            ObjectKind::Dhcp4Config => self.lookup::<Dhcp4Config>(path),
            ObjectKind::Dhcp6Config => self.lookup::<Dhcp6Config>(path),
        }
    }

    fn lookup<T: Record>(&self, path: &ObjectPath) -> Option<Entity> {
        T::collection(self).get(path).cloned().map(T::wrap)
    }

    pub fn typed<T: Record>(&self, path: &ObjectPath) -> Option<&Arc<T>> {
        T::collection(self).get(path)
    }

    pub fn exists(&self, path: &ObjectPath) -> bool {
        self.registry.exists(path)
    }

    pub fn put<T: Record>(&mut self, entity: Arc<T>) -> Option<Arc<T>> {
        let path = entity.path().clone();
        T::collection_mut(self).insert(path, entity)
    }

    /// Drop the entity and its registration. Unknown paths are a no-op.
    pub fn remove(&mut self, path: &ObjectPath) -> Option<Entity> {
        let registration = self.registry.remove(path)?;
        match registration.kind {
            ObjectKind::Manager => self.take::<Manager>(path),
            ObjectKind::Settings => self.take::<Settings>(path),
            ObjectKind::Device => self.take::<Device>(path),
            ObjectKind::AccessPoint => self.take::<AccessPoint>(path),
            ObjectKind::ActiveConnection => self.take::<ActiveConnection>(path),
            ObjectKind::Ip4Config => self.take::<Ip4Config>(path),
            ObjectKind::Ip6Config => self.take::<Ip6Config>(path),
            ObjectKind::Dhcp4Config => self.take::<Dhcp4Config>(path),
            ObjectKind::Dhcp6Config => self.take::<Dhcp6Config>(path),
        }
    }

    fn take<T: Record>(&mut self, path: &ObjectPath) -> Option<Entity> {
        T::collection_mut(self).remove(path).map(T::wrap)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Every entity, ordered by path.
    pub fn entities(&self) -> Vec<Entity> {
        let mut paths: Vec<&ObjectPath> = self.registry.iter().map(|(p, _)| p).collect();
        paths.sort();
        paths.into_iter().filter_map(|p| self.get(p)).collect()
    }
}
