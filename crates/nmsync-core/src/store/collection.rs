// ── Typed entity collection ──
//
// One per entity kind inside a graph generation. Entries are `Arc`s so a
// new generation shares every untouched entity with the previous one.

use std::collections::HashMap;
use std::sync::Arc;

use nmsync_bus::ObjectPath;

#[derive(Debug)]
pub(crate) struct Collection<T> {
    by_path: HashMap<ObjectPath, Arc<T>>,
}

// Manual impls: cloning the map only clones `Arc`s, so `T: Clone` is not needed.
impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            by_path: self.by_path.clone(),
        }
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            by_path: HashMap::new(),
        }
    }
}

impl<T> Collection<T> {
    /// Insert or replace. Returns the previous entity, if any.
    pub fn insert(&mut self, path: ObjectPath, entity: Arc<T>) -> Option<Arc<T>> {
        self.by_path.insert(path, entity)
    }

    pub fn remove(&mut self, path: &ObjectPath) -> Option<Arc<T>> {
        self.by_path.remove(path)
    }

    pub fn get(&self, path: &ObjectPath) -> Option<&Arc<T>> {
        self.by_path.get(path)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &Arc<T>> {
        self.by_path.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &ObjectPath> {
        self.by_path.keys()
    }

    /// Mutate every entity matching `pred`, copying only those.
    /// Returns the paths that were touched.
    pub fn update_where(
        &mut self,
        pred: impl Fn(&T) -> bool,
        mut edit: impl FnMut(&mut T),
    ) -> Vec<ObjectPath>
    where
        T: Clone,
    {
        let mut touched = Vec::new();
        for (path, entity) in &mut self.by_path {
            if pred(entity) {
                edit(Arc::make_mut(entity));
                touched.push(path.clone());
            }
        }
        touched
    }
}
