// ── Path registry ──
//
// One namespace for every kind: a path resolves to at most one kind at a
// time. This is the only place paths are admitted or retired.

use std::collections::{BTreeSet, HashMap};

use nmsync_bus::{ObjectKind, ObjectPath};

use crate::error::Conflict;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Registration {
    pub kind: ObjectKind,
    /// Defining properties seen so far, while the entity is degraded.
    pub pending: Option<BTreeSet<String>>,
}

impl Registration {
    pub fn is_degraded(&self) -> bool {
        self.pending.is_some()
    }
}

/// Outcome of a successful [`PathRegistry::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    New,
    Existing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PathRegistry {
    entries: HashMap<ObjectPath, Registration>,
    /// Current holder of each singleton kind.
    singletons: HashMap<ObjectKind, ObjectPath>,
}

impl PathRegistry {
    /// Admit `path` as `kind`. Re-admitting with the same kind is a no-op.
    pub fn upsert(
        &mut self,
        path: &ObjectPath,
        kind: ObjectKind,
        degraded: bool,
    ) -> Result<Admission, Conflict> {
        if let Some(existing) = self.entries.get(path) {
            return if existing.kind == kind {
                Ok(Admission::Existing)
            } else {
                Err(Conflict::KindMismatch {
                    registered: existing.kind,
                    claimed: kind,
                })
            };
        }

        if kind.is_singleton() {
            if let Some(holder) = self.singletons.get(&kind) {
                return Err(Conflict::SingletonTaken {
                    kind,
                    holder: holder.clone(),
                });
            }
            self.singletons.insert(kind, path.clone());
        }

        self.entries.insert(
            path.clone(),
            Registration {
                kind,
                pending: degraded.then(BTreeSet::new),
            },
        );
        Ok(Admission::New)
    }

    /// Check whether `upsert` would succeed, without admitting anything.
    pub fn check(&self, path: &ObjectPath, kind: ObjectKind) -> Result<(), Conflict> {
        match self.entries.get(path) {
            Some(existing) if existing.kind != kind => Err(Conflict::KindMismatch {
                registered: existing.kind,
                claimed: kind,
            }),
            Some(_) => Ok(()),
            None => match self.singletons.get(&kind) {
                Some(holder) if kind.is_singleton() => Err(Conflict::SingletonTaken {
                    kind,
                    holder: holder.clone(),
                }),
                _ => Ok(()),
            },
        }
    }

    /// Retire `path`. Unknown paths are a no-op.
    pub fn remove(&mut self, path: &ObjectPath) -> Option<Registration> {
        let removed = self.entries.remove(path)?;
        if removed.kind.is_singleton() {
            self.singletons.remove(&removed.kind);
        }
        Some(removed)
    }

    pub fn get(&self, path: &ObjectPath) -> Option<&Registration> {
        self.entries.get(path)
    }

    pub fn kind_of(&self, path: &ObjectPath) -> Option<ObjectKind> {
        self.entries.get(path).map(|r| r.kind)
    }

    pub fn exists(&self, path: &ObjectPath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn is_degraded(&self, path: &ObjectPath) -> bool {
        self.entries.get(path).is_some_and(Registration::is_degraded)
    }

    pub fn mark_complete(&mut self, path: &ObjectPath) {
        if let Some(entry) = self.entries.get_mut(path) {
            entry.pending = None;
        }
    }

    /// Record property names seen for a degraded path. Once every name in
    /// `defining` has been seen the entry is complete; returns `true` then.
    pub fn note_seen<'a>(
        &mut self,
        path: &ObjectPath,
        names: impl IntoIterator<Item = &'a str>,
        defining: &[&str],
    ) -> bool {
        let Some(entry) = self.entries.get_mut(path) else {
            return false;
        };
        let Some(pending) = entry.pending.as_mut() else {
            return false;
        };
        pending.extend(
            names
                .into_iter()
                .filter(|n| defining.contains(n))
                .map(str::to_owned),
        );
        if defining.iter().all(|d| pending.contains(*d)) {
            entry.pending = None;
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectPath, &Registration)> {
        self.entries.iter()
    }
}
