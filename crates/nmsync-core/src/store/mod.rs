// ── Entity store ──
//
// Immutable graph generations built from typed per-kind collections and
// the shared path registry.

mod collection;
mod graph;
mod registry;

pub(crate) use collection::Collection;
pub(crate) use graph::{Graph, Record};
pub(crate) use registry::{Admission, PathRegistry};
