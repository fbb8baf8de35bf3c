//! Client-side mirror of a remote network-management object graph.
//!
//! Events from an [`nmsync_bus::BusSession`] are applied in arrival order to
//! an immutable, generation-stamped graph. Readers pin a generation through
//! [`Snapshot`]; subscribers receive per-object notifications through bounded
//! queues.

pub mod config;
mod decode;
pub mod engine;
pub mod error;
mod ingest;
pub mod model;
pub mod snapshot;
mod store;
pub mod stream;
mod tracker;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::EngineConfig;
pub use engine::{Engine, EngineNotice, EngineState};
pub use error::{Conflict, CoreError, DiagnosticRecord, IngestWarning};
pub use snapshot::{Snapshot, Subgraph};
pub use stream::{Change, Notification, Subscription, SubscriptionFilter, SubscriptionId};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Entities
    AccessPoint, ActiveConnection, Device, Dhcp4Config, Dhcp6Config, Entity, Ip4Config, Ip6Config,
    Manager, Settings,
    // Lifecycle states
    ActiveConnectionState, ActiveConnectionStateReason, ConnectivityState, DeviceState,
    DeviceStateReason, NmState,
    // Supporting types
    AddressData, ConfigRefs, DeviceType, FlagSet, IpConfigData, Metered, RouteData, WifiMode,
};

pub use nmsync_bus::{ChangeEvent, ObjectKind, ObjectPath, PropertyMap, RemoteCall};
