//! Transport boundary for the nmsync state synchronization engine.
//!
//! The engine never speaks a wire protocol itself. Everything it needs from
//! the remote network-management service arrives through this crate:
//!
//! - **[`ObjectPath`] / [`ObjectKind`]** - opaque remote identity and the
//!   closed set of entity kinds the engine mirrors.
//! - **[`ChangeEvent`]** - the three ordered event variants a transport
//!   delivers (`ObjectAdded`, `ObjectRemoved`, `PropertiesChanged`).
//! - **[`BusSession`]** - initial bulk enumeration plus the ordered event
//!   stream. [`ChannelSession`] feeds it in-process, [`ReplaySession`] reads
//!   a JSON-lines capture.
//! - **[`CommandChannel`]** - request/response pass-through for remote
//!   commands (activate, deactivate, scan). Replies are opaque.

pub mod command;
pub mod error;
pub mod event;
pub mod path;
pub mod replay;
pub mod session;

pub use command::{CommandChannel, RemoteCall};
pub use error::Error;
pub use event::{ChangeEvent, PropertyMap, RemoteObject};
pub use path::{ObjectKind, ObjectPath};
pub use replay::ReplaySession;
pub use session::{BusFeeder, BusSession, ChannelSession};
