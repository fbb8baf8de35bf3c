// ── Change notification streams ──
//
// Subscribers receive `Notification`s through bounded per-subscriber
// queues. A subscriber that falls behind is dropped; its stream then ends
// and `was_overflowed()` reports why.

mod dispatch;
mod filter;

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use futures_core::Stream;
use serde::Serialize;
use tokio_stream::wrappers::ReceiverStream;

use nmsync_bus::{ObjectKind, ObjectPath};

use crate::model::{ActiveConnectionState, DeviceState, DeviceStateReason};

pub(crate) use dispatch::Dispatcher;
pub use filter::SubscriptionFilter;

/// What happened to an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    Added,
    /// Names of the wire properties (or cascaded fields) that were applied.
    Updated {
        changed: Vec<String>,
    },
    Removed,
    DeviceStateChanged {
        old: DeviceState,
        new: DeviceState,
        reason: DeviceStateReason,
    },
    ActiveConnectionStateChanged {
        old: ActiveConnectionState,
        new: ActiveConnectionState,
        reason: u32,
    },
}

impl Change {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Updated { .. } => "updated",
            Self::Removed => "removed",
            Self::DeviceStateChanged { .. } => "device_state_changed",
            Self::ActiveConnectionStateChanged { .. } => "active_connection_state_changed",
        }
    }
}

/// One change, stamped with the generation that made it visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub generation: u64,
    pub path: ObjectPath,
    pub kind: ObjectKind,
    #[serde(flatten)]
    pub change: Change,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A live feed of notifications matching one filter.
///
/// Ends when the subscriber is removed, overflows, or the engine shuts
/// down. Pending notifications are not drained on shutdown.
pub struct Subscription {
    id: SubscriptionId,
    inner: ReceiverStream<Notification>,
    overflowed: Arc<AtomicBool>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next notification. `None` once the feed has ended.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.inner.as_mut().recv().await
    }

    /// Take a notification if one is already queued.
    pub fn try_recv(&mut self) -> Option<Notification> {
        self.inner.as_mut().try_recv().ok()
    }

    /// Whether the feed was cut off because the queue filled up.
    pub fn was_overflowed(&self) -> bool {
        self.overflowed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("overflowed", &self.was_overflowed())
            .finish_non_exhaustive()
    }
}

impl Stream for Subscription {
    type Item = Notification;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
