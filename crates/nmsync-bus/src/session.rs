//! Bus sessions: initial enumeration plus the ordered event stream.
//!
//! A [`BusSession`] is whatever the transport collaborator hands the
//! engine. The engine calls [`enumerate`](BusSession::enumerate) once,
//! then drains [`next_event`](BusSession::next_event) until it yields
//! `Ok(None)` or the engine shuts down.
//!
//! # Example
//!
//! ```rust,ignore
//! use nmsync_bus::{ChannelSession, ChangeEvent, ObjectKind};
//!
//! let (feeder, session) = ChannelSession::new(Vec::new(), 64);
//! engine.attach(session).await?;
//!
//! feeder.send(ChangeEvent::ObjectRemoved { path: "/dev/3".into() }).await?;
//! ```

use std::future::Future;

use tokio::sync::mpsc;

use crate::error::Error;
use crate::event::{ChangeEvent, RemoteObject};

/// The engine's view of a live transport connection.
///
/// Events must be yielded in transport arrival order; that order is the
/// engine's only notion of happens-before.
pub trait BusSession: Send + 'static {
    /// Bulk enumeration of every object that exists when the session starts.
    fn enumerate(&mut self) -> impl Future<Output = Result<Vec<RemoteObject>, Error>> + Send;

    /// Next event, or `Ok(None)` once the stream has ended cleanly.
    fn next_event(&mut self) -> impl Future<Output = Result<Option<ChangeEvent>, Error>> + Send;
}

// ── ChannelSession ───────────────────────────────────────────────────

/// In-process session fed through a bounded `mpsc` channel.
///
/// Used to embed the engine behind a transport that already lives in the
/// same process, and in tests.
pub struct ChannelSession {
    initial: Option<Vec<RemoteObject>>,
    rx: mpsc::Receiver<ChangeEvent>,
}

/// Sending half of a [`ChannelSession`]. Dropping every feeder ends the session.
#[derive(Clone)]
pub struct BusFeeder {
    tx: mpsc::Sender<ChangeEvent>,
}

impl ChannelSession {
    /// Create a session whose enumeration yields `initial` and whose event
    /// stream buffers up to `capacity` undelivered events.
    pub fn new(initial: Vec<RemoteObject>, capacity: usize) -> (BusFeeder, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            BusFeeder { tx },
            Self {
                initial: Some(initial),
                rx,
            },
        )
    }
}

impl BusSession for ChannelSession {
    async fn enumerate(&mut self) -> Result<Vec<RemoteObject>, Error> {
        // A second enumeration finds nothing new.
        Ok(self.initial.take().unwrap_or_default())
    }

    async fn next_event(&mut self) -> Result<Option<ChangeEvent>, Error> {
        Ok(self.rx.recv().await)
    }
}

impl BusFeeder {
    /// Queue an event, waiting for buffer space.
    pub async fn send(&self, event: ChangeEvent) -> Result<(), Error> {
        self.tx.send(event).await.map_err(|_| Error::Closed)
    }

    /// Queue an event without waiting.
    pub fn try_send(&self, event: ChangeEvent) -> Result<(), Error> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                Error::Transport("session buffer full".into())
            }
            mpsc::error::TrySendError::Closed(_) => Error::Closed,
        })
    }

    /// Whether the receiving session has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::event::PropertyMap;
    use crate::path::{ObjectKind, ObjectPath};

    fn removed(path: &str) -> ChangeEvent {
        ChangeEvent::ObjectRemoved {
            path: ObjectPath::new(path),
        }
    }

    #[tokio::test]
    async fn enumerate_yields_initial_once() {
        let initial = vec![RemoteObject {
            path: ObjectPath::new("/mgr"),
            kind: ObjectKind::Manager,
            properties: PropertyMap::new(),
        }];
        let (_feeder, mut session) = ChannelSession::new(initial, 4);

        assert_eq!(session.enumerate().await.unwrap().len(), 1);
        assert!(session.enumerate().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn events_arrive_in_send_order() {
        let (feeder, mut session) = ChannelSession::new(Vec::new(), 4);
        feeder.send(removed("/a")).await.unwrap();
        feeder.send(removed("/b")).await.unwrap();
        drop(feeder);

        assert_eq!(session.next_event().await.unwrap().unwrap().path().as_str(), "/a");
        assert_eq!(session.next_event().await.unwrap().unwrap().path().as_str(), "/b");
        assert!(session.next_event().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn try_send_reports_full_buffer() {
        let (feeder, _session) = ChannelSession::new(Vec::new(), 1);
        feeder.try_send(removed("/a")).unwrap();
        let err = feeder.try_send(removed("/b")).unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn feeder_detects_dropped_session() {
        let (feeder, session) = ChannelSession::new(Vec::new(), 1);
        drop(session);
        assert!(feeder.is_closed());
        assert!(matches!(feeder.send(removed("/a")).await, Err(Error::Closed)));
    }
}
