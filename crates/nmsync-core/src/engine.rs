// ── Engine facade ──
//
// Owns the published graph, the single writer path, the subscriber
// registry and the background pump that drains a bus session. Cheaply
// cloneable; every clone drives the same engine.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use arc_swap::ArcSwap;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use nmsync_bus::{BusSession, ChangeEvent, CommandChannel, ObjectPath, RemoteCall};

use crate::config::EngineConfig;
use crate::error::{CoreError, DiagnosticRecord, IngestWarning};
use crate::ingest::ingest_event;
use crate::model::Entity;
use crate::snapshot::{Snapshot, Subgraph};
use crate::store::Graph;
use crate::stream::{Dispatcher, Notification, Subscription, SubscriptionFilter, SubscriptionId};

// ── EngineState ──────────────────────────────────────────────────────

/// Lifecycle state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EngineState {
    /// No session attached. Events may still be ingested directly.
    Idle,
    /// Applying the initial enumeration.
    Syncing,
    /// Following the session's event stream.
    Live,
    /// The session ended; the graph holds the last known state.
    SessionEnded,
    /// Ingestion halted, either on a broken data model or a dead transport.
    Failed,
    Closed,
}

/// Engine-level events outside the per-object notification streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum EngineNotice {
    SubscriberOverflow { id: SubscriptionId },
    DataModelBroken { path: ObjectPath },
}

// ── Engine ───────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Ingestion is serialized through one writer lock; readers load the
/// published graph without locking and never see a partial event.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: EngineConfig,
    current: ArcSwap<Graph>,
    writer: Mutex<WriterState>,
    diagnostics: Mutex<VecDeque<DiagnosticRecord>>,
    dispatcher: Dispatcher,
    state: watch::Sender<EngineState>,
    notice_tx: broadcast::Sender<EngineNotice>,
    commands: RwLock<Option<Arc<dyn CommandChannel>>>,
    attached: AtomicBool,
    cancel: CancellationToken,
    task_handles: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

#[derive(Default)]
struct WriterState {
    violations: HashMap<ObjectPath, u32>,
    broken: Option<ObjectPath>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Engine {
    /// Create an empty engine. Nothing runs until a session is
    /// [attached](Self::attach) or events are [ingested](Self::ingest).
    pub fn new(config: EngineConfig) -> Self {
        let (state, _) = watch::channel(EngineState::Idle);
        let (notice_tx, _) = broadcast::channel(config.notice_channel_capacity.max(1));
        let dispatcher = Dispatcher::new(config.subscriber_queue_capacity);

        Self {
            inner: Arc::new(EngineInner {
                diagnostics: Mutex::new(VecDeque::with_capacity(config.diagnostics_capacity)),
                config,
                current: ArcSwap::from_pointee(Graph::default()),
                writer: Mutex::new(WriterState::default()),
                dispatcher,
                state,
                notice_tx,
                commands: RwLock::new(None),
                attached: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                task_handles: tokio::sync::Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Enumerate `session`, ingest every object as a synthetic add, then
    /// follow its event stream in the background.
    ///
    /// Returns the generation reached after the enumeration.
    pub async fn attach<S: BusSession>(&self, mut session: S) -> Result<u64, CoreError> {
        self.ensure_open()?;
        if self.inner.attached.swap(true, Ordering::AcqRel) {
            return Err(CoreError::AlreadyAttached);
        }
        self.inner.set_state(EngineState::Syncing);

        let objects = match session.enumerate().await {
            Ok(objects) => objects,
            Err(e) => {
                self.inner.attached.store(false, Ordering::Release);
                self.inner.set_state(EngineState::Idle);
                return Err(e.into());
            }
        };
        info!(objects = objects.len(), "initial enumeration received");

        for object in objects {
            if let Err(e) = self.ingest_tolerant(&object.into_added_event()) {
                self.inner.set_state(EngineState::Failed);
                return Err(e);
            }
        }

        let generation = self.generation();
        self.inner.set_state(EngineState::Live);
        info!(generation, entities = self.snapshot().len(), "engine live");

        let engine = self.clone();
        let cancel = self.inner.cancel.clone();
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(pump_task(engine, session, cancel)));

        Ok(generation)
    }

    /// Stop the pump, end every subscription and refuse further work.
    /// Queued notifications are not drained.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner.dispatcher.close_all();
        self.inner.set_state(EngineState::Closed);
        info!("engine shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    fn ensure_open(&self) -> Result<(), CoreError> {
        if self.is_closed() {
            Err(CoreError::EngineClosed)
        } else {
            Ok(())
        }
    }

    // ── Ingestion ────────────────────────────────────────────────────

    /// Apply one event and publish the result.
    ///
    /// Returns the generation visible after the event. A rejected event
    /// leaves the graph untouched and returns its `ConsistencyViolation`;
    /// once one path exhausts the retry limit every call returns
    /// `DataModelBroken`.
    pub fn ingest(&self, event: &ChangeEvent) -> Result<u64, CoreError> {
        self.ensure_open()?;
        let inner = &self.inner;
        let mut writer = lock(&inner.writer);

        if let Some(path) = &writer.broken {
            return Err(CoreError::DataModelBroken { path: path.clone() });
        }

        let current = inner.current.load_full();
        let mut draft = Graph::clone(&current);

        let outcome = match ingest_event(&mut draft, event) {
            Ok(outcome) => outcome,
            Err(CoreError::ConsistencyViolation { path, conflict }) => {
                error!(%path, %conflict, event = event.label(), "consistency violation, event rejected");
                inner.record(
                    current.generation,
                    IngestWarning::ConsistencyViolation {
                        path: path.clone(),
                        conflict: conflict.clone(),
                    },
                );

                let count = writer.violations.entry(path.clone()).or_default();
                *count += 1;
                if *count >= inner.config.consistency_retry_limit {
                    error!(%path, violations = *count, "data model broken, ingestion halted");
                    writer.broken = Some(path.clone());
                    inner.set_state(EngineState::Failed);
                    let _ = inner
                        .notice_tx
                        .send(EngineNotice::DataModelBroken { path: path.clone() });
                    return Err(CoreError::DataModelBroken { path });
                }
                return Err(CoreError::ConsistencyViolation { path, conflict });
            }
            Err(other) => return Err(other),
        };
        // Violations only count while consecutive for a path.
        writer.violations.remove(event.path());

        let generation = if outcome.dirty {
            draft.generation = current.generation + 1;
            inner.current.store(Arc::new(draft));
            current.generation + 1
        } else {
            current.generation
        };

        debug!(
            event = event.label(),
            path = %event.path(),
            generation,
            changes = outcome.changes.len(),
            "event applied"
        );

        for warning in outcome.warnings {
            inner.record(generation, warning);
        }

        let batch: Vec<Notification> = outcome
            .changes
            .into_iter()
            .map(|c| Notification {
                generation,
                path: c.path,
                kind: c.kind,
                change: c.change,
            })
            .collect();
        for id in inner.dispatcher.dispatch(&batch) {
            inner.record(
                generation,
                IngestWarning::SubscriberOverflow {
                    id: id.get(),
                    capacity: inner.dispatcher.capacity(),
                },
            );
            let _ = inner.notice_tx.send(EngineNotice::SubscriberOverflow { id });
        }

        Ok(generation)
    }

    /// Apply events in order. Rejected events are skipped the way the
    /// background pump skips them; only a halted or closed engine stops
    /// the run.
    pub fn ingest_all<'a>(
        &self,
        events: impl IntoIterator<Item = &'a ChangeEvent>,
    ) -> Result<u64, CoreError> {
        for event in events {
            self.ingest_tolerant(event)?;
        }
        Ok(self.generation())
    }

    fn ingest_tolerant(&self, event: &ChangeEvent) -> Result<(), CoreError> {
        match self.ingest(event) {
            Ok(_) | Err(CoreError::ConsistencyViolation { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Pin the current generation.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.inner.current.load_full())
    }

    pub fn subgraph(&self, root: &ObjectPath, depth: usize) -> Result<Subgraph, CoreError> {
        self.snapshot().subgraph(root, depth)
    }

    pub fn get(&self, path: &ObjectPath) -> Option<Entity> {
        self.inner.current.load().get(path)
    }

    pub fn exists(&self, path: &ObjectPath) -> bool {
        self.inner.current.load().exists(path)
    }

    pub fn generation(&self) -> u64 {
        self.inner.current.load().generation
    }

    /// Recorded ingestion warnings, oldest first.
    pub fn diagnostics(&self) -> Vec<DiagnosticRecord> {
        lock(&self.inner.diagnostics).iter().cloned().collect()
    }

    pub fn state(&self) -> EngineState {
        *self.inner.state.borrow()
    }

    pub fn state_changes(&self) -> watch::Receiver<EngineState> {
        self.inner.state.subscribe()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Open a notification feed. On a closed engine the feed is already ended.
    pub fn subscribe(&self, filter: SubscriptionFilter) -> Subscription {
        let subscription = self.inner.dispatcher.subscribe(filter);
        if self.is_closed() {
            self.inner.dispatcher.unsubscribe(subscription.id());
        }
        subscription
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.dispatcher.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.dispatcher.len()
    }

    pub fn notices(&self) -> broadcast::Receiver<EngineNotice> {
        self.inner.notice_tx.subscribe()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn set_command_channel(&self, channel: Arc<dyn CommandChannel>) {
        *self
            .inner
            .commands
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(channel);
    }

    /// Forward `call` verbatim and return the raw reply. The graph is not
    /// touched; resulting state changes arrive as events.
    pub async fn execute(&self, call: RemoteCall) -> Result<serde_json::Value, CoreError> {
        self.ensure_open()?;
        let channel = self
            .inner
            .commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(CoreError::NoCommandChannel)?;

        debug!(path = %call.path, interface = %call.interface, method = %call.method, "forwarding remote call");
        Ok(channel.call(call).await?)
    }
}

impl EngineInner {
    fn set_state(&self, state: EngineState) {
        let _ = self.state.send_replace(state);
    }

    fn record(&self, generation: u64, warning: IngestWarning) {
        let capacity = self.config.diagnostics_capacity;
        if capacity == 0 {
            return;
        }
        let mut ring = lock(&self.diagnostics);
        while ring.len() >= capacity {
            ring.pop_front();
        }
        ring.push_back(DiagnosticRecord {
            generation,
            recorded_at: Utc::now(),
            warning,
        });
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Drain the session into the engine until it ends, fails or is cancelled.
async fn pump_task<S: BusSession>(engine: Engine, mut session: S, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = session.next_event() => match next {
                Ok(Some(event)) => {
                    if let Err(e) = engine.ingest_tolerant(&event) {
                        if !matches!(e, CoreError::EngineClosed) {
                            error!(error = %e, "ingestion halted");
                            engine.inner.set_state(EngineState::Failed);
                        }
                        break;
                    }
                }
                Ok(None) => {
                    info!(generation = engine.generation(), "bus session ended");
                    engine.inner.set_state(EngineState::SessionEnded);
                    break;
                }
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "transient bus error, continuing");
                }
                Err(e) => {
                    error!(error = %e, "bus session failed");
                    engine.inner.set_state(EngineState::Failed);
                    break;
                }
            }
        }
    }
    debug!("pump task exited");
}
