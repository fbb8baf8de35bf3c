// ── Core error types ──
//
// `CoreError` is what callers of the engine see. Problems that ingestion
// recovers from are `IngestWarning` values kept in the diagnostics ring,
// never errors.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use nmsync_bus::{ObjectKind, ObjectPath};

/// Two claims on one path that cannot both hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Conflict {
    /// The path is registered as one kind and an event claims another.
    KindMismatch {
        registered: ObjectKind,
        claimed: ObjectKind,
    },
    /// A second path claims a kind that has exactly one instance.
    SingletonTaken { kind: ObjectKind, holder: ObjectPath },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KindMismatch {
                registered,
                claimed,
            } => write!(f, "registered as {registered}, event claims {claimed}"),
            Self::SingletonTaken { kind, holder } => {
                write!(f, "{kind} is a singleton already held by {holder}")
            }
        }
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Data model errors ────────────────────────────────────────────
    #[error("Consistency violation at {path}: {conflict}")]
    ConsistencyViolation { path: ObjectPath, conflict: Conflict },

    #[error("Object not found: {path}")]
    NotFound { path: ObjectPath },

    #[error("Data model broken: {path} keeps colliding across kinds; engine halted")]
    DataModelBroken { path: ObjectPath },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Engine is closed")]
    EngineClosed,

    #[error("A bus session is already attached")]
    AlreadyAttached,

    #[error("No command channel attached")]
    NoCommandChannel,

    // ── Transport errors ─────────────────────────────────────────────
    #[error(transparent)]
    Bus(#[from] nmsync_bus::Error),
}

/// A problem ingestion recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IngestWarning {
    #[error("{path}: property {property} expected {expected}, found {found}")]
    MalformedField {
        path: ObjectPath,
        property: String,
        expected: String,
        found: String,
    },

    #[error("{path}: event rejected, {conflict}")]
    ConsistencyViolation { path: ObjectPath, conflict: Conflict },

    #[error("{path}: cannot infer object kind from properties [{properties}]")]
    UnknownKind { path: ObjectPath, properties: String },

    #[error("{path}: update after terminal state")]
    PostTerminalUpdate { path: ObjectPath },

    #[error("subscriber {id} dropped after its queue reached {capacity} pending notifications")]
    SubscriberOverflow { id: u64, capacity: usize },
}

impl IngestWarning {
    pub fn path(&self) -> Option<&ObjectPath> {
        match self {
            Self::MalformedField { path, .. }
            | Self::ConsistencyViolation { path, .. }
            | Self::UnknownKind { path, .. }
            | Self::PostTerminalUpdate { path } => Some(path),
            Self::SubscriberOverflow { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::MalformedField { .. } => "malformed_field",
            Self::ConsistencyViolation { .. } => "consistency_violation",
            Self::UnknownKind { .. } => "unknown_kind",
            Self::PostTerminalUpdate { .. } => "post_terminal_update",
            Self::SubscriberOverflow { .. } => "subscriber_overflow",
        }
    }
}

/// A warning stamped with the generation it was raised at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticRecord {
    pub generation: u64,
    pub recorded_at: DateTime<Utc>,
    pub warning: IngestWarning,
}
