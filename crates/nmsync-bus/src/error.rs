use thiserror::Error;

/// Top-level error type for the `nmsync-bus` crate.
///
/// Covers the failure modes of every transport surface: capture files,
/// in-process channels, and remote command calls. `nmsync-core` wraps
/// these in its own error type.
#[derive(Debug, Error)]
pub enum Error {
    // ── I/O ─────────────────────────────────────────────────────────
    /// Reading a capture file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Data ────────────────────────────────────────────────────────
    /// A capture line could not be decoded into a [`ChangeEvent`](crate::ChangeEvent).
    #[error("malformed event on line {line}: {message}")]
    Decode { line: usize, message: String },

    // ── Session ─────────────────────────────────────────────────────
    /// The session's sending side is gone.
    #[error("bus session closed")]
    Closed,

    /// The transport reported a failure it could not recover from.
    #[error("transport error: {0}")]
    Transport(String),

    // ── Commands ────────────────────────────────────────────────────
    /// A remote command call was rejected or failed in flight.
    #[error("remote call {method} on {path} failed: {message}")]
    CallFailed {
        path: String,
        method: String,
        message: String,
    },
}

impl Error {
    /// Returns `true` if retrying the same operation could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::CallFailed { .. })
    }
}
