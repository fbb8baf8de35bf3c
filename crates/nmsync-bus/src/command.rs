// ── Remote command pass-through ──
//
// Commands (activate, deactivate, scan, ...) are forwarded verbatim.
// The engine never interprets a reply; resulting state changes arrive
// later as ordinary change events.

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::path::ObjectPath;

/// A single remote method invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCall {
    /// Target object.
    pub path: ObjectPath,
    /// Remote interface name, e.g. `org.freedesktop.NetworkManager.Device.Wireless`.
    pub interface: String,
    /// Method name, e.g. `RequestScan`.
    pub method: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

impl RemoteCall {
    pub fn new(path: impl Into<ObjectPath>, interface: &str, method: &str) -> Self {
        Self {
            path: path.into(),
            interface: interface.to_owned(),
            method: method.to_owned(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: serde_json::Value) -> Self {
        self.args.push(arg);
        self
    }
}

/// Request/response channel to the remote service.
///
/// Object-safe so an engine can hold `Arc<dyn CommandChannel>`.
pub trait CommandChannel: Send + Sync {
    fn call(&self, call: RemoteCall) -> BoxFuture<'_, Result<serde_json::Value, Error>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_collects_args() {
        let call = RemoteCall::new("/dev/1", "org.freedesktop.NetworkManager.Device.Wireless", "RequestScan")
            .with_arg(json!({}));
        assert_eq!(call.path.as_str(), "/dev/1");
        assert_eq!(call.method, "RequestScan");
        assert_eq!(call.args.len(), 1);
    }
}
