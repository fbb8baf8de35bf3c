// ── Change events ──
//
// The ordered unit of ingestion. Property values stay as raw JSON here;
// typed decoding (and per-field rejection) happens in nmsync-core.

use serde::{Deserialize, Serialize};

use crate::path::{ObjectKind, ObjectPath};

/// Property name -> raw value, exactly as the transport delivered it.
pub type PropertyMap = serde_json::Map<String, serde_json::Value>;

/// One remote mutation, in transport arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// A new object appeared. The payload is authoritative: it replaces any
    /// state previously cached for the path.
    ObjectAdded {
        path: ObjectPath,
        kind: ObjectKind,
        #[serde(default)]
        properties: PropertyMap,
    },
    /// An object was destroyed.
    ObjectRemoved { path: ObjectPath },
    /// A partial property update. Absent properties keep their values.
    PropertiesChanged {
        path: ObjectPath,
        /// Interface-derived kind, when the transport knows it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind_hint: Option<ObjectKind>,
        properties: PropertyMap,
    },
}

impl ChangeEvent {
    pub fn path(&self) -> &ObjectPath {
        match self {
            Self::ObjectAdded { path, .. }
            | Self::ObjectRemoved { path }
            | Self::PropertiesChanged { path, .. } => path,
        }
    }

    /// Short variant name for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ObjectAdded { .. } => "object_added",
            Self::ObjectRemoved { .. } => "object_removed",
            Self::PropertiesChanged { .. } => "properties_changed",
        }
    }
}

/// An object returned by the startup enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteObject {
    pub path: ObjectPath,
    pub kind: ObjectKind,
    #[serde(default)]
    pub properties: PropertyMap,
}

impl RemoteObject {
    /// Enumerated objects are ingested as synthetic `ObjectAdded` events.
    pub fn into_added_event(self) -> ChangeEvent {
        ChangeEvent::ObjectAdded {
            path: self.path,
            kind: self.kind,
            properties: self.properties,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_properties_changed() {
        let raw = json!({
            "event": "properties_changed",
            "path": "/dev/0",
            "properties": { "State": 40, "StateReason": { "40": 0 } }
        });

        let event: ChangeEvent = serde_json::from_value(raw).unwrap();
        let ChangeEvent::PropertiesChanged {
            path,
            kind_hint,
            properties,
        } = event
        else {
            panic!("expected PropertiesChanged");
        };
        assert_eq!(path.as_str(), "/dev/0");
        assert!(kind_hint.is_none());
        assert_eq!(properties["State"], 40);
    }

    #[test]
    fn object_added_defaults_to_empty_properties() {
        let raw = json!({ "event": "object_added", "path": "/ap/1", "kind": "AccessPoint" });
        let event: ChangeEvent = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            event,
            ChangeEvent::ObjectAdded { ref properties, kind: ObjectKind::AccessPoint, .. }
                if properties.is_empty()
        ));
        assert_eq!(event.label(), "object_added");
    }

    #[test]
    fn remote_object_becomes_added_event() {
        let obj = RemoteObject {
            path: ObjectPath::new("/mgr"),
            kind: ObjectKind::Manager,
            properties: PropertyMap::new(),
        };
        let event = obj.into_added_event();
        assert_eq!(event.path().as_str(), "/mgr");
        assert_eq!(event.label(), "object_added");
    }
}
