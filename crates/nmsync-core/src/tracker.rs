// ── Lifecycle state trackers ──
//
// Hooks run by ingestion around every commit. The remote side is
// authoritative about transitions; trackers never reject one. They pair
// each transition with its reason, hold config references back until the
// owner is ACTIVATED, and emit semantic state-change notifications.

use tracing::debug;

use nmsync_bus::{ObjectKind, ObjectPath, PropertyMap};

use crate::ingest::Ingest;
use crate::model::{
    AccessPoint, ActiveConnection, ActiveConnectionState, ConfigRefs, Device, DeviceState,
    DeviceStateReason, Dhcp4Config, Dhcp6Config, Ip4Config, Ip6Config, Manager, Settings,
};
use crate::store::Record;
use crate::stream::Change;

pub(crate) trait Track: Record {
    /// Adjust derived fields of `new` before it is compared and stored.
    fn reconcile(_old: Option<&Self>, _new: &mut Self, _properties: &PropertyMap) {}

    /// React to a committed change.
    fn after_commit(_ingest: &mut Ingest<'_>, _old: Option<&Self>, _new: &Self) {}

    /// No further transitions are expected once this holds.
    fn is_terminal(&self) -> bool {
        false
    }
}

impl Track for Manager {}
impl Track for Settings {}
impl Track for AccessPoint {}
impl Track for Ip4Config {}
impl Track for Ip6Config {}
impl Track for Dhcp4Config {}
impl Track for Dhcp6Config {}

/// Publish announced config references only while activated. On leaving
/// the activated state, references the remote did not re-send in this
/// same event are considered stale and dropped.
fn gate_configs(
    was_activated: bool,
    is_activated: bool,
    announced: &mut ConfigRefs,
    published: &mut ConfigRefs,
    properties: &PropertyMap,
) {
    if was_activated && !is_activated {
        for (slot, name) in [
            (&mut announced.ip4, "Ip4Config"),
            (&mut announced.ip6, "Ip6Config"),
            (&mut announced.dhcp4, "Dhcp4Config"),
            (&mut announced.dhcp6, "Dhcp6Config"),
        ] {
            if !properties.contains_key(name) {
                *slot = None;
            }
        }
    }

    *published = if is_activated {
        announced.clone()
    } else {
        ConfigRefs::default()
    };
}

impl Track for Device {
    fn reconcile(old: Option<&Self>, new: &mut Self, properties: &PropertyMap) {
        let prev_state = old.map(|o| o.state);

        // A transition reported without its reason has no reason.
        if prev_state.is_some_and(|s| s != new.state) && !properties.contains_key("StateReason") {
            new.state_reason = DeviceStateReason::NONE;
        }

        gate_configs(
            prev_state.is_some_and(DeviceState::is_activated),
            new.state.is_activated(),
            &mut new.announced,
            &mut new.configs,
            properties,
        );
    }

    fn after_commit(ingest: &mut Ingest<'_>, old: Option<&Self>, new: &Self) {
        let Some(old) = old else {
            return;
        };

        if old.state != new.state {
            debug!(
                path = %new.path,
                old = %old.state,
                new = %new.state,
                reason = %new.state_reason,
                "device state changed"
            );
            ingest.push(
                new.path.clone(),
                ObjectKind::Device,
                Change::DeviceStateChanged {
                    old: old.state,
                    new: new.state,
                    reason: new.state_reason,
                },
            );
        }

        let current = new.access_points();
        let gone: Vec<ObjectPath> = old
            .access_points()
            .iter()
            .filter(|ap| !current.contains(ap))
            .cloned()
            .collect();
        if !gone.is_empty() {
            ingest.drop_orphan_access_points(&gone);
        }
    }
}

impl Track for ActiveConnection {
    fn reconcile(old: Option<&Self>, new: &mut Self, properties: &PropertyMap) {
        let prev_state = old.map(|o| o.state);

        if prev_state.is_some_and(|s| s != new.state) && !properties.contains_key("StateReason") {
            new.state_reason = 0;
        }

        gate_configs(
            prev_state.is_some_and(|s| s == ActiveConnectionState::Activated),
            new.state == ActiveConnectionState::Activated,
            &mut new.announced,
            &mut new.configs,
            properties,
        );
    }

    fn after_commit(ingest: &mut Ingest<'_>, old: Option<&Self>, new: &Self) {
        let Some(old) = old else {
            return;
        };
        if old.state == new.state {
            return;
        }

        debug!(
            path = %new.path,
            old = %old.state,
            new = %new.state,
            reason = new.state_reason,
            "active connection state changed"
        );
        ingest.push(
            new.path.clone(),
            ObjectKind::ActiveConnection,
            Change::ActiveConnectionStateChanged {
                old: old.state,
                new: new.state,
                reason: new.state_reason,
            },
        );
    }

    fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: serde_json::Value) -> PropertyMap {
        value.as_object().cloned().unwrap()
    }

    fn device(state: DeviceState) -> Device {
        let mut d = Device::new(ObjectPath::new("/dev/0"));
        d.state = state;
        d
    }

    #[test]
    fn configs_published_only_when_activated() {
        let old = device(DeviceState::IpConfig);
        let mut new = old.clone();
        new.announced.ip4 = Some(ObjectPath::new("/ip4/1"));

        Device::reconcile(Some(&old), &mut new, &props(json!({ "Ip4Config": "/ip4/1" })));
        assert!(new.configs.is_empty());

        let old = new.clone();
        new.state = DeviceState::Activated;
        Device::reconcile(Some(&old), &mut new, &props(json!({ "State": 100 })));
        assert_eq!(new.configs.ip4, Some(ObjectPath::new("/ip4/1")));
    }

    #[test]
    fn leaving_activated_drops_stale_references() {
        let mut old = device(DeviceState::Activated);
        old.announced.ip4 = Some(ObjectPath::new("/ip4/1"));
        old.configs = old.announced.clone();

        let mut new = old.clone();
        new.state = DeviceState::Deactivating;
        Device::reconcile(Some(&old), &mut new, &props(json!({ "State": 110 })));

        assert!(new.configs.is_empty());
        assert!(new.announced.is_empty());
    }

    #[test]
    fn references_resent_with_the_transition_survive() {
        let mut old = device(DeviceState::Activated);
        old.announced.ip4 = Some(ObjectPath::new("/ip4/1"));

        let mut new = old.clone();
        new.state = DeviceState::IpConfig;
        new.announced.ip4 = Some(ObjectPath::new("/ip4/2"));
        Device::reconcile(
            Some(&old),
            &mut new,
            &props(json!({ "State": 70, "Ip4Config": "/ip4/2" })),
        );

        assert!(new.configs.is_empty());
        assert_eq!(new.announced.ip4, Some(ObjectPath::new("/ip4/2")));
    }

    #[test]
    fn transition_without_reason_resets_reason() {
        let mut old = device(DeviceState::Prepare);
        old.state_reason = DeviceStateReason(40);
        let mut new = old.clone();
        new.state = DeviceState::Config;
        Device::reconcile(Some(&old), &mut new, &props(json!({ "State": 50 })));
        assert_eq!(new.state_reason, DeviceStateReason::NONE);
    }

    #[test]
    fn active_connection_terminal_state() {
        let mut ac = ActiveConnection::new(ObjectPath::new("/ac/0"));
        assert!(!ac.is_terminal());
        ac.state = ActiveConnectionState::Deactivated;
        assert!(ac.is_terminal());
    }
}
