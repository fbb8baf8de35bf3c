// ── Subscription filters ──

use nmsync_bus::{ObjectKind, ObjectPath};

use super::Notification;

/// Which notifications a subscriber wants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubscriptionFilter {
    #[default]
    All,
    Kind(ObjectKind),
    Path(ObjectPath),
    /// Matches when any member matches. An empty list matches nothing.
    AnyOf(Vec<SubscriptionFilter>),
}

impl SubscriptionFilter {
    pub fn kinds(kinds: impl IntoIterator<Item = ObjectKind>) -> Self {
        Self::AnyOf(kinds.into_iter().map(Self::Kind).collect())
    }

    pub fn paths(paths: impl IntoIterator<Item = ObjectPath>) -> Self {
        Self::AnyOf(paths.into_iter().map(Self::Path).collect())
    }

    pub fn matches(&self, notification: &Notification) -> bool {
        match self {
            Self::All => true,
            Self::Kind(kind) => notification.kind == *kind,
            Self::Path(path) => notification.path == *path,
            Self::AnyOf(filters) => filters.iter().any(|f| f.matches(notification)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Change;

    fn note(path: &str, kind: ObjectKind) -> Notification {
        Notification {
            generation: 1,
            path: ObjectPath::new(path),
            kind,
            change: Change::Added,
        }
    }

    #[test]
    fn kind_and_path_filters() {
        let ap = note("/ap/1", ObjectKind::AccessPoint);
        assert!(SubscriptionFilter::All.matches(&ap));
        assert!(SubscriptionFilter::Kind(ObjectKind::AccessPoint).matches(&ap));
        assert!(!SubscriptionFilter::Kind(ObjectKind::Device).matches(&ap));
        assert!(SubscriptionFilter::Path(ObjectPath::new("/ap/1")).matches(&ap));
        assert!(!SubscriptionFilter::Path(ObjectPath::new("/ap/2")).matches(&ap));
    }

    #[test]
    fn any_of_combines() {
        let filter = SubscriptionFilter::AnyOf(vec![
            SubscriptionFilter::Kind(ObjectKind::Device),
            SubscriptionFilter::Path(ObjectPath::new("/ap/1")),
        ]);
        assert!(filter.matches(&note("/dev/3", ObjectKind::Device)));
        assert!(filter.matches(&note("/ap/1", ObjectKind::AccessPoint)));
        assert!(!filter.matches(&note("/ap/2", ObjectKind::AccessPoint)));
        assert!(!SubscriptionFilter::AnyOf(Vec::new()).matches(&note("/x", ObjectKind::Manager)));
    }
}
