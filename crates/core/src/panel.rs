// Notification panel state
//
// Ephemeral view state for the panel surface: open flag and the set of
// expanded groups (cleared on close), plus the render model built from the
// store. Reads only; every mutation goes through the reconciler or poller.

use std::collections::HashSet;

use serde::Serialize;

use crate::grouping::{group, Group, GroupKey};
use crate::i18n::Translator;
use crate::store::NotificationStore;
use crate::summary::summarize;

/// Badge values above this render as "{max}+"
pub const BADGE_MAX: usize = 99;

/// Badge text for an unread count; `None` hides the badge.
pub fn badge_text(unread: usize, translator: &dyn Translator) -> Option<String> {
    match unread {
        0 => None,
        n if n > BADGE_MAX => {
            if translator.has_key("badge.overflow") {
                Some(translator.translate(
                    "badge.overflow",
                    &vec![("max", BADGE_MAX.to_string())],
                ))
            } else {
                Some(format!("{}+", BADGE_MAX))
            }
        }
        n => Some(n.to_string()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    open: bool,
    expanded: HashSet<GroupKey>,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Returns `true` if the panel was closed before (callers trigger an
    /// on-demand refresh in that case).
    pub fn open(&mut self) -> bool {
        let was_closed = !self.open;
        self.open = true;
        was_closed
    }

    pub fn close(&mut self) {
        self.open = false;
        self.expanded.clear();
    }

    /// Flip a group's expansion; returns the new state.
    pub fn toggle(&mut self, key: GroupKey) -> bool {
        if self.expanded.remove(&key) {
            false
        } else {
            self.expanded.insert(key);
            true
        }
    }

    pub fn is_expanded(&self, key: &GroupKey) -> bool {
        self.expanded.contains(key)
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    /// Build the render model from the store.
    pub fn render(
        &self,
        store: &NotificationStore,
        translator: &dyn Translator,
        sync_error: Option<String>,
    ) -> PanelView {
        let snapshot = store.snapshot();
        let groups = group(&snapshot.notifications);
        PanelView {
            badge: badge_text(snapshot.unread_count, translator),
            unread_count: snapshot.unread_count,
            sync_error,
            groups: groups
                .into_iter()
                .map(|g| GroupView::new(g, self, translator))
                .collect(),
        }
    }
}

/// One group entry as shown in the panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupView {
    pub summary: String,
    pub expanded: bool,
    #[serde(flatten)]
    pub group: Group,
}

impl GroupView {
    fn new(group: Group, state: &PanelState, translator: &dyn Translator) -> Self {
        Self {
            summary: summarize(&group, translator),
            expanded: state.is_expanded(&group.key),
            group,
        }
    }
}

/// Everything the panel renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub badge: Option<String>,
    pub unread_count: usize,
    /// Set while the last refresh failed
    pub sync_error: Option<String>,
    pub groups: Vec<GroupView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{CatalogTranslator, Locale};
    use crate::model::{Notification, NotificationType, Sender};
    use chrono::Utc;

    #[test]
    fn test_badge_text() {
        let t = CatalogTranslator::default();
        assert_eq!(badge_text(0, &t), None);
        assert_eq!(badge_text(7, &t).as_deref(), Some("7"));
        assert_eq!(badge_text(99, &t).as_deref(), Some("99"));
        assert_eq!(badge_text(100, &t).as_deref(), Some("99+"));

        let mut custom = CatalogTranslator::new(Locale::En, Default::default());
        custom.insert("badge.overflow", "{max}++");
        assert_eq!(badge_text(500, &custom).as_deref(), Some("99++"));
    }

    #[test]
    fn test_close_clears_expanded() {
        let mut panel = PanelState::new();
        assert!(panel.open());
        assert!(!panel.open());

        assert!(panel.toggle(GroupKey::Sender(1)));
        assert!(panel.toggle(GroupKey::NoSender(9)));
        assert!(!panel.toggle(GroupKey::NoSender(9)));
        assert!(panel.is_expanded(&GroupKey::Sender(1)));

        panel.close();
        assert!(!panel.is_open());
        assert_eq!(panel.expanded_count(), 0);
    }

    #[test]
    fn test_render() {
        let store = NotificationStore::new();
        store.load(
            vec![Notification {
                id: 1,
                kind: NotificationType::Follow,
                sender: Some(Sender {
                    id: 4,
                    name: "Dan".into(),
                    username: "dan".into(),
                    avatar: None,
                }),
                message: "Dan followed you".into(),
                link: Some("/u/dan".into()),
                created_at: Utc::now(),
                is_read: false,
            }],
            1,
        );

        let mut panel = PanelState::new();
        panel.open();
        panel.toggle(GroupKey::Sender(4));

        let view = panel.render(&store, &CatalogTranslator::default(), None);
        assert_eq!(view.badge.as_deref(), Some("1"));
        assert_eq!(view.groups.len(), 1);
        assert!(view.groups[0].expanded);
        assert_eq!(view.groups[0].summary, "Dan followed you");
    }
}
