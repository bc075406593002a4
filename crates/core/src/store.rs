// Notification Store
//
// Canonical in-memory collection plus the unread counter. The counter is kept
// separately from the records so the badge can react before a full refresh
// lands; every mutation keeps both consistent.
//
// Unknown ids are no-ops: optimistic local updates racing a server refresh
// are expected and must never surface as errors.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::debug;

use crate::grouping::{group, Group};
use crate::model::{Notification, NotificationId};

#[derive(Debug, Default)]
struct StoreState {
    notifications: Vec<Notification>,
    unread_count: usize,
}

impl StoreState {
    fn local_unread(&self) -> usize {
        self.notifications.iter().filter(|n| !n.is_read).count()
    }
}

/// Point-in-time copy of the store contents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

/// Shared handle to the notification store.
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Clone)]
pub struct NotificationStore {
    state: Arc<RwLock<StoreState>>,
    revision: Arc<watch::Sender<u64>>,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            revision: Arc::new(tx),
        }
    }

    /// Subscribe to change notifications.
    ///
    /// The value is a revision number bumped once per effective mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Current revision number
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }

    /// Replace the collection and the counter (full refresh).
    ///
    /// The counter is recomputed from the loaded records. The server count is
    /// only compared and logged; a page that disagrees with it does not leave
    /// the counter out of step with the collection.
    pub fn load(&self, notifications: Vec<Notification>, server_unread: usize) {
        {
            let mut state = self.state.write();
            state.notifications = notifications;
            let local = state.local_unread();
            if server_unread != local {
                debug!(
                    server = server_unread,
                    local, "server unread count differs from loaded records, using loaded"
                );
            }
            state.unread_count = local;
        }
        self.bump();
    }

    /// Mark one record read.
    ///
    /// Returns `true` only when the record existed and was unread.
    pub fn mark_read(&self, id: NotificationId) -> bool {
        let changed = {
            let mut state = self.state.write();
            match state.notifications.iter_mut().find(|n| n.id == id) {
                Some(n) if !n.is_read => {
                    n.is_read = true;
                    state.unread_count = state.unread_count.saturating_sub(1);
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.bump();
        }
        changed
    }

    /// Mark a batch of records read under a single lock acquisition.
    ///
    /// The counter drops by the number of distinct ids that were actually
    /// unread, so a retried batch never double counts. Returns that number.
    pub fn mark_group_read(&self, ids: &[NotificationId]) -> usize {
        let wanted: HashSet<NotificationId> = ids.iter().copied().collect();
        let transitioned = {
            let mut state = self.state.write();
            let mut transitioned = 0;
            for n in state.notifications.iter_mut() {
                if !n.is_read && wanted.contains(&n.id) {
                    n.is_read = true;
                    transitioned += 1;
                }
            }
            state.unread_count = state.unread_count.saturating_sub(transitioned);
            transitioned
        };
        if transitioned > 0 {
            self.bump();
        }
        transitioned
    }

    pub fn mark_all_read(&self) {
        {
            let mut state = self.state.write();
            for n in state.notifications.iter_mut() {
                n.is_read = true;
            }
            state.unread_count = 0;
        }
        self.bump();
    }

    pub fn clear_all(&self) {
        {
            let mut state = self.state.write();
            state.notifications.clear();
            state.unread_count = 0;
        }
        self.bump();
    }

    pub fn unread_count(&self) -> usize {
        self.state.read().unread_count
    }

    pub fn len(&self) -> usize {
        self.state.read().notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().notifications.is_empty()
    }

    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        self.state
            .read()
            .notifications
            .iter()
            .find(|n| n.id == id)
            .cloned()
    }

    /// `Some(is_read)` for a known id, `None` otherwise.
    pub fn is_read(&self, id: NotificationId) -> Option<bool> {
        self.state
            .read()
            .notifications
            .iter()
            .find(|n| n.id == id)
            .map(|n| n.is_read)
    }

    /// Ids among `ids` that are currently unread
    pub fn unread_among(&self, ids: &[NotificationId]) -> Vec<NotificationId> {
        let state = self.state.read();
        ids.iter()
            .copied()
            .filter(|id| state.notifications.iter().any(|n| n.id == *id && !n.is_read))
            .collect()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read();
        StoreSnapshot {
            notifications: state.notifications.clone(),
            unread_count: state.unread_count,
        }
    }

    /// Group the current collection
    pub fn groups(&self) -> Vec<Group> {
        group(&self.state.read().notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NotificationType;
    use chrono::{Duration, Utc};

    fn record(id: NotificationId, is_read: bool) -> Notification {
        Notification {
            id,
            kind: NotificationType::Like,
            sender: None,
            message: format!("n{}", id),
            link: None,
            created_at: Utc::now() - Duration::seconds(id),
            is_read,
        }
    }

    fn loaded(records: Vec<Notification>) -> NotificationStore {
        let store = NotificationStore::new();
        let unread = records.iter().filter(|n| !n.is_read).count();
        store.load(records, unread);
        store
    }

    #[test]
    fn test_load_replaces_collection_and_counter() {
        let store = loaded(vec![record(1, false), record(2, true)]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.unread_count(), 1);

        store.load(vec![record(3, false)], 1);
        assert_eq!(store.len(), 1);
        assert!(store.get(1).is_none());
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_load_counter_matches_unread_records() {
        let store = NotificationStore::new();
        store.load(vec![record(1, false), record(2, true)], 12);
        assert_eq!(store.unread_count(), 1);

        store.load(vec![record(1, false), record(2, false)], 0);
        assert_eq!(store.unread_count(), 2);

        store.load(vec![record(1, true)], 5);
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let store = loaded(vec![record(1, false), record(2, false)]);

        assert!(store.mark_read(1));
        assert!(!store.mark_read(1));
        assert_eq!(store.unread_count(), 1);
        assert_eq!(store.is_read(1), Some(true));
    }

    #[test]
    fn test_mark_read_unknown_id_is_noop() {
        let store = loaded(vec![record(1, false)]);
        let before = store.revision();

        assert!(!store.mark_read(99));
        assert_eq!(store.unread_count(), 1);
        assert_eq!(store.revision(), before);
    }

    #[test]
    fn test_counter_never_goes_negative() {
        let store = loaded(vec![record(1, false), record(2, false)]);
        store.mark_all_read();
        assert!(!store.mark_read(1));
        assert_eq!(store.mark_group_read(&[1, 2]), 0);
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_mark_group_read_counts_only_unread() {
        let store = loaded(vec![
            record(1, false),
            record(2, true),
            record(3, false),
            record(4, false),
        ]);

        // Duplicate and already-read ids must not be counted
        let changed = store.mark_group_read(&[1, 1, 2, 3, 99]);
        assert_eq!(changed, 2);
        assert_eq!(store.unread_count(), 1);

        // Retrying the same batch changes nothing
        assert_eq!(store.mark_group_read(&[1, 2, 3]), 0);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_mark_group_read_bumps_revision_once() {
        let store = loaded(vec![record(1, false), record(2, false), record(3, false)]);
        let before = store.revision();
        store.mark_group_read(&[1, 2, 3]);
        assert_eq!(store.revision(), before + 1);
    }

    #[test]
    fn test_mark_all_read_then_reload() {
        let store = loaded(vec![record(1, false), record(2, false)]);
        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);

        store.load(vec![record(1, true), record(2, true)], 0);
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_clear_all() {
        let store = loaded(vec![record(1, false)]);
        store.clear_all();
        assert!(store.is_empty());
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_unread_among() {
        let store = loaded(vec![record(1, false), record(2, true), record(3, false)]);
        assert_eq!(store.unread_among(&[1, 2, 3, 4]), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_subscribe_sees_changes() {
        let store = NotificationStore::new();
        let mut rx = store.subscribe();
        store.load(vec![record(1, false)], 1);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);
    }
}
