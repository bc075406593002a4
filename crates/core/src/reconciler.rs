// Read-State Reconciler
//
// Applies read transitions locally and mirrors them to the backend. Single
// reads are optimistic and never rolled back; the next poll corrects any
// divergence. Group reads wait for the backend and apply only the ids that
// succeeded, in one store mutation.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, instrument, warn};

use crate::error::TransportError;
use crate::grouping::Group;
use crate::model::NotificationId;
use crate::store::NotificationStore;
use crate::toast::ToastCoordinator;
use crate::transport::NotificationTransport;

/// Result of a group read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupReadOutcome {
    /// Ids confirmed by the backend and applied locally
    pub marked: Vec<NotificationId>,
    /// Ids whose backend call failed; left unread locally
    pub failed: Vec<(NotificationId, TransportError)>,
}

impl GroupReadOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Clone)]
pub struct ReadStateReconciler {
    transport: Arc<dyn NotificationTransport>,
    store: NotificationStore,
    toasts: Option<ToastCoordinator>,
}

impl ReadStateReconciler {
    pub fn new(transport: Arc<dyn NotificationTransport>, store: NotificationStore) -> Self {
        Self {
            transport,
            store,
            toasts: None,
        }
    }

    /// Reflect local read transitions on live toasts
    pub fn with_toasts(mut self, toasts: ToastCoordinator) -> Self {
        self.toasts = Some(toasts);
        self
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    fn reflect(&self, ids: &[NotificationId]) {
        if let Some(toasts) = &self.toasts {
            if !ids.is_empty() {
                toasts.reflect_read(ids);
            }
        }
    }

    /// Mark one notification read, optimistically.
    ///
    /// The local transition sticks even if the backend call fails.
    #[instrument(skip(self))]
    pub async fn mark_one_read(&self, id: NotificationId) -> Result<(), TransportError> {
        if self.store.mark_read(id) {
            self.reflect(&[id]);
        }

        self.transport.mark_read(id).await.map_err(|e| {
            warn!(notification_id = id, error = %e, "Backend mark-read failed, keeping local state");
            e
        })
    }

    /// Mark every currently-unread notification of `group` read.
    #[instrument(skip(self, group), fields(group = %group.key))]
    pub async fn mark_group_read(&self, group: &Group) -> GroupReadOutcome {
        // The group may be a stale snapshot; ask the store what is unread now
        let unread = self.store.unread_among(&group.ids());
        if unread.is_empty() {
            return GroupReadOutcome::default();
        }

        let results = join_all(unread.iter().map(|id| {
            let transport = Arc::clone(&self.transport);
            let id = *id;
            async move { (id, transport.mark_read(id).await) }
        }))
        .await;

        let mut outcome = GroupReadOutcome::default();
        for (id, result) in results {
            match result {
                Ok(()) => outcome.marked.push(id),
                Err(e) => {
                    warn!(notification_id = id, error = %e, "Backend mark-read failed, leaving unread");
                    outcome.failed.push((id, e));
                }
            }
        }

        let changed = self.store.mark_group_read(&outcome.marked);
        self.reflect(&outcome.marked);
        debug!(
            requested = unread.len(),
            marked = outcome.marked.len(),
            changed,
            "Group read applied"
        );
        outcome
    }

    /// Mark everything read; local state changes only on backend success.
    #[instrument(skip(self))]
    pub async fn mark_all_read(&self) -> Result<(), TransportError> {
        let unread: Vec<NotificationId> = self
            .store
            .snapshot()
            .notifications
            .iter()
            .filter(|n| !n.is_read)
            .map(|n| n.id)
            .collect();

        self.transport.mark_all_read().await.map_err(|e| {
            warn!(error = %e, "Backend mark-all-read failed");
            e
        })?;
        self.store.mark_all_read();
        self.reflect(&unread);
        Ok(())
    }

    /// Delete everything; local state changes only on backend success.
    #[instrument(skip(self))]
    pub async fn clear_all(&self) -> Result<(), TransportError> {
        self.transport.delete_all().await.map_err(|e| {
            warn!(error = %e, "Backend delete-all failed");
            e
        })?;
        self.store.clear_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryTransport;
    use crate::model::{Notification, NotificationType, Sender};
    use crate::toast::{ToastKind, ToastRequest};
    use chrono::{Duration, Utc};

    fn record(id: NotificationId) -> Notification {
        Notification {
            id,
            kind: NotificationType::Comment,
            sender: Some(Sender {
                id: 1,
                name: "Ann".into(),
                username: "ann".into(),
                avatar: None,
            }),
            message: "commented".into(),
            link: None,
            created_at: Utc::now() - Duration::minutes(id),
            is_read: false,
        }
    }

    async fn setup(ids: &[NotificationId]) -> (Arc<InMemoryTransport>, ReadStateReconciler) {
        let records: Vec<Notification> = ids.iter().map(|id| record(*id)).collect();
        let transport = Arc::new(InMemoryTransport::with_notifications(records));
        let store = NotificationStore::new();
        let page = transport.fetch().await.unwrap();
        store.load(page.notifications, page.unread_count);
        let reconciler = ReadStateReconciler::new(transport.clone(), store);
        (transport, reconciler)
    }

    #[tokio::test]
    async fn test_mark_one_read_twice_decrements_once() {
        let (transport, reconciler) = setup(&[1, 2]).await;

        reconciler.mark_one_read(1).await.unwrap();
        reconciler.mark_one_read(1).await.unwrap();

        assert_eq!(reconciler.store().unread_count(), 1);
        assert_eq!(transport.server_is_read(1), Some(true));
    }

    #[tokio::test]
    async fn test_mark_one_read_failure_keeps_optimistic_state() {
        let (transport, reconciler) = setup(&[1]).await;
        transport.fail_mark_read_for(&[1]);

        let result = reconciler.mark_one_read(1).await;
        assert!(result.is_err());
        assert_eq!(reconciler.store().is_read(1), Some(true));
        assert_eq!(reconciler.store().unread_count(), 0);
        assert_eq!(transport.server_is_read(1), Some(false));
    }

    #[tokio::test]
    async fn test_group_read_partial_failure() {
        let (transport, reconciler) = setup(&[1, 2, 3, 4, 5]).await;
        transport.fail_mark_read_for(&[2, 4]);

        let group = reconciler.store().groups().remove(0);
        assert_eq!(group.unread_count, 5);

        let outcome = reconciler.mark_group_read(&group).await;

        let mut marked = outcome.marked.clone();
        marked.sort();
        assert_eq!(marked, vec![1, 3, 5]);
        assert_eq!(outcome.failed.len(), 2);
        assert!(!outcome.is_complete());

        let store = reconciler.store();
        assert_eq!(store.unread_count(), 2);
        assert_eq!(store.is_read(2), Some(false));
        assert_eq!(store.is_read(4), Some(false));
    }

    #[tokio::test]
    async fn test_group_read_skips_already_read() {
        let (transport, reconciler) = setup(&[1, 2, 3]).await;
        let group = reconciler.store().groups().remove(0);

        reconciler.mark_one_read(2).await.unwrap();
        let calls_before = transport.mark_read_calls();

        let outcome = reconciler.mark_group_read(&group).await;
        assert_eq!(outcome.marked.len(), 2);
        assert_eq!(transport.mark_read_calls() - calls_before, 2);
        assert_eq!(reconciler.store().unread_count(), 0);
    }

    #[tokio::test]
    async fn test_mark_all_read_only_on_success() {
        let (transport, reconciler) = setup(&[1, 2]).await;
        transport.fail_mutations(Some(TransportError::network("offline")));

        assert!(reconciler.mark_all_read().await.is_err());
        assert_eq!(reconciler.store().unread_count(), 2);

        transport.fail_mutations(None);
        reconciler.mark_all_read().await.unwrap();
        assert_eq!(reconciler.store().unread_count(), 0);
    }

    #[tokio::test]
    async fn test_clear_all_only_on_success() {
        let (transport, reconciler) = setup(&[1, 2]).await;
        transport.fail_mutations(Some(TransportError::network("offline")));
        assert!(reconciler.clear_all().await.is_err());
        assert_eq!(reconciler.store().len(), 2);

        transport.fail_mutations(None);
        reconciler.clear_all().await.unwrap();
        assert!(reconciler.store().is_empty());
        assert_eq!(reconciler.store().unread_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_reflected_on_live_toast() {
        let (_transport, reconciler) = setup(&[1]).await;
        let toasts = ToastCoordinator::default();
        let reconciler = reconciler.with_toasts(toasts.clone());

        toasts.show(ToastRequest::new(ToastKind::Notification, "Ann commented").with_source(1));
        reconciler.mark_one_read(1).await.unwrap();

        let active = toasts.active().unwrap();
        assert!(active.source_read);
    }
}
