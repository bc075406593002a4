//! In-memory implementation of NotificationTransport for testing and demos
//!
//! Behaves like the real service (mark-read is idempotent, unread count is
//! derived from records) and supports failure injection per operation.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::TransportError;
use crate::model::{Notification, NotificationId};
use crate::transport::{NotificationPage, NotificationTransport};

#[derive(Default)]
struct ServerState {
    notifications: Vec<Notification>,
    failing_ids: HashSet<NotificationId>,
    fetch_error: Option<TransportError>,
    mutation_error: Option<TransportError>,
    latency: Option<Duration>,
}

/// In-memory notification service
#[derive(Default)]
pub struct InMemoryTransport {
    state: RwLock<ServerState>,
    fetch_calls: AtomicUsize,
    mark_read_calls: AtomicUsize,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notifications(notifications: Vec<Notification>) -> Self {
        let transport = Self::new();
        transport.set_notifications(notifications);
        transport
    }

    /// Replace the server-side records
    pub fn set_notifications(&self, notifications: Vec<Notification>) {
        self.state.write().notifications = notifications;
    }

    /// Add a record at the front (newest first, like the real service)
    pub fn push(&self, notification: Notification) {
        self.state.write().notifications.insert(0, notification);
    }

    /// Make `mark_read` fail for these ids
    pub fn fail_mark_read_for(&self, ids: &[NotificationId]) {
        self.state.write().failing_ids.extend(ids.iter().copied());
    }

    /// Make every `fetch` fail with `error` until cleared
    pub fn fail_fetch(&self, error: Option<TransportError>) {
        self.state.write().fetch_error = error;
    }

    /// Make mark-all-read and delete-all fail with `error` until cleared
    pub fn fail_mutations(&self, error: Option<TransportError>) {
        self.state.write().mutation_error = error;
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.state.write().latency = latency;
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn mark_read_calls(&self) -> usize {
        self.mark_read_calls.load(Ordering::SeqCst)
    }

    /// Server-side read flag for `id`
    pub fn server_is_read(&self, id: NotificationId) -> Option<bool> {
        self.state
            .read()
            .notifications
            .iter()
            .find(|n| n.id == id)
            .map(|n| n.is_read)
    }

    async fn simulate_latency(&self) {
        let latency = self.state.read().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl NotificationTransport for InMemoryTransport {
    async fn fetch(&self) -> Result<NotificationPage, TransportError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let state = self.state.read();
        if let Some(err) = &state.fetch_error {
            return Err(err.clone());
        }
        Ok(NotificationPage {
            success: true,
            notifications: state.notifications.clone(),
            unread_count: state.notifications.iter().filter(|n| !n.is_read).count(),
        })
    }

    async fn fetch_unread_count(&self) -> Result<usize, TransportError> {
        self.simulate_latency().await;

        let state = self.state.read();
        if let Some(err) = &state.fetch_error {
            return Err(err.clone());
        }
        Ok(state.notifications.iter().filter(|n| !n.is_read).count())
    }

    async fn mark_read(&self, id: NotificationId) -> Result<(), TransportError> {
        self.mark_read_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        let mut state = self.state.write();
        if state.failing_ids.contains(&id) {
            return Err(TransportError::Api {
                status: 500,
                message: format!("mark-read failed for {}", id),
            });
        }
        match state.notifications.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.is_read = true;
                Ok(())
            }
            None => Err(TransportError::NotFound(id)),
        }
    }

    async fn mark_all_read(&self) -> Result<(), TransportError> {
        self.simulate_latency().await;

        let mut state = self.state.write();
        if let Some(err) = &state.mutation_error {
            return Err(err.clone());
        }
        for n in state.notifications.iter_mut() {
            n.is_read = true;
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), TransportError> {
        self.simulate_latency().await;

        let mut state = self.state.write();
        if let Some(err) = &state.mutation_error {
            return Err(err.clone());
        }
        state.notifications.clear();
        Ok(())
    }
}
