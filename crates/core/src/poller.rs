//! Notification polling
//!
//! Refreshes the store on a fixed interval and on demand, and announces
//! freshly arrived notifications on the alert bus.
//!
//! Refreshes never overlap: a refresh started while another is in flight
//! returns [`RefreshOutcome::Skipped`] without fetching, which also prevents
//! the same notification from being announced twice.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::bus::AlertBus;
use crate::config::duration_millis;
use crate::error::PollerError;
use crate::model::{Notification, NotificationId};
use crate::store::NotificationStore;
use crate::transport::NotificationTransport;

/// Polling configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollerConfig {
    /// Periodic refresh interval
    #[serde(with = "duration_millis")]
    pub interval: Duration,

    /// Maximum age of a notification still announced as new
    #[serde(with = "duration_millis")]
    pub freshness_window: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            freshness_window: Duration::from_secs(60),
        }
    }
}

impl PollerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }
}

/// What a refresh did
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Another refresh was in flight
    Skipped,
    /// Store reloaded; `announced` is the notification published as new
    Loaded {
        count: usize,
        unread_count: usize,
        announced: Option<NotificationId>,
    },
}

/// Clears the in-flight flag when dropped, including on early return.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Poller {
    transport: Arc<dyn NotificationTransport>,
    store: NotificationStore,
    bus: AlertBus,
    config: PollerConfig,
    in_flight: AtomicBool,
    last_seen: Mutex<Option<NotificationId>>,
    last_error: RwLock<Option<String>>,
}

impl Poller {
    pub fn new(
        transport: Arc<dyn NotificationTransport>,
        store: NotificationStore,
        bus: AlertBus,
        config: PollerConfig,
    ) -> Self {
        Self {
            transport,
            store,
            bus,
            config,
            in_flight: AtomicBool::new(false),
            last_seen: Mutex::new(None),
            last_error: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    /// Message of the last failed refresh, cleared by the next success.
    ///
    /// Passive: views may render it, nothing else reacts to it.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Fetch and load the current notifications.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<RefreshOutcome, PollerError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Refresh already in flight, skipping");
            return Ok(RefreshOutcome::Skipped);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let page = match self.transport.fetch().await {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "Notification refresh failed, keeping last known state");
                *self.last_error.write() = Some(e.to_string());
                return Err(PollerError::Fetch(e));
            }
        };
        *self.last_error.write() = None;

        let announced = self.detect_new(&page.notifications, Utc::now());
        let count = page.notifications.len();
        self.store.load(page.notifications, page.unread_count);
        let unread_count = self.store.unread_count();

        if let Some(n) = &announced {
            info!(notification_id = n.id, kind = %n.kind, "New notification");
            self.bus.new_notification(n.clone());
        }
        debug!(count, unread_count, "Notifications refreshed");

        Ok(RefreshOutcome::Loaded {
            count,
            unread_count,
            announced: announced.map(|n| n.id),
        })
    }

    /// The most recent record, if it is fresh and not announced before.
    /// Records the id as seen.
    fn detect_new(&self, notifications: &[Notification], now: DateTime<Utc>) -> Option<Notification> {
        let latest = notifications
            .iter()
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))?;

        let window = chrono::Duration::from_std(self.config.freshness_window)
            .unwrap_or_else(|_| chrono::Duration::MAX);
        if latest.age(now) > window {
            return None;
        }

        let mut last_seen = self.last_seen.lock();
        if *last_seen == Some(latest.id) {
            return None;
        }
        *last_seen = Some(latest.id);
        Some(latest.clone())
    }

    /// Run the periodic loop in the background.
    ///
    /// The first refresh happens immediately. The loop stops when the returned
    /// handle is stopped or dropped.
    pub fn spawn(self: Arc<Self>) -> PollerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let trigger = Arc::new(Notify::new());
        let poller = Arc::clone(&self);
        let wake = Arc::clone(&trigger);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poller.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = wake.notified() => {
                        debug!("On-demand refresh requested");
                    }
                    _ = shutdown_rx.changed() => {
                        debug!("Poller shutdown requested");
                        break;
                    }
                }
                // Failures are recorded by refresh(); the interval continues
                let _ = poller.refresh().await;
            }
        });

        info!(interval_ms = self.config.interval.as_millis() as u64, "Poller started");
        PollerHandle {
            poller: self,
            trigger,
            shutdown_tx,
            task: Some(task),
        }
    }
}

/// Owns the background poll loop
pub struct PollerHandle {
    poller: Arc<Poller>,
    trigger: Arc<Notify>,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn poller(&self) -> &Arc<Poller> {
        &self.poller
    }

    /// Ask the loop for an immediate refresh (e.g. the panel was opened).
    pub fn refresh_now(&self) {
        self.trigger.notify_one();
    }

    /// Stop the loop and wait for an in-flight refresh to finish.
    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
