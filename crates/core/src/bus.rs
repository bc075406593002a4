// Alert Bus
//
// Typed publish/subscribe channel for toast-worthy events. Any component that
// holds a clone can publish; the toast coordinator is the consumer.
// Publishing never fails: with no subscribers the event is dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::model::Notification;
use crate::toast::{AnimationProfile, ToastKind};

const DEFAULT_CAPACITY: usize = 64;

/// Optional presentation hints carried by alert events.
///
/// Every field may be missing; the coordinator fills gaps with per-event
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ToastKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationProfile>,
    /// Retry attempt number for `api-retry`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
}

impl AlertPayload {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_short_message(mut self, short: impl Into<String>) -> Self {
        self.short_message = Some(short.into());
        self
    }

    pub fn with_kind(mut self, kind: ToastKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_animation(mut self, animation: AnimationProfile) -> Self {
        self.animation = Some(animation);
        self
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }
}

/// Events accepted by the toast coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum AppEvent {
    NewNotification(Box<Notification>),
    AuthError(AlertPayload),
    RateLimitError(AlertPayload),
    NetworkError(AlertPayload),
    ApiRetry(AlertPayload),
    ShowError(AlertPayload),
}

impl AppEvent {
    /// Wire-style event name
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::NewNotification(_) => "new-notification",
            AppEvent::AuthError(_) => "auth-error",
            AppEvent::RateLimitError(_) => "rate-limit-error",
            AppEvent::NetworkError(_) => "network-error",
            AppEvent::ApiRetry(_) => "api-retry",
            AppEvent::ShowError(_) => "show-error",
        }
    }
}

/// Cloneable publisher/subscriber handle
#[derive(Debug, Clone)]
pub struct AlertBus {
    sender: broadcast::Sender<AppEvent>,
}

impl Default for AlertBus {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: AppEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => trace!(event = name, receivers, "Published alert event"),
            Err(_) => trace!(event = name, "No alert subscribers, event dropped"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn new_notification(&self, notification: Notification) {
        self.publish(AppEvent::NewNotification(Box::new(notification)));
    }

    pub fn auth_error(&self, payload: AlertPayload) {
        self.publish(AppEvent::AuthError(payload));
    }

    pub fn rate_limit_error(&self, payload: AlertPayload) {
        self.publish(AppEvent::RateLimitError(payload));
    }

    pub fn network_error(&self, payload: AlertPayload) {
        self.publish(AppEvent::NetworkError(payload));
    }

    pub fn api_retry(&self, payload: AlertPayload) {
        self.publish(AppEvent::ApiRetry(payload));
    }

    pub fn show_error(&self, payload: AlertPayload) {
        self.publish(AppEvent::ShowError(payload));
    }
}
