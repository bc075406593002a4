// Notification transport contract
//
// The core only depends on this trait. `pulse-client` provides the HTTP
// implementation; `memory::InMemoryTransport` backs tests and demos.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::model::{Notification, NotificationId};

/// Body of `GET notifications`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationPage {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub unread_count: usize,
}

/// Body of `GET notifications/unread-count`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub unread_count: usize,
}

/// Body of the mutating endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

impl Ack {
    /// Turn `success: false` into [`TransportError::Rejected`].
    pub fn into_result(self) -> Result<(), TransportError> {
        if self.success {
            Ok(())
        } else {
            Err(TransportError::rejected(
                self.message.unwrap_or_else(|| "success=false".to_string()),
            ))
        }
    }
}

/// Request/response calls against the notification service.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// `GET notifications`
    async fn fetch(&self) -> Result<NotificationPage, TransportError>;

    /// `GET notifications/unread-count`
    async fn fetch_unread_count(&self) -> Result<usize, TransportError>;

    /// `POST notifications/{id}/read`
    async fn mark_read(&self, id: NotificationId) -> Result<(), TransportError>;

    /// `POST notifications/mark-all-read`
    async fn mark_all_read(&self) -> Result<(), TransportError>;

    /// `DELETE notifications`
    async fn delete_all(&self) -> Result<(), TransportError>;
}
