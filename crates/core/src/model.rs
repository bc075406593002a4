// Notification domain types
//
// Records are created server-side. The client only receives them and flips
// `is_read`; everything else is immutable after deserialization.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned notification identifier
pub type NotificationId = i64;

/// Server-assigned user identifier
pub type UserId = i64;

// ============================================================================
// Notification kinds
// ============================================================================

/// Kind of notification, as sent by the backend in the `type` field.
///
/// Unknown wire values deserialize into [`NotificationType::Unknown`] so a
/// newer backend never breaks an older client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Like,
    Comment,
    Reply,
    Mention,
    Follow,
    Repost,
    FriendRequest,
    FriendAccepted,
    Message,
    TransferReceived,
    TransferSent,
    PointsAwarded,
    PointsDeducted,
    Purchase,
    GiftReceived,
    ItemSold,
    Achievement,
    LevelUp,
    PostApproved,
    PostRejected,
    PostRemoved,
    CommentRemoved,
    Warning,
    Ban,
    Unban,
    RoleChanged,
    ReportResolved,
    SubscriptionStarted,
    SubscriptionExpired,
    System,
    #[serde(other)]
    Unknown,
}

impl NotificationType {
    /// Stable snake_case name, used to build catalog keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Like => "like",
            NotificationType::Comment => "comment",
            NotificationType::Reply => "reply",
            NotificationType::Mention => "mention",
            NotificationType::Follow => "follow",
            NotificationType::Repost => "repost",
            NotificationType::FriendRequest => "friend_request",
            NotificationType::FriendAccepted => "friend_accepted",
            NotificationType::Message => "message",
            NotificationType::TransferReceived => "transfer_received",
            NotificationType::TransferSent => "transfer_sent",
            NotificationType::PointsAwarded => "points_awarded",
            NotificationType::PointsDeducted => "points_deducted",
            NotificationType::Purchase => "purchase",
            NotificationType::GiftReceived => "gift_received",
            NotificationType::ItemSold => "item_sold",
            NotificationType::Achievement => "achievement",
            NotificationType::LevelUp => "level_up",
            NotificationType::PostApproved => "post_approved",
            NotificationType::PostRejected => "post_rejected",
            NotificationType::PostRemoved => "post_removed",
            NotificationType::CommentRemoved => "comment_removed",
            NotificationType::Warning => "warning",
            NotificationType::Ban => "ban",
            NotificationType::Unban => "unban",
            NotificationType::RoleChanged => "role_changed",
            NotificationType::ReportResolved => "report_resolved",
            NotificationType::SubscriptionStarted => "subscription_started",
            NotificationType::SubscriptionExpired => "subscription_expired",
            NotificationType::System => "system",
            NotificationType::Unknown => "unknown",
        }
    }

    /// Kinds whose legacy payload carries a point amount inside the message.
    pub fn carries_points(&self) -> bool {
        matches!(
            self,
            NotificationType::TransferReceived
                | NotificationType::TransferSent
                | NotificationType::PointsAwarded
                | NotificationType::PointsDeducted
        )
    }

    /// Kinds whose legacy payload carries an item name inside the message.
    pub fn carries_item(&self) -> bool {
        matches!(
            self,
            NotificationType::Purchase
                | NotificationType::GiftReceived
                | NotificationType::ItemSold
                | NotificationType::Achievement
        )
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Records
// ============================================================================

/// The user-like entity that caused a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: UserId,
    pub name: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Sender {
    /// Name to show in templates; falls back to the username when the
    /// display name is blank.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.username
        } else {
            &self.name
        }
    }
}

/// A single server-issued notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(default)]
    pub sender: Option<Sender>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
}

impl Notification {
    pub fn sender_id(&self) -> Option<UserId> {
        self.sender.as_ref().map(|s| s.id)
    }

    /// Age relative to `now`; negative ages (clock skew) clamp to zero.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.created_at).max(chrono::Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_wire_record() {
        let value = json!({
            "id": 42,
            "type": "transfer_received",
            "sender": { "id": 7, "name": "Ann", "username": "ann" },
            "message": "Ann sent you 150 points",
            "link": "/wallet",
            "created_at": "2026-03-01T10:00:00Z",
            "is_read": false
        });

        let n: Notification = serde_json::from_value(value).unwrap();
        assert_eq!(n.id, 42);
        assert_eq!(n.kind, NotificationType::TransferReceived);
        assert_eq!(n.sender_id(), Some(7));
        assert_eq!(n.link.as_deref(), Some("/wallet"));
        assert!(!n.is_read);
    }

    #[test]
    fn test_unknown_type_does_not_fail() {
        let value = json!({
            "id": 1,
            "type": "brand_new_kind",
            "message": "hello",
            "created_at": "2026-03-01T10:00:00Z"
        });

        let n: Notification = serde_json::from_value(value).unwrap();
        assert_eq!(n.kind, NotificationType::Unknown);
        assert!(n.sender.is_none());
        assert!(!n.is_read);
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let sender = Sender {
            id: 1,
            name: "  ".to_string(),
            username: "bob".to_string(),
            avatar: None,
        };
        assert_eq!(sender.display_name(), "bob");
    }
}
