// Grouping Engine
//
// Pure transformation from the flat collection to ranked per-sender groups.
// Ordering is a total order: unread groups first, then newest latest
// notification, then group key. The key tiebreak keeps output stable across
// regroupings triggered by unrelated updates.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::model::{Notification, NotificationId, Sender, UserId};

/// Identity of a group.
///
/// Sender-less notifications never merge with each other; each one is keyed
/// by its own id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum GroupKey {
    Sender(UserId),
    NoSender(NotificationId),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Sender(id) => write!(f, "sender:{}", id),
            GroupKey::NoSender(id) => write!(f, "no-sender:{}", id),
        }
    }
}

impl FromStr for GroupKey {
    type Err = String;

    /// Parses the `Display` form (`sender:7`, `no-sender:12`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, id) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid group key '{}'", s))?;
        let id: i64 = id
            .trim()
            .parse()
            .map_err(|_| format!("invalid id in group key '{}'", s))?;
        match prefix.trim() {
            "sender" => Ok(GroupKey::Sender(id)),
            "no-sender" => Ok(GroupKey::NoSender(id)),
            other => Err(format!("unknown group key kind '{}'", other)),
        }
    }
}

/// Notifications from one sender collapsed into one panel entry
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: GroupKey,
    pub sender: Option<Sender>,
    /// Sorted by `created_at` descending
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

impl Group {
    /// Most recent notification of the group
    pub fn latest(&self) -> &Notification {
        // Groups are only built from at least one record
        &self.notifications[0]
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn has_unread(&self) -> bool {
        self.unread_count > 0
    }

    pub fn ids(&self) -> Vec<NotificationId> {
        self.notifications.iter().map(|n| n.id).collect()
    }

    pub fn unread_ids(&self) -> Vec<NotificationId> {
        self.notifications
            .iter()
            .filter(|n| !n.is_read)
            .map(|n| n.id)
            .collect()
    }
}

// Serialized with the derived `latest` so consumers do not re-sort.
impl Serialize for Group {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Group", 5)?;
        state.serialize_field("key", &self.key)?;
        state.serialize_field("sender", &self.sender)?;
        state.serialize_field("unread_count", &self.unread_count)?;
        state.serialize_field("latest", &self.notifications.first())?;
        state.serialize_field("notifications", &self.notifications)?;
        state.end()
    }
}

fn newest_first(a: &Notification, b: &Notification) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

fn rank(a: &Group, b: &Group) -> Ordering {
    b.has_unread()
        .cmp(&a.has_unread())
        .then_with(|| b.latest().created_at.cmp(&a.latest().created_at))
        .then_with(|| a.key.cmp(&b.key))
}

/// Partition notifications into ranked groups.
pub fn group(notifications: &[Notification]) -> Vec<Group> {
    let mut buckets: HashMap<GroupKey, Vec<Notification>> = HashMap::new();

    for n in notifications {
        let key = match n.sender_id() {
            Some(id) => GroupKey::Sender(id),
            None => GroupKey::NoSender(n.id),
        };
        buckets.entry(key).or_default().push(n.clone());
    }

    let mut groups: Vec<Group> = buckets
        .into_iter()
        .map(|(key, mut items)| {
            items.sort_by(newest_first);
            // Sender snapshot of the newest record wins (names can change)
            let sender = items[0].sender.clone();
            let unread_count = items.iter().filter(|n| !n.is_read).count();
            Group {
                key,
                sender,
                notifications: items,
                unread_count,
            }
        })
        .collect();

    groups.sort_by(rank);
    groups
}
