// Best-effort structured extraction
//
// Older backends encoded point amounts and item names inside the free-text
// message instead of structured fields. This is the only place that parses
// that prose. Contract: a field is `Some` only when a pattern matched; callers
// fall back to the raw message when a field they need is missing.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Notification, NotificationType};

/// Fields recovered from a legacy message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub points: Option<i64>,
    pub item: Option<String>,
}

impl Extracted {
    pub fn is_empty(&self) -> bool {
        self.points.is_none() && self.item.is_none()
    }
}

// "150 points", "+1 500 pts", "1,500 points", "-20 баллов". Thousands may be
// grouped by space, comma or (narrow) no-break space. An amount that starts
// right after a digit, comma or dot is not matched.
static POINTS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[^\d.,])([+-]?(?:\d{1,3}(?:[ ,\x{00A0}\x{202F}]\d{3})+|\d+))\s*(?:points?|pts|балл(?:ов|а)?|бал(?:ів|и)?)",
    )
    .expect("static regex")
});

// Quoted names: "Golden Badge", «Золотий значок». Single quotes are left out,
// they collide with apostrophes.
static ITEM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)"|«([^»]+)»"#).expect("static regex"));

/// Pull a point amount out of free text.
pub fn extract_points(message: &str) -> Option<i64> {
    let caps = POINTS_PATTERN.captures(message)?;
    let digits: String = caps
        .get(1)?
        .as_str()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+' || *c == '-')
        .collect();
    digits.parse().ok()
}

/// Pull a quoted item name out of free text.
pub fn extract_item(message: &str) -> Option<String> {
    let caps = ITEM_PATTERN.captures(message)?;
    caps.iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str().trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extract whatever the notification kind is known to embed in its message.
pub fn extract(notification: &Notification) -> Extracted {
    extract_for(notification.kind, &notification.message)
}

pub fn extract_for(kind: NotificationType, message: &str) -> Extracted {
    Extracted {
        points: if kind.carries_points() {
            extract_points(message)
        } else {
            None
        },
        item: if kind.carries_item() {
            extract_item(message)
        } else {
            None
        },
    }
}
