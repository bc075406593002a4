// Human-readable summaries
//
// Single notifications render through `notification.<type>`; groups tally
// their kinds and render `notification.<type>.count.<plural category>` parts
// joined with catalog separators. Anything the template cannot be filled
// with falls back to the raw message.

use crate::extract::extract;
use crate::grouping::Group;
use crate::i18n::{Params, Translator};
use crate::model::{Notification, NotificationType, Sender};

const FALLBACK_SEPARATOR: &str = ", ";

fn sender_name(sender: Option<&Sender>, translator: &dyn Translator) -> String {
    match sender {
        Some(s) => s.display_name().to_string(),
        None => translator.translate("sender.system", &vec![]),
    }
}

fn fallback(notification: &Notification, translator: &dyn Translator) -> String {
    if notification.message.trim().is_empty() {
        translator.translate(
            "notification.unknown",
            &vec![(
                "sender",
                sender_name(notification.sender.as_ref(), translator),
            )],
        )
    } else {
        notification.message.clone()
    }
}

/// Localized point amount such as "150 points"
pub fn format_points(points: i64, translator: &dyn Translator) -> String {
    let amount = points.unsigned_abs();
    let key = format!(
        "points.count.{}",
        translator.plural_category(amount).as_str()
    );
    translator.translate(&key, &vec![("count", amount.to_string())])
}

/// Render one notification.
pub fn describe(notification: &Notification, translator: &dyn Translator) -> String {
    let key = format!("notification.{}", notification.kind);
    if notification.kind == NotificationType::Unknown || !translator.has_key(&key) {
        return fallback(notification, translator);
    }

    let extracted = extract(notification);
    let mut params: Params = vec![
        (
            "sender",
            sender_name(notification.sender.as_ref(), translator),
        ),
        ("message", notification.message.clone()),
    ];

    if notification.kind.carries_points() {
        match extracted.points {
            Some(points) => params.push(("points", format_points(points, translator))),
            None => return fallback(notification, translator),
        }
    }
    if notification.kind.carries_item() {
        match extracted.item {
            Some(item) => params.push(("item", item)),
            None => return fallback(notification, translator),
        }
    }

    translator.translate(&key, &params)
}

/// Count of each kind in order of first appearance
pub fn tally(notifications: &[Notification]) -> Vec<(NotificationType, u64)> {
    let mut counts: Vec<(NotificationType, u64)> = Vec::new();
    for n in notifications {
        match counts.iter_mut().find(|(kind, _)| *kind == n.kind) {
            Some((_, count)) => *count += 1,
            None => counts.push((n.kind, 1)),
        }
    }
    counts
}

fn count_part(
    kind: NotificationType,
    count: u64,
    sender: &str,
    translator: &dyn Translator,
) -> String {
    let category = translator.plural_category(count).as_str();
    let specific = format!("notification.{}.count.{}", kind, category);
    let key = if translator.has_key(&specific) {
        specific
    } else {
        format!("notification.any.count.{}", category)
    };
    translator.translate(
        &key,
        &vec![("count", count.to_string()), ("sender", sender.to_string())],
    )
}

fn separator(key: &str, translator: &dyn Translator) -> String {
    if translator.has_key(key) {
        translator.translate(key, &vec![])
    } else {
        FALLBACK_SEPARATOR.to_string()
    }
}

/// Join parts as "a, b and c" using catalog separators.
pub fn join_parts(parts: &[String], translator: &dyn Translator) -> String {
    match parts {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => {
            let sep = separator("summary.separator", translator);
            let last_sep = separator("summary.last_separator", translator);
            format!("{}{}{}", init.join(&sep), last_sep, last)
        }
    }
}

/// Render a group summary line.
pub fn summarize(group: &Group, translator: &dyn Translator) -> String {
    if group.len() == 1 {
        return describe(group.latest(), translator);
    }

    let sender = sender_name(group.sender.as_ref(), translator);
    let parts: Vec<String> = tally(&group.notifications)
        .into_iter()
        .map(|(kind, count)| count_part(kind, count, &sender, translator))
        .collect();
    join_parts(&parts, translator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::group;
    use crate::i18n::{CatalogTranslator, Locale};
    use chrono::{Duration, Utc};

    fn catalog(locale: Locale) -> CatalogTranslator {
        CatalogTranslator::from_json(
            locale,
            r#"{
                "sender.system": "System",
                "notification.unknown": "New notification",
                "notification.like": "{sender} liked your post",
                "notification.transfer_received": "{sender} sent you {points}",
                "notification.purchase": "You bought {item}",
                "notification.like.count.one": "{count} like",
                "notification.like.count.other": "{count} likes",
                "notification.like.count.few": "{count} вподобання",
                "notification.like.count.many": "{count} вподобань",
                "notification.comment.count.one": "{count} comment",
                "notification.comment.count.other": "{count} comments",
                "notification.any.count.one": "{count} notification",
                "notification.any.count.other": "{count} notifications",
                "points.count.one": "{count} point",
                "points.count.other": "{count} points",
                "summary.separator": ", ",
                "summary.last_separator": " and "
            }"#,
        )
        .unwrap()
    }

    fn ann() -> Sender {
        Sender {
            id: 7,
            name: "Ann".into(),
            username: "ann".into(),
            avatar: None,
        }
    }

    fn record(id: i64, kind: NotificationType, message: &str) -> Notification {
        Notification {
            id,
            kind,
            sender: Some(ann()),
            message: message.into(),
            link: None,
            created_at: Utc::now() - Duration::minutes(id),
            is_read: false,
        }
    }

    #[test]
    fn test_describe_uses_template() {
        let t = catalog(Locale::En);
        let n = record(1, NotificationType::Like, "Ann liked your post");
        assert_eq!(describe(&n, &t), "Ann liked your post");
    }

    #[test]
    fn test_describe_renders_placeholder_like_names_literally() {
        let t = catalog(Locale::En);
        let mut n = record(1, NotificationType::Like, "raw message body");
        n.sender = Some(Sender {
            name: "{message}".into(),
            ..ann()
        });
        assert_eq!(describe(&n, &t), "{message} liked your post");
    }

    #[test]
    fn test_describe_extracts_points() {
        let t = catalog(Locale::En);
        let n = record(1, NotificationType::TransferReceived, "sent you 150 points");
        assert_eq!(describe(&n, &t), "Ann sent you 150 points");

        let single = record(2, NotificationType::TransferReceived, "sent you 1 point");
        assert_eq!(describe(&single, &t), "Ann sent you 1 point");
    }

    #[test]
    fn test_describe_falls_back_when_extraction_fails() {
        let t = catalog(Locale::En);
        let n = record(1, NotificationType::TransferReceived, "Ann sent you a surprise");
        assert_eq!(describe(&n, &t), "Ann sent you a surprise");

        let p = record(2, NotificationType::Purchase, "Purchase complete");
        assert_eq!(describe(&p, &t), "Purchase complete");
    }

    #[test]
    fn test_describe_falls_back_for_missing_template() {
        let t = catalog(Locale::En);
        let n = record(1, NotificationType::Follow, "Ann followed you");
        assert_eq!(describe(&n, &t), "Ann followed you");

        let mut empty = record(2, NotificationType::Unknown, "");
        empty.sender = None;
        assert_eq!(describe(&empty, &t), "New notification");
    }

    #[test]
    fn test_summarize_single_reuses_describe() {
        let t = catalog(Locale::En);
        let groups = group(&[record(1, NotificationType::Purchase, r#"bought "Hat""#)]);
        assert_eq!(summarize(&groups[0], &t), "You bought Hat");
    }

    #[test]
    fn test_summarize_tallies_kinds() {
        let t = catalog(Locale::En);
        let groups = group(&[
            record(1, NotificationType::Like, ""),
            record(2, NotificationType::Comment, ""),
            record(3, NotificationType::Like, ""),
            record(4, NotificationType::Follow, ""),
        ]);

        assert_eq!(groups.len(), 1);
        assert_eq!(
            summarize(&groups[0], &t),
            "2 likes, 1 comment and 1 notification"
        );
    }

    #[test]
    fn test_summarize_uses_few_many_buckets() {
        let t = catalog(Locale::Uk);
        let three: Vec<Notification> = (1..=3)
            .map(|i| record(i, NotificationType::Like, ""))
            .collect();
        let five: Vec<Notification> = (1..=5)
            .map(|i| record(i, NotificationType::Like, ""))
            .collect();

        assert_eq!(summarize(&group(&three)[0], &t), "3 вподобання");
        assert_eq!(summarize(&group(&five)[0], &t), "5 вподобань");
    }

    #[test]
    fn test_join_parts_without_separators_in_catalog() {
        let t = CatalogTranslator::default();
        let parts = vec!["a".to_string(), "b".to_string()];
        assert_eq!(join_parts(&parts, &t), "a, b");
    }
}
