// Integration tests for the notification pipeline
//
// Poller → store → grouping → reconciler → toast, wired through the
// in-memory transport.
//
// Run with: cargo test -p pulse-core --test pipeline_test

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pulse_core::memory::InMemoryTransport;
use pulse_core::{
    AlertBus, AlertPayload, AnimationProfile, CatalogTranslator, GroupKey, Locale, Notification,
    NotificationCenter, NotificationType, PulseConfig, Sender, ToastKind, ToastPhase,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("pulse_core=debug")
        .try_init();
}

fn translator() -> Arc<CatalogTranslator> {
    Arc::new(
        CatalogTranslator::from_json(
            Locale::En,
            r#"{
                "sender.system": "System",
                "notification.comment": "{sender} commented on your post",
                "notification.like.count.one": "{count} like",
                "notification.like.count.other": "{count} likes",
                "notification.comment.count.one": "{count} comment",
                "notification.comment.count.other": "{count} comments",
                "summary.separator": ", ",
                "summary.last_separator": " and ",
                "toast.new_notification.short": "{sender}",
                "toast.network_error.message": "No connection",
                "toast.network_error.short": "Offline"
            }"#,
        )
        .unwrap(),
    )
}

fn user(id: i64, name: &str) -> Sender {
    Sender {
        id,
        name: name.to_string(),
        username: name.to_lowercase(),
        avatar: None,
    }
}

fn record(
    id: i64,
    kind: NotificationType,
    sender: Option<Sender>,
    age_secs: i64,
    is_read: bool,
) -> Notification {
    Notification {
        id,
        kind,
        sender,
        message: String::new(),
        link: None,
        created_at: Utc::now() - chrono::Duration::seconds(age_secs),
        is_read,
    }
}

fn center(transport: Arc<InMemoryTransport>) -> NotificationCenter {
    NotificationCenter::new(
        transport,
        AlertBus::new(),
        PulseConfig::default(),
        translator(),
    )
}

#[tokio::test]
async fn test_grouped_panel_after_refresh() {
    init_tracing();
    let u = user(1, "Ursula");
    let v = user(2, "Victor");
    let w = user(3, "Wanda");
    let transport = Arc::new(InMemoryTransport::with_notifications(vec![
        record(1, NotificationType::Like, Some(u.clone()), 300, false),
        record(2, NotificationType::Comment, Some(u.clone()), 400, false),
        record(3, NotificationType::Like, Some(u), 500, true),
        record(4, NotificationType::Comment, Some(v), 200, false),
        record(5, NotificationType::Like, Some(w), 100, true),
    ]));
    let center = center(transport);

    let view = center.open_panel().await;
    let keys: Vec<GroupKey> = view.groups.iter().map(|g| g.group.key).collect();

    // V (latest 200s ago) and U (latest 300s ago) are unread; W is all read
    assert_eq!(
        keys,
        vec![GroupKey::Sender(2), GroupKey::Sender(1), GroupKey::Sender(3)]
    );
    let u_group = &view.groups[1];
    assert_eq!(u_group.group.unread_count, 2);
    assert_eq!(u_group.group.len(), 3);
    assert_eq!(u_group.summary, "2 likes and 1 comment");
    assert_eq!(view.groups[0].summary, "Victor commented on your post");
    assert_eq!(view.unread_count, 3);
}

#[tokio::test]
async fn test_group_read_with_partial_failure_then_self_heal() {
    init_tracing();
    let u = user(1, "Ursula");
    let records: Vec<Notification> = (1..=5)
        .map(|id| record(id, NotificationType::Like, Some(u.clone()), 120 + id, false))
        .collect();
    let transport = Arc::new(InMemoryTransport::with_notifications(records));
    transport.fail_mark_read_for(&[2, 5]);
    let center = center(transport.clone());
    center.poller().refresh().await.unwrap();

    let group = center.store().groups().remove(0);
    let outcome = center.reconciler().mark_group_read(&group).await;

    assert_eq!(outcome.marked.len(), 3);
    assert_eq!(outcome.failed.len(), 2);
    assert_eq!(center.store().unread_count(), 2);
    assert_eq!(center.store().is_read(2), Some(false));
    assert_eq!(center.store().is_read(5), Some(false));

    // Next refresh reflects server truth, which agrees with the local state
    center.poller().refresh().await.unwrap();
    assert_eq!(center.store().unread_count(), 2);
}

#[tokio::test]
async fn test_mark_all_read_then_reload_keeps_zero() {
    let transport = Arc::new(InMemoryTransport::with_notifications(vec![
        record(1, NotificationType::Like, None, 600, false),
        record(2, NotificationType::Like, None, 700, false),
    ]));
    let center = center(transport);
    center.poller().refresh().await.unwrap();

    center.reconciler().mark_all_read().await.unwrap();
    assert_eq!(center.store().unread_count(), 0);

    center.poller().refresh().await.unwrap();
    assert_eq!(center.store().unread_count(), 0);
    assert!(center.store().snapshot().notifications.iter().all(|n| n.is_read));
}

#[tokio::test(start_paused = true)]
async fn test_new_notification_toast_then_network_error_preempts() {
    init_tracing();
    let transport = Arc::new(InMemoryTransport::new());
    let center = center(transport.clone());
    let handle = center.start();
    let mut active = center.toasts().subscribe();

    transport.push(record(
        10,
        NotificationType::Comment,
        Some(user(4, "Ann")),
        2,
        false,
    ));
    handle.poller.refresh_now();

    active.changed().await.unwrap();
    let first = active.borrow().clone().unwrap();
    assert_eq!(first.kind, ToastKind::Notification);
    assert_eq!(first.message, "Ann commented on your post");
    assert_eq!(first.source_notification_id, Some(10));

    center
        .bus()
        .network_error(AlertPayload::message("Connection lost"));
    active.changed().await.unwrap();
    let second = active.borrow().clone().unwrap();

    assert_eq!(second.kind, ToastKind::Network);
    assert_eq!(second.animation, AnimationProfile::Pulse);
    assert_eq!(second.short_message.as_deref(), Some("Offline"));
    assert_eq!(center.toasts().phase(first.id), ToastPhase::FadingOut);

    // Clicking the (now fading) notification toast marks it read everywhere
    center.reconciler().mark_one_read(10).await.unwrap();
    assert_eq!(center.store().unread_count(), 0);
    assert_eq!(transport.server_is_read(10), Some(true));

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(center.toasts().phase(first.id), ToastPhase::Destroyed);
    assert_eq!(center.toasts().phase(second.id), ToastPhase::Visible);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_refresh_during_in_flight_poll_emits_one_toast() {
    let transport = Arc::new(InMemoryTransport::with_notifications(vec![record(
        1,
        NotificationType::Follow,
        None,
        1,
        false,
    )]));
    transport.set_latency(Some(Duration::from_millis(200)));
    let center = center(transport.clone());
    let mut events = center.bus().subscribe();

    let (a, _) = tokio::join!(center.poller().refresh(), center.open_panel());
    assert!(a.is_ok());
    assert_eq!(transport.fetch_calls(), 1);
    assert_eq!(center.panel_view().groups.len(), 1);

    assert!(events.try_recv().is_ok());
    assert!(events.try_recv().is_err());
}
