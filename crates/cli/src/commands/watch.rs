// Watch command - poll in the background and render toasts to the terminal
//
// Text mode prints one line per toast and per unread-count change. JSON mode
// prints one object per line so the stream can be piped into other tools.

use anyhow::Result;
use pulse_core::{badge_text, ToastId, ToastKind, ToastPhase, ToastView};
use serde::Serialize;

use crate::output::OutputFormat;
use crate::App;

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum WatchEvent<'a> {
    Toast {
        #[serde(flatten)]
        toast: &'a ToastView,
    },
    Unread {
        unread_count: usize,
        badge: Option<String>,
    },
}

fn kind_label(kind: ToastKind) -> &'static str {
    match kind {
        ToastKind::Success => "ok",
        ToastKind::Error => "error",
        ToastKind::Warning => "warning",
        ToastKind::Info => "info",
        ToastKind::Auth => "auth",
        ToastKind::Notification => "new",
        ToastKind::Network => "network",
    }
}

/// One terminal line for a toast
pub fn format_toast(view: &ToastView) -> String {
    let short = view
        .short_message
        .as_deref()
        .filter(|s| !s.trim().is_empty() && *s != view.message);
    match short {
        Some(short) => format!("[{}] {}: {}", kind_label(view.kind), short, view.message),
        None => format!("[{}] {}", kind_label(view.kind), view.message),
    }
}

fn emit(output: OutputFormat, event: &WatchEvent<'_>, text: impl FnOnce() -> String) -> Result<()> {
    match output {
        OutputFormat::Text => println!("{}", text()),
        OutputFormat::Json => println!("{}", serde_json::to_string(event)?),
        OutputFormat::Yaml => {
            println!("---");
            output.print_value(event)?;
        }
    }
    Ok(())
}

pub async fn run(app: &App) -> Result<()> {
    let center = &app.center;
    let mut toasts = center.toasts().subscribe();
    let mut revisions = center.store().subscribe();
    let handle = center.start();

    if app.output.is_text() && !app.quiet {
        eprintln!("Watching notifications (Ctrl-C to stop)");
    }

    let mut last_toast: Option<ToastId> = None;
    let mut last_unread: Option<usize> = None;

    loop {
        tokio::select! {
            changed = toasts.changed() => {
                if changed.is_err() {
                    break;
                }
                let active = toasts.borrow_and_update().clone();
                let Some(view) = active else { continue };
                if view.phase != ToastPhase::Visible || last_toast == Some(view.id) {
                    continue;
                }
                last_toast = Some(view.id);
                emit(app.output, &WatchEvent::Toast { toast: &view }, || format_toast(&view))?;
            }
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                revisions.borrow_and_update();
                let unread_count = center.store().unread_count();
                if last_unread == Some(unread_count) || app.quiet {
                    continue;
                }
                last_unread = Some(unread_count);
                let badge = badge_text(unread_count, center.translator());
                let line = match &badge {
                    Some(badge) => format!("Unread: {}", badge),
                    None => "Unread: 0".to_string(),
                };
                emit(app.output, &WatchEvent::Unread { unread_count, badge }, || line)?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal");
                break;
            }
        }
    }

    handle.stop().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::AnimationProfile;
    use std::time::Duration;

    fn view(kind: ToastKind, message: &str, short: Option<&str>) -> ToastView {
        ToastView {
            id: 1,
            message: message.to_string(),
            short_message: short.map(str::to_string),
            kind,
            animation: AnimationProfile::Pulse,
            hold: Duration::from_secs(4),
            phase: ToastPhase::Visible,
            source_notification_id: None,
            source_read: false,
        }
    }

    #[test]
    fn test_format_toast() {
        assert_eq!(
            format_toast(&view(ToastKind::Network, "Connection lost", Some("Offline"))),
            "[network] Offline: Connection lost"
        );
        assert_eq!(
            format_toast(&view(ToastKind::Notification, "Ann liked your post", None)),
            "[new] Ann liked your post"
        );
        assert_eq!(
            format_toast(&view(ToastKind::Info, "Retrying", Some("Retrying"))),
            "[info] Retrying"
        );
    }

    #[test]
    fn test_watch_event_json_shape() {
        let toast = view(ToastKind::Auth, "Please sign in", Some("Signed out"));
        let json = serde_json::to_value(WatchEvent::Toast { toast: &toast }).unwrap();
        assert_eq!(json["event"], "toast");
        assert_eq!(json["kind"], "auth");
        assert_eq!(json["hold"], 4000);

        let json = serde_json::to_value(WatchEvent::Unread {
            unread_count: 120,
            badge: Some("99+".into()),
        })
        .unwrap();
        assert_eq!(json["event"], "unread");
        assert_eq!(json["badge"], "99+");
    }
}
