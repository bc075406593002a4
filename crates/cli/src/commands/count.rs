// Unread count

use anyhow::Result;
use pulse_core::{badge_text, NotificationTransport};
use serde::Serialize;

use crate::App;

#[derive(Serialize)]
struct CountOutput {
    unread_count: usize,
    badge: Option<String>,
}

pub async fn run(app: &App) -> Result<()> {
    let unread_count = app.transport.fetch_unread_count().await?;
    let badge = badge_text(unread_count, app.center.translator());

    if app.output.is_text() {
        match (&badge, app.quiet) {
            (_, true) => println!("{}", unread_count),
            (Some(badge), false) => println!("{} unread [{}]", unread_count, badge),
            (None, false) => println!("No unread notifications"),
        }
        Ok(())
    } else {
        app.output.print_value(&CountOutput {
            unread_count,
            badge,
        })
    }
}
