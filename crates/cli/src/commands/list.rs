// Panel listing

use anyhow::{bail, Result};
use chrono::Utc;
use pulse_core::{describe, GroupKey, GroupView};

use crate::output::{print_table_header, print_table_row, relative_time};
use crate::App;

const COLUMNS: [(&str, usize); 4] = [("GROUP", 16), ("UNREAD", 6), ("LATEST", 9), ("SUMMARY", 60)];

pub async fn run(app: &App, expand: Vec<GroupKey>, all: bool) -> Result<()> {
    let center = &app.center;
    let view = center.open_panel().await;
    if let Some(err) = &view.sync_error {
        bail!("Failed to load notifications: {}", err);
    }

    let keys: Vec<GroupKey> = if all {
        view.groups.iter().map(|g| g.group.key).collect()
    } else {
        expand
    };
    for key in keys {
        center.toggle_group(key);
    }
    let view = center.panel_view();

    if !app.output.is_text() {
        return app.output.print_value(&view);
    }

    if view.groups.is_empty() {
        if !app.quiet {
            println!("No notifications");
        }
        return Ok(());
    }

    if !app.quiet {
        println!(
            "{} unread{}",
            view.unread_count,
            view.badge
                .as_deref()
                .map(|b| format!(" [{}]", b))
                .unwrap_or_default()
        );
        println!();
    }

    print_table_header(&COLUMNS);
    for entry in &view.groups {
        print_group(entry, center.translator());
    }

    Ok(())
}

fn print_group(entry: &GroupView, translator: &dyn pulse_core::Translator) {
    let now = Utc::now();
    let group = &entry.group;
    let key = group.key.to_string();
    let unread = if group.has_unread() {
        group.unread_count.to_string()
    } else {
        "-".to_string()
    };
    let latest = relative_time(group.latest().created_at, now);

    print_table_row(&[
        (key.as_str(), COLUMNS[0].1),
        (unread.as_str(), COLUMNS[1].1),
        (latest.as_str(), COLUMNS[2].1),
        (entry.summary.as_str(), COLUMNS[3].1),
    ]);

    if entry.expanded {
        for n in &group.notifications {
            let marker = if n.is_read { ' ' } else { '*' };
            println!(
                "    {} #{:<8} {:<9} {}",
                marker,
                n.id,
                relative_time(n.created_at, now),
                describe(n, translator)
            );
        }
    }
}
