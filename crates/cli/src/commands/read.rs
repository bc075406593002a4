// Read-state commands

use anyhow::{bail, Context, Result};
use pulse_core::{GroupKey, NotificationId};
use serde::Serialize;

use crate::output::print_field;
use crate::App;

#[derive(Serialize)]
struct ReadOutput {
    marked: Vec<NotificationId>,
    failed: Vec<FailedRead>,
}

#[derive(Serialize)]
struct FailedRead {
    id: NotificationId,
    error: String,
}

impl ReadOutput {
    fn print(&self, app: &App) -> Result<()> {
        if !app.output.is_text() {
            return app.output.print_value(self);
        }
        if app.quiet {
            for id in &self.marked {
                println!("{}", id);
            }
        } else {
            print_field("Marked read", &self.marked.len().to_string());
            for failure in &self.failed {
                print_field("Failed", &format!("#{} ({})", failure.id, failure.error));
            }
        }
        Ok(())
    }

    fn finish(self, app: &App) -> Result<()> {
        self.print(app)?;
        if !self.failed.is_empty() {
            bail!("{} notification(s) could not be marked read", self.failed.len());
        }
        Ok(())
    }
}

pub async fn one(app: &App, ids: Vec<NotificationId>) -> Result<()> {
    let reconciler = app.center.reconciler();
    let mut output = ReadOutput {
        marked: Vec::new(),
        failed: Vec::new(),
    };

    for id in ids {
        match reconciler.mark_one_read(id).await {
            Ok(()) => output.marked.push(id),
            Err(e) => output.failed.push(FailedRead {
                id,
                error: e.to_string(),
            }),
        }
    }

    output.finish(app)
}

pub async fn group(app: &App, key: GroupKey) -> Result<()> {
    app.center
        .poller()
        .refresh()
        .await
        .context("Failed to load notifications")?;

    let group = app
        .center
        .store()
        .groups()
        .into_iter()
        .find(|g| g.key == key)
        .with_context(|| format!("No group {}", key))?;

    let outcome = app.center.reconciler().mark_group_read(&group).await;
    ReadOutput {
        marked: outcome.marked,
        failed: outcome
            .failed
            .into_iter()
            .map(|(id, e)| FailedRead {
                id,
                error: e.to_string(),
            })
            .collect(),
    }
    .finish(app)
}

pub async fn all(app: &App) -> Result<()> {
    app.center
        .reconciler()
        .mark_all_read()
        .await
        .context("Failed to mark all notifications read")?;

    if app.output.is_text() {
        if !app.quiet {
            println!("All notifications marked read");
        }
        Ok(())
    } else {
        app.output.print_value(&serde_json::json!({ "success": true }))
    }
}
