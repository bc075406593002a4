// Delete all notifications

use anyhow::{bail, Context, Result};

use crate::App;

pub async fn run(app: &App, yes: bool) -> Result<()> {
    if !yes {
        bail!("Refusing to delete all notifications without --yes");
    }

    app.center
        .reconciler()
        .clear_all()
        .await
        .context("Failed to delete notifications")?;

    if app.output.is_text() {
        if !app.quiet {
            println!("All notifications deleted");
        }
        Ok(())
    } else {
        app.output.print_value(&serde_json::json!({ "success": true }))
    }
}
