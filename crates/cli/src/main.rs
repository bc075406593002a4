// Pulse CLI
//
// Design Decision: Use clap derive with env fallbacks so scripts can rely on PULSE_* variables.
// Design Decision: Support text/json/yaml output formats for scripting.
// Design Decision: Logs go to stderr; stdout carries only command output.

mod catalog;
mod commands;
mod output;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pulse_client::{ClientConfig, HttpTransport};
use pulse_core::{AlertBus, GroupKey, NotificationCenter, NotificationId, PulseConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Pulse CLI - Watch and manage your notifications")]
#[command(version)]
pub struct Cli {
    /// API base URL
    #[arg(long, env = "PULSE_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token
    #[arg(long, env = "PULSE_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Catalog language (en, uk)
    #[arg(long, env = "PULSE_LOCALE", default_value = "en")]
    pub locale: String,

    /// Output format
    #[arg(long, short, default_value = "text", value_parser = ["text", "json", "yaml"])]
    pub output: String,

    /// Suppress non-essential output
    #[arg(long, short)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll for notifications and show toasts until interrupted
    Watch {
        /// Poll interval in seconds (overrides PULSE_POLL_INTERVAL_MS)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Show the grouped notification panel
    List {
        /// Expand a group (repeatable), e.g. sender:7 or no-sender:12
        #[arg(long, short)]
        expand: Vec<GroupKey>,

        /// Expand every group
        #[arg(long, conflicts_with = "expand")]
        all: bool,
    },

    /// Print the unread count
    Count,

    /// Mark notifications as read
    Read {
        /// Notification IDs
        #[arg(required = true)]
        ids: Vec<NotificationId>,
    },

    /// Mark every unread notification in a group as read
    ReadGroup {
        /// Group key, e.g. sender:7 or no-sender:12
        key: GroupKey,
    },

    /// Mark all notifications as read
    ReadAll,

    /// Delete all notifications
    Clear {
        /// Skip the safety check
        #[arg(long)]
        yes: bool,
    },
}

/// Everything a command needs
pub struct App {
    pub transport: Arc<HttpTransport>,
    pub center: NotificationCenter,
    pub output: output::OutputFormat,
    pub quiet: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            std::env::var("LOG_LEVEL")
                .map_err(anyhow::Error::from)
                .and_then(|level| EnvFilter::try_new(level).map_err(anyhow::Error::from))
        })
        .unwrap_or_else(|_| EnvFilter::new("pulse=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_app(cli: &Cli, poll_interval: Option<u64>) -> Result<App> {
    let mut client_config = ClientConfig::from_env().context("Invalid client configuration")?;
    if let Some(url) = &cli.api_url {
        client_config.base_url = url.clone();
    }
    if let Some(token) = &cli.token {
        client_config = client_config.with_token(token.clone());
    }

    let mut config = PulseConfig::from_env();
    if let Some(secs) = poll_interval {
        config.poller = config
            .poller
            .with_interval(Duration::from_secs(secs.max(1)));
    }

    let bus = AlertBus::new();
    let transport = Arc::new(
        HttpTransport::new(client_config)
            .context("Failed to create HTTP client")?
            .with_bus(bus.clone()),
    );
    let translator = Arc::new(catalog::load(&cli.locale)?);
    let center = NotificationCenter::new(transport.clone(), bus, config, translator);

    Ok(App {
        transport,
        center,
        output: output::OutputFormat::parse(&cli.output),
        quiet: cli.quiet,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads env fallbacks
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing();
    if let Ok(path) = dotenv {
        tracing::debug!("Loaded .env from {:?}", path);
    }

    let poll_interval = match &cli.command {
        Commands::Watch { interval } => *interval,
        _ => None,
    };
    let app = build_app(&cli, poll_interval)?;

    match cli.command {
        Commands::Watch { .. } => commands::watch::run(&app).await,
        Commands::List { expand, all } => commands::list::run(&app, expand, all).await,
        Commands::Count => commands::count::run(&app).await,
        Commands::Read { ids } => commands::read::one(&app, ids).await,
        Commands::ReadGroup { key } => commands::read::group(&app, key).await,
        Commands::ReadAll => commands::read::all(&app).await,
        Commands::Clear { yes } => commands::clear::run(&app, yes).await,
    }
}
