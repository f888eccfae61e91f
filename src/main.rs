mod cli;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use scuttlebutt::config::ScuttlebuttConfig;
use scuttlebutt::resolver::GitHubResolver;
use scuttlebutt::sink::WebhookSink;
use scuttlebutt::source::SearchSource;
use scuttlebutt::store::Store;
use scuttlebutt::tasks::{Notifier, Poller};

#[derive(Parser)]
#[command(
    name = "scuttlebutt",
    version,
    about = "Announces the most-mentioned repository per language"
)]
struct Cli {
    /// Config file (default: ~/.scuttlebutt/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the poller, the notifier and the HTTP server
    Serve,
    /// Show the current top repository per language
    Top,
    /// List all stored repositories
    Repositories,
    /// Manage the blacklist
    Blacklist {
        #[command(subcommand)]
        action: BlacklistAction,
    },
    /// Show store statistics
    Stats,
    /// Check database health
    Doctor,
    /// Write a consistent copy of the database
    Backup {
        /// Destination file; must not exist
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum BlacklistAction {
    /// List blacklisted repositories
    List,
    /// Exclude a repository (host/owner/name) from ranking
    Add { id: String },
    /// Make a repository eligible again
    Remove { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ScuttlebuttConfig::load_from(path)?,
        None => ScuttlebuttConfig::load()?,
    };

    // Log to stderr so stdout stays clean for command output.
    let filter =
        EnvFilter::try_new(&config.server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => serve(config).await?,
        Command::Top => cli::query::top(&config)?,
        Command::Repositories => cli::query::repositories(&config)?,
        Command::Blacklist { action } => match action {
            BlacklistAction::List => cli::blacklist::list(&config)?,
            BlacklistAction::Add { id } => cli::blacklist::add(&config, &id)?,
            BlacklistAction::Remove { id } => cli::blacklist::remove(&config, &id)?,
        },
        Command::Stats => cli::stats::stats(&config)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
        Command::Backup { path } => cli::backup::backup(&config, &path)?,
    }

    Ok(())
}

async fn serve(config: ScuttlebuttConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let resolver = GitHubResolver::new(&config.github).context("failed to build GitHub client")?;
    let store = Store::open(&db_path)?
        .with_resolver(Arc::new(resolver))
        .with_resolver_timeout(config.github.timeout());
    tracing::info!(db = %db_path.display(), "store ready");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = Vec::new();

    if config.source.url.is_empty() {
        tracing::warn!("no [source] url configured; mention polling disabled");
    } else {
        let source = SearchSource::new(&config.source).context("failed to build search client")?;
        let poller = Poller::new(store.clone(), Arc::new(source));
        tasks.push(tokio::spawn(
            poller.run(config.source.poll_interval(), shutdown_rx.clone()),
        ));
    }

    if config.accounts.is_empty() {
        tracing::warn!("no [[account]] configured; notifications disabled");
    } else {
        let sink =
            WebhookSink::new(config.github.timeout()).context("failed to build webhook client")?;
        let notifier = Notifier::new(
            store.clone(),
            Arc::new(sink),
            config.accounts.clone(),
            config.notify.interval(),
        );
        tasks.push(tokio::spawn(
            notifier.run(config.notify.check_interval(), shutdown_rx.clone()),
        ));
    }

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("interrupt received; shutting down"),
            Err(e) => tracing::error!(error = %e, "failed to listen for ctrl-c; shutting down"),
        }
        let _ = shutdown_tx.send(true);
    });

    scuttlebutt::server::serve(store, &config.server.addr, shutdown_rx).await?;

    for task in tasks {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "background task panicked");
        }
    }
    Ok(())
}
