//! polartrend-server - Reddit trend tracking service
//!
//! Polls configured subreddits for keyword mentions, promotes matched
//! activity into trend records, keeps a classification history and a
//! similarity graph current, and serves the JSON API.

use anyhow::{Context, Result};
use clap::Parser;
use polartrend_common::auth::load_session_secret;
use polartrend_common::config::{database_path, resolve_root_folder, TomlConfig};
use polartrend_common::db::init::init_database;
use tracing::info;

use polartrend_server::ingest::{IngestPoller, RedditClient};
use polartrend_server::jobs::SnapshotJob;
use polartrend_server::{build_router, AppState};

/// Command-line arguments for polartrend-server
#[derive(Parser, Debug)]
#[command(name = "polartrend-server")]
#[command(about = "Reddit trend tracking service")]
#[command(version)]
struct Args {
    /// Root data folder (database location)
    #[arg(short, long, env = "POLARTREND_ROOT")]
    root_folder: Option<String>,

    /// Bind address, overrides the config file
    #[arg(short, long, env = "POLARTREND_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting polartrend-server v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = TomlConfig::load();

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    std::fs::create_dir_all(&root_folder)
        .with_context(|| format!("Failed to create root folder {}", root_folder.display()))?;

    let db_path = database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("Database initialized");

    let session_secret = load_session_secret(&pool)
        .await
        .context("Failed to load session secret")?;

    let state = AppState::new(pool.clone(), session_secret);

    // Background jobs: Reddit ingestion and periodic reclassification
    let client = RedditClient::new().context("Failed to build Reddit client")?;
    let poller = IngestPoller::new(
        pool.clone(),
        state.engine.clone(),
        client,
        config.subreddits(),
        config.keywords(),
    );
    tokio::spawn(poller.run());
    tokio::spawn(SnapshotJob::new(pool.clone()).run());

    let app = build_router(state);

    let bind_address = args
        .bind
        .or(config.bind_address)
        .unwrap_or_else(|| "127.0.0.1:5730".to_string());

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;
    info!("polartrend-server listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
