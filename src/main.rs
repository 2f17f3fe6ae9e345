use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use octowatch::collector::CollectorRegistry;
use octowatch::config::AppConfig;
use octowatch::server::{create_router, AppState};
use octowatch::storage::StorageBuilder;
use octowatch::GithubEventsCollector;

/// GitHub activity event collector and count-query service.
#[derive(Parser, Debug)]
#[command(name = "octowatch", version, about)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, env = "OCTOWATCH_CONFIG", default_value = "configs/config.yaml")]
    config: String,

    /// Override the server bind address.
    #[arg(long, env = "OCTOWATCH_SERVER_BIND")]
    server_bind: Option<String>,

    /// Override the server port.
    #[arg(long, env = "OCTOWATCH_SERVER_PORT")]
    server_port: Option<u16>,

    /// Override the database path.
    #[arg(long, env = "OCTOWATCH_DB_PATH")]
    db_path: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,octowatch=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)?;
    if let Some(bind) = cli.server_bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.server_port {
        config.server.port = port;
    }
    if let Some(db_path) = cli.db_path {
        config.database.path = db_path;
    }
    config.validate()?;

    tracing::info!(
        config = %cli.config,
        db = %config.database.path,
        "Starting octowatch"
    );

    let handles = StorageBuilder::new(&config.database.path)
        .pool_size(config.database.pool_size)
        .channel_capacity(config.database.channel_capacity)
        .build()?;

    let registry = CollectorRegistry::new().await?;
    let mut spawned = 0usize;
    for feed in &config.feeds.github {
        if !feed.enabled {
            tracing::info!(feed = %feed.name, "Feed disabled, skipping");
            continue;
        }
        let collector = GithubEventsCollector::new(feed.clone(), handles.writer.clone())?;
        let job_id = registry.spawn(collector).await?;
        tracing::info!(feed = %feed.name, %job_id, "Feed collector registered");
        spawned += 1;
    }
    if spawned == 0 {
        tracing::warn!("No enabled feeds configured; nothing will be collected");
    }
    registry.start().await?;

    let state = AppState {
        counts: handles.counts.clone(),
    };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Query API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down");
    if let Err(e) = registry.shutdown().await {
        tracing::error!(error = %e, "Collector registry shutdown failed");
    }
    handles.shutdown()?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
