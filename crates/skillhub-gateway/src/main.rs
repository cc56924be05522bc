use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use skillhub_core::config::SkillhubConfig;
use skillhub_scheduler::{SchedulerLimits, SqliteTaskStore, TaskScheduler};
use tracing::{info, warn};

mod app;
mod http;
mod rpc;

#[derive(Parser)]
#[command(name = "skillhub-gateway")]
#[command(about = "Skill scheduling gateway: cron validation, task lifecycle and calendar RPC")]
struct Args {
    /// Configuration file (defaults to ~/.skillhub/skillhub.toml)
    #[arg(short, long, env = "SKILLHUB_CONFIG")]
    config: Option<String>,

    /// Bind address, overrides `gateway.bind`
    #[arg(long)]
    bind: Option<String>,

    /// Listen port, overrides `gateway.port`
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "skillhub_gateway=info,skillhub_scheduler=info,tower_http=debug".into()
            }),
        )
        .init();

    let args = Args::parse();

    // load config: --config / SKILLHUB_CONFIG > ~/.skillhub/skillhub.toml
    let mut config = SkillhubConfig::load(args.config.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        SkillhubConfig::default()
    });
    if let Some(bind) = args.bind {
        config.gateway.bind = bind;
    }
    if let Some(port) = args.port {
        config.gateway.port = port;
    }

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL;")?;
    let store = SqliteTaskStore::new(db)?;
    info!("database migrations complete");

    let limits = SchedulerLimits::from(&config.scheduler);
    let scheduler = TaskScheduler::new(store).with_limits(limits);
    info!(
        upcoming_days = limits.upcoming_days,
        max_upcoming_runs = limits.max_upcoming_runs,
        max_calendar_events = limits.max_calendar_events,
        "task scheduler ready"
    );

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let state = Arc::new(app::AppState::new(scheduler));
    let router = app::build_router(state);

    info!("SkillHub gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway stopped");
    Ok(())
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if path == ":memory:" {
        return;
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
