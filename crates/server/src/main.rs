//! sitegate edge entry point.
//!
//! Loads layered configuration, opens the resolver cache, and serves every
//! inbound request through the hostname dispatcher until SIGINT/SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sitegate_core::AppConfig;
use sitegate_server::{CacheHandle, EdgeState, Ports, build_router};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Json,
    Compact,
}

#[derive(Parser, Debug)]
#[command(name = "sitegate")]
#[command(about = "Multi-tenant edge router for published sites")]
struct Args {
    /// TOML config file (overrides SITEGATE_CONFIG_FILE)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (overrides listen_addr)
    #[arg(short, long)]
    listen: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value = "json")]
    log_format: LogFormat,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

/// Periodically drop expired cache entries.
fn spawn_purge(cache: CacheHandle, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match cache.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "purged expired cache entries"),
                Err(e) => tracing::warn!(error = %e, "cache purge failed"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let mut config = AppConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }

    let cache = CacheHandle::open(&config).await.context("failed to open resolver cache")?;
    let ports = Ports::from_config(&config, &cache).context("failed to build outbound clients")?;
    let state = Arc::new(EdgeState::new(&config, ports).context("failed to build edge state")?);
    spawn_purge(cache, config.purge_interval());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        platform_domain = %config.platform_domain,
        cache_backend = ?config.cache_backend,
        object_store = ?config.object_store,
        "sitegate edge listening"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("sitegate edge stopped");
    Ok(())
}
