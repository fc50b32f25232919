//! Kincare server
//!
//! Serves the REST API and the `/ws` relay for the Grace and Alex personas.
//!
//! ```bash
//! # In-memory store seeded with the demo household
//! kincare-server
//!
//! # SQLite with an OpenAI-backed generator
//! OPENAI_API_KEY=... kincare-server --storage sqlite --database-url sqlite://kincare.db
//!
//! # Environment overrides
//! KINCARE__SERVER__PORT=8080 kincare-server
//! ```

mod config;

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use kincare_agents::{KeywordGenerator, LlmGenerator, ResponseGenerator};
use kincare_api::{create_router, ApiConfig, AppState, HubConfig};
use kincare_db::{open_store, StorageBackend};
use kincare_llm::{LlmRouter, ProviderKind};
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LoggingConfig, ServerConfig};

/// Kincare server
#[derive(Parser, Debug)]
#[command(name = "kincare-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long, env = "KINCARE_CONFIG")]
    config: Option<String>,

    #[arg(long, env = "KINCARE_HOST")]
    host: Option<String>,

    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// trace, debug, info, warn or error
    #[arg(long, env = "KINCARE_LOG_LEVEL")]
    log_level: Option<String>,

    /// json or pretty
    #[arg(long, env = "KINCARE_LOG_FORMAT")]
    log_format: Option<String>,

    /// memory or sqlite
    #[arg(long, env = "KINCARE_STORAGE")]
    storage: Option<String>,

    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// openai, openai_compat or deterministic
    #[arg(long, env = "KINCARE_LLM_PROVIDER")]
    llm_provider: Option<String>,

    /// Start with an empty store
    #[arg(long)]
    no_seed: bool,
}

impl Args {
    fn apply(self, config: &mut ServerConfig) -> anyhow::Result<()> {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(storage) = self.storage {
            config.database.backend = StorageBackend::from_str(&storage)
                .ok_or_else(|| anyhow::anyhow!("unknown storage backend: {}", storage))?;
        }
        if let Some(url) = self.database_url {
            config.database.url = url;
        }
        if self.llm_provider.is_some() {
            config.llm.provider = self.llm_provider;
        }
        if self.no_seed {
            config.database.seed_demo_data = false;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    args.apply(&mut server_config)?;

    init_logging(&server_config.logging);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Kincare server");

    let store = open_store(&server_config.database).await?;
    let generator = init_generator(server_config.llm.provider.as_deref())?;

    if server_config.metrics.enabled {
        start_metrics_exporter(server_config.metrics.port)?;
    }

    let state = Arc::new(AppState::new(
        store,
        generator,
        HubConfig::from(&server_config.hub),
    ));
    let app = create_router(state, ApiConfig::from(&server_config.api));

    let addr = server_config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server listening");

    let (stopping_tx, stopping_rx) = watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = stopping_tx.send(true);
        })
        .into_future();
    drain_within(server, stopping_rx, server_config.server.shutdown_timeout()).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .init();
        }
    }
}

/// LLM-backed when a live provider is configured, keyword rules otherwise
fn init_generator(provider: Option<&str>) -> anyhow::Result<Arc<dyn ResponseGenerator>> {
    let router = match provider {
        Some(name) => {
            let kind = ProviderKind::from_str(name)
                .ok_or_else(|| anyhow::anyhow!("unknown LLM provider: {}", name))?;
            LlmRouter::from_kind(kind)
        }
        None => LlmRouter::from_env(),
    };

    let generator: Arc<dyn ResponseGenerator> = if router.is_live() {
        Arc::new(LlmGenerator::new(router))
    } else {
        Arc::new(KeywordGenerator::new())
    };
    tracing::info!(generator = generator.name(), "Response generator ready");
    Ok(generator)
}

fn start_metrics_exporter(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(port, "Metrics exporter started");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

/// Drive `server` to completion, giving it at most `grace` to drain its
/// connections once `stopping` flips to true
async fn drain_within<S, E>(
    server: S,
    stopping: watch::Receiver<bool>,
    grace: Duration,
) -> Result<(), E>
where
    S: Future<Output = Result<(), E>>,
{
    tokio::select! {
        res = server => res,
        _ = drain_deadline(stopping, grace) => {
            tracing::warn!(
                timeout_secs = grace.as_secs(),
                "Connections still open after shutdown timeout, exiting"
            );
            Ok(())
        }
    }
}

async fn drain_deadline(mut stopping: watch::Receiver<bool>, grace: Duration) {
    if stopping.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
    tracing::info!(timeout_secs = grace.as_secs(), "Waiting for in-flight requests");
    tokio::time::sleep(grace).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["kincare-server", "--port", "8080", "--storage", "sqlite"]);
        assert_eq!(args.port, Some(8080));

        let mut config = ServerConfig::default();
        args.apply(&mut config).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.backend, StorageBackend::Sqlite);
    }

    #[test]
    fn test_unknown_storage_rejected() {
        let args = Args::parse_from(["kincare-server", "--storage", "postgres"]);
        assert!(args.apply(&mut ServerConfig::default()).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_drain_is_cut_at_grace() {
        let (tx, rx) = watch::channel(false);
        let stuck = std::future::pending::<Result<(), std::io::Error>>();
        let started = tokio::time::Instant::now();
        let run = tokio::spawn(drain_within(stuck, rx, Duration::from_secs(10)));

        // Nothing happens before the signal
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!run.is_finished());

        tx.send(true).unwrap();
        run.await.unwrap().unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(70));
        assert!(elapsed < Duration::from_secs(71));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quick_drain_skips_grace() {
        let (tx, rx) = watch::channel(false);
        let mut seen = tx.subscribe();
        let server = async move {
            let _ = seen.wait_for(|stop| *stop).await;
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<(), std::io::Error>(())
        };

        let started = tokio::time::Instant::now();
        tx.send(true).unwrap();
        drain_within(server, rx, Duration::from_secs(30)).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_deterministic_provider_uses_keywords() {
        let generator = init_generator(Some("deterministic")).unwrap();
        assert_eq!(generator.name(), "keyword");
        assert!(init_generator(Some("telepathy")).is_err());
    }
}
