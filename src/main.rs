//! Failover reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────┐
//!                          │                 FAILOVER PROXY               │
//!     Client Request       │  ┌─────────┐   ┌──────────────┐              │
//!     ─────────────────────┼─▶│  http   │──▶│load_balancer │              │
//!                          │  │ server  │   │ first healthy│              │
//!                          │  └────┬────┘   └──────┬───────┘              │
//!                          │       │               │ probe in order       │
//!                          │       │               ▼                      │
//!                          │       │        ┌──────────────┐  GET /health │
//!                          │       │        │    health    │──────────────┼──▶ Backends
//!                          │       │        │ live / cached│              │
//!                          │       ▼        └──────────────┘              │
//!     Client Response      │  ┌─────────┐                                 │
//!     ◀────────────────────┼──│ forward │◀────────────────────────────────┼──── Backend
//!                          │  └─────────┘   streamed both ways           │
//!                          └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use failover_proxy::config::{self, BackendConfig, ProxyConfig};
use failover_proxy::lifecycle::{signals, Shutdown};
use failover_proxy::observability::logging;
use failover_proxy::HttpServer;

/// Reverse proxy that forwards to the first healthy backend.
#[derive(Debug, Parser)]
#[command(name = "failover-proxy", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `listener.bind_address`.
    #[arg(short, long)]
    listen: Option<String>,

    /// Backend URL in priority order; repeat for each backend.
    /// Replaces the configured backend list.
    #[arg(short, long = "backend")]
    backends: Vec<String>,

    /// Log level, overrides `observability.log_level`.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<ProxyConfig, config::ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(listen) = self.listen {
            config.listener.bind_address = listen;
        }
        if !self.backends.is_empty() {
            config.backends = self.backends.into_iter().map(BackendConfig::new).collect();
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        config::check_config(&config)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;
    logging::init(&config.observability)?;

    tracing::info!("failover-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backends = ?config.backends.iter().map(|b| b.address.as_str()).collect::<Vec<_>>(),
        mode = ?config.health_check.mode,
        probe_timeout_ms = config.health_check.timeout_ms,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
