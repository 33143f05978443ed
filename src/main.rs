//! `routebind` demo server.
//!
//! Serves the demo namespace (greetings and an in-memory notes store) with
//! configuration from an optional TOML file.
//!
//! ```text
//! routebind [--config routebind.toml] [--port 8080] [--api-key KEY]...
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::HeaderName;
use clap::Parser;

use routebind::config::{load_config, ServerConfig};
use routebind::observability::{logging, metrics};
use routebind::security::{AccessPolicy, RequireHeader};
use routebind::{demo, lifecycle, Shutdown};

#[derive(Parser)]
#[command(name = "routebind")]
#[command(about = "Serve the routebind demo endpoints", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener port, overriding the configuration.
    #[arg(short, long)]
    port: Option<u16>,

    /// Require an `x-api-key` header with one of these values.
    #[arg(long = "api-key")]
    api_keys: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener.port = port;
    }

    logging::init(&config.observability);
    tracing::info!("routebind v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let policy: Option<Arc<dyn AccessPolicy>> = if cli.api_keys.is_empty() {
        None
    } else {
        Some(Arc::new(RequireHeader::new(
            HeaderName::from_static("x-api-key"),
            cli.api_keys,
        )))
    };

    let shutdown = Shutdown::new();
    lifecycle::start(config, policy, &demo::catalog(), [demo::NAMESPACE], shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
