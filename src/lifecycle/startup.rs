//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the server from configuration
//! - Register every endpoint found in the given sources
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Registration completes before the listener is bound, so traffic only
//!   arrives once every route is in place
//! - Skipped endpoints are logged, never fatal; bind failure is

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::ServerConfig;
use crate::discovery::{Catalog, Source};
use crate::error::Result;
use crate::http::HttpServer;
use crate::security::AccessPolicy;

/// Register `sources` from `catalog` and serve them with `config`.
pub async fn start<I, S>(
    config: ServerConfig,
    policy: Option<Arc<dyn AccessPolicy>>,
    catalog: &Catalog,
    sources: I,
    shutdown: broadcast::Receiver<()>,
) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: Into<Source>,
{
    let bind_address = config.listener.bind_address();

    let mut server = HttpServer::new(config);
    if let Some(policy) = policy {
        server = server.with_access_policy(policy);
    }

    let report = server.register(catalog, sources);
    tracing::info!(
        registered = report.registered.len(),
        replaced = report.replaced.len(),
        skipped = report.skipped.len(),
        "Endpoint registration complete"
    );

    let listener = TcpListener::bind(&bind_address).await?;
    server.run(listener, shutdown).await
}
