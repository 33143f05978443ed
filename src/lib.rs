//! Annotation-style route binding for axum.
//!
//! Controllers declare their endpoint methods in an explicit table
//! ([`endpoint::Controller`]); namespaces group controllers into a
//! [`discovery::Catalog`]. At startup the binder scans the requested
//! namespaces, validates each method, instantiates its controller and
//! attaches it to the HTTP server under the declared verb and path.
//!
//! ```text
//!     Catalog ──▶ discovery ──▶ http::adapter ──▶ routing::table
//!                 (scan)        (validate, wrap)   (verb + path)
//!
//!     Request ──▶ http::server ──▶ BEFORE hooks ──▶ endpoint ──▶ AFTER hooks
//!                                                   │
//!                                     void: inline  │  value: dispatch pool
//! ```

pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub mod demo;

use std::sync::Arc;

pub use config::ServerConfig;
pub use discovery::{Catalog, Namespace, Source};
pub use endpoint::{Controller, Endpoint, EndpointDescriptor, IntoReply, Json, Pending, Reply, Verb};
pub use error::{BoxError, Error, InvocationError, Result};
pub use http::{HttpServer, RegistrationReport, RequestContext};
pub use lifecycle::Shutdown;
pub use security::{Access, AccessPolicy};

/// Register every endpoint found under `sources` and serve them on `port`.
///
/// Uses the default configuration otherwise: JSON content type, CORS open
/// to all origins, no banner. Runs until Ctrl+C or SIGTERM.
pub async fn init<I, S>(
    port: u16,
    policy: Option<Arc<dyn AccessPolicy>>,
    catalog: &Catalog,
    sources: I,
) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: Into<Source>,
{
    let mut config = ServerConfig::default();
    config.listener.port = port;

    let shutdown = Shutdown::new();
    lifecycle::start(config, policy, catalog, sources, shutdown.subscribe()).await
}
