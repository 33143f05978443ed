//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Register discovered endpoints into the route table
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (tracing, request ID, CORS, default content type,
//!   body limit, timeout, access policy)
//! - Run BEFORE hooks, the matched endpoint, then AFTER hooks
//! - Bind to a listener and serve until shutdown
//!
//! # Design Decisions
//! - Routes are matched by the route table, not by Axum, so duplicate and
//!   malformed paths never abort startup
//! - A failing endpoint is skipped at registration; the rest still serve

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::discovery::{scan, Catalog, Source};
use crate::dispatch::DispatchPool;
use crate::endpoint::Verb;
use crate::error::Error;
use crate::http::adapter::{self, Rejection};
use crate::http::request::{MakeRequestUuidV4, X_REQUEST_ID};
use crate::http::response;
use crate::http::RequestContext;
use crate::lifecycle::signals;
use crate::observability::metrics;
use crate::routing::{RouteKey, RouteTable};
use crate::security::{access_control_middleware, AccessPolicy};

/// An endpoint left out of the route table.
#[derive(Debug)]
pub struct SkippedEndpoint {
    /// Type name of the declaring controller.
    pub controller: &'static str,
    pub key: RouteKey,
    pub error: Error,
}

/// Outcome of one [`HttpServer::register`] call.
#[derive(Debug, Default)]
pub struct RegistrationReport {
    pub registered: Vec<RouteKey>,
    /// Keys registered earlier and overwritten by this call.
    pub replaced: Vec<RouteKey>,
    pub skipped: Vec<SkippedEndpoint>,
}

/// Application state injected into the dispatch handler.
#[derive(Clone)]
struct AppState {
    routes: Arc<RouteTable>,
    pool: Arc<DispatchPool>,
    max_body_size: usize,
}

pub struct HttpServer {
    config: ServerConfig,
    routes: RouteTable,
    policy: Option<Arc<dyn AccessPolicy>>,
    pool: Arc<DispatchPool>,
}

impl HttpServer {
    pub fn new(config: ServerConfig) -> Self {
        let pool = Arc::new(DispatchPool::new(&config.dispatch));
        Self {
            config,
            routes: RouteTable::new(),
            policy: None,
            pool,
        }
    }

    /// Consult `policy` before every request.
    pub fn with_access_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Scan each source in `catalog` and attach every endpoint found.
    pub fn register<I, S>(&mut self, catalog: &Catalog, sources: I) -> RegistrationReport
    where
        I: IntoIterator<Item = S>,
        S: Into<Source>,
    {
        let mut report = RegistrationReport::default();

        for source in sources {
            for endpoint in scan(catalog, &source.into()) {
                let key = RouteKey {
                    verb: endpoint.verb(),
                    path: endpoint.resolved_path(),
                };

                match endpoint.bind(&key.path) {
                    Ok(handler) => {
                        if self.routes.register(key.verb, key.path.clone(), handler) {
                            report.replaced.push(key.clone());
                        }
                        report.registered.push(key);
                    }
                    Err(error) => {
                        tracing::error!(controller = endpoint.controller(), "{}", error);
                        report.skipped.push(SkippedEndpoint {
                            controller: endpoint.controller(),
                            key,
                            error,
                        });
                    }
                }
            }
        }

        report
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the Axum router serving the registered routes.
    #[allow(deprecated)]
    pub fn into_router(self) -> Router {
        let http = &self.config.http;
        let state = AppState {
            routes: Arc::new(self.routes),
            pool: self.pool,
            max_body_size: http.max_body_size,
        };

        let mut router = Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state);

        if let Some(policy) = self.policy {
            router = router.layer(axum::middleware::from_fn_with_state(policy, access_control_middleware));
        }

        router = router.layer(RequestBodyLimitLayer::new(http.max_body_size));

        if http.request_timeout_secs > 0 {
            router = router.layer(TimeoutLayer::new(Duration::from_secs(http.request_timeout_secs)));
        }

        let content_type = HeaderValue::from_str(&http.default_content_type).unwrap_or_else(|_| {
            tracing::warn!(
                content_type = %http.default_content_type,
                "Invalid default content type, using application/json"
            );
            HeaderValue::from_static("application/json")
        });
        router = router.layer(SetResponseHeaderLayer::if_not_present(header::CONTENT_TYPE, content_type));

        if http.cors_allow_all_origins {
            router = router.layer(CorsLayer::permissive());
        }

        router
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    /// Serve until `shutdown` fires or Ctrl+C is received.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> crate::error::Result<()> {
        let addr = listener.local_addr()?;
        if self.config.http.show_banner {
            tracing::info!("routebind v{} serving on {}", env!("CARGO_PKG_VERSION"), addr);
        }
        tracing::info!(address = %addr, routes = self.routes.len(), "HTTP server starting");

        let app = self.into_router();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => tracing::info!("Shutdown requested"),
                    _ = signals::shutdown_signal() => {}
                }
            })
            .await
            .map_err(Error::Io)?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: match, run hooks and endpoint, render.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().as_str().to_string();

    let response = match handle(&state, request).await {
        Ok(ctx) => response::render(ctx).await,
        Err(rejection) => rejection.into_response(),
    };

    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

async fn handle(state: &AppState, request: Request<Body>) -> Result<RequestContext, Rejection> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, state.max_body_size)
        .await
        .map_err(|_| Rejection {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "Payload too large",
        })?;

    let mut ctx = RequestContext::new(parts, body);
    let path = ctx.path().to_string();

    for hook in state.routes.hooks(Verb::Before, &path).collect::<Vec<_>>() {
        ctx.bind_match(hook.route.path(), hook.params);
        ctx = adapter::execute(&hook.route.handler, ctx, &state.pool).await?;
    }

    match Verb::for_request(ctx.method()).and_then(|verb| state.routes.find(verb, &path)) {
        Some(matched) => {
            ctx.bind_match(matched.route.path(), matched.params);
            ctx = adapter::execute(&matched.route.handler, ctx, &state.pool).await?;
        }
        None => {
            tracing::debug!(method = %ctx.method(), path = %path, "No route matched");
            response::not_found(&mut ctx);
        }
    }

    for hook in state.routes.hooks(Verb::After, &path).collect::<Vec<_>>() {
        ctx.bind_match(hook.route.path(), hook.params);
        ctx = adapter::execute(&hook.route.handler, ctx, &state.pool).await?;
    }

    adapter::settle(&mut ctx, &state.pool).await?;
    Ok(ctx)
}
