//! Shared utilities for end-to-end tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use routebind::config::ServerConfig;
use routebind::discovery::{Catalog, Source};
use routebind::http::{HttpServer, RegistrationReport};
use routebind::lifecycle::Shutdown;
use routebind::security::AccessPolicy;
use tokio::net::TcpListener;

/// A server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub report: RegistrationReport,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Register `sources` and serve them until the returned server is dropped.
pub async fn start_server<S: Into<Source>>(
    config: ServerConfig,
    policy: Option<Arc<dyn AccessPolicy>>,
    catalog: &Catalog,
    sources: Vec<S>,
) -> TestServer {
    let mut server = HttpServer::new(config);
    if let Some(policy) = policy {
        server = server.with_access_policy(policy);
    }
    let report = server.register(catalog, sources);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer { addr, report, shutdown }
}

/// Client without connection pooling or system proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
