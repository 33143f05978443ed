//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// HTTP defaults (content type, CORS, body limits).
    pub http: HttpConfig,

    /// Worker pool for value-returning endpoints.
    pub dispatch: DispatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port`, as passed to the TCP bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// HTTP behaviour shared by every route.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Content type for responses that do not set one.
    pub default_content_type: String,

    /// Allow cross-origin requests from any origin.
    pub cors_allow_all_origins: bool,

    /// Log a banner line at startup.
    pub show_banner: bool,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// Whole-request timeout in seconds (0 = none).
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            default_content_type: "application/json".to_string(),
            cors_allow_all_origins: true,
            show_banner: false,
            max_body_size: 2 * 1024 * 1024, // 2MB
            request_timeout_secs: 0,
        }
    }
}

/// What to do with a call once `queue_depth` calls are already waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Fail the request with 503.
    #[default]
    Reject,
    /// Keep waiting for a worker.
    Wait,
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum method bodies running at once.
    pub max_workers: usize,

    /// Calls allowed to wait for a worker before the overflow policy applies.
    pub queue_depth: usize,

    pub overflow: OverflowPolicy,

    /// Per-call deadline in milliseconds, including queueing (0 = none).
    pub timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_workers: 64,
            queue_depth: 256,
            overflow: OverflowPolicy::Reject,
            timeout_ms: 30_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
