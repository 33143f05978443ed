//! Metrics collection and exposition.
//!
//! # Metrics
//! - `routebind_requests_total` (counter): requests by verb, status
//! - `routebind_request_duration_seconds` (histogram): latency by verb
//! - `routebind_dispatch_in_flight` (gauge): method bodies running on workers
//! - `routebind_dispatch_rejected_total` (counter): calls refused by backpressure
//! - `routebind_dispatch_timeouts_total` (counter): calls past their deadline

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(verb: &str, status: u16, start: Instant) {
    counter!(
        "routebind_requests_total",
        "verb" => verb.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("routebind_request_duration_seconds", "verb" => verb.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_dispatch_started() {
    gauge!("routebind_dispatch_in_flight").increment(1.0);
}

pub fn record_dispatch_finished() {
    gauge!("routebind_dispatch_in_flight").decrement(1.0);
}

pub fn record_dispatch_rejected() {
    counter!("routebind_dispatch_rejected_total").increment(1);
}

pub fn record_dispatch_timeout() {
    counter!("routebind_dispatch_timeouts_total").increment(1);
}
