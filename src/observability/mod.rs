//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, plain or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every log event (verb, path, request id)
//! - Request ID flows through all request logs via the trace span
//! - Metrics are cheap (no-ops until an exporter is installed)

pub mod logging;
pub mod metrics;
