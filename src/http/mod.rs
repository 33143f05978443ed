//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, catch-all dispatch)
//!     → request.rs (request ID)
//!     → [route table picks hooks and endpoint]
//!     → context.rs (request view + response under construction)
//!     → adapter.rs (invoke endpoint: inline or on the dispatch pool)
//!     → response.rs (resolve result, write body)
//!     → Send to client
//! ```

pub mod adapter;
pub mod context;
pub mod request;
pub mod response;
pub mod server;

pub use adapter::{Handler, Rejection};
pub use context::{Cancellation, RequestContext};
pub use request::X_REQUEST_ID;
pub use server::{HttpServer, RegistrationReport, SkippedEndpoint};
