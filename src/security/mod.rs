//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (consult the configured AccessPolicy)
//!     → Allow: hooks and endpoint run
//!     → Deny: answered with the policy's status and message
//! ```
//!
//! # Design Decisions
//! - Policy is pluggable; the binder ships only a header-based one
//! - Fail closed: a denial short-circuits before any endpoint code runs

pub mod access_control;

pub use access_control::{access_control_middleware, Access, AccessPolicy, Principal, RequireHeader};
