//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     type prefix + method path
//!     → path.rs (resolve full route path)
//!     → matcher.rs (compile pattern)
//!     → table.rs (store under verb + path, last registration wins)
//!
//! Incoming request (verb, path):
//!     → table.rs (BEFORE hooks, first matching endpoint, AFTER hooks)
//!     → matched route + captured path parameters, or no match
//! ```
//!
//! # Design Decisions
//! - Table built at startup, immutable at runtime
//! - No regex in hot path (segment matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod path;
pub mod table;

pub use matcher::PathPattern;
pub use path::{resolve, resolve_path};
pub use table::{Matched, Route, RouteKey, RouteTable};
