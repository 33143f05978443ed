//! Endpoint discovery.
//!
//! # Data Flow
//! ```text
//! Catalog (namespaces → controllers, declared by the application)
//!     → scanner.rs (select namespaces under a source identifier)
//!     → namespace.rs (discovered endpoints, bindable to handlers)
//!     → handed to the server for registration
//! ```
//!
//! # Design Decisions
//! - Discovery reads an explicit catalog; nothing is found by introspection
//! - Sub-namespaces are included, matched by whole segments

pub mod namespace;
pub mod scanner;

pub use namespace::{Catalog, DiscoveredEndpoint, Namespace};
pub use scanner::{scan, NamespaceId, ScanError, Source};
