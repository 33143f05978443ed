//! Endpoint declarations.
//!
//! # Data Flow
//! ```text
//! Controller type
//!     → descriptor.rs (type-level prefix, per-method verb + path)
//!     → controller.rs (endpoint table: descriptor + signature + invoker)
//!     → reply.rs (method return value → raw body or JSON)
//! ```
//!
//! # Design Decisions
//! - Endpoints are declared in an explicit table, not discovered by introspection
//! - Descriptors are inert data; validation happens at registration
//! - Raw replies (text, bytes, streams, pending results) bypass serialization

pub mod controller;
pub mod descriptor;
pub mod reply;

pub use controller::{Controller, Endpoint, Invoker, ParamType, ReturnKind, Signature};
pub use descriptor::{EndpointDescriptor, Verb};
pub use reply::{ByteStream, EmptyResponse, IntoReply, Json, Pending, Reply};
