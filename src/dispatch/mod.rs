//! Dispatch of value-returning endpoint methods.
//!
//! # Data Flow
//! ```text
//! Request task
//!     → pool.rs (acquire worker slot or queue, per overflow policy)
//!     → tokio blocking pool (method body runs)
//!     → result or timeout back on the request task
//! ```
//!
//! # Design Decisions
//! - Bounded: at most `max_workers` bodies run at once
//! - Backpressure: beyond `queue_depth` waiting calls, reject (503) or wait
//! - Every call has a deadline; on expiry the method is told to stop via
//!   its context and the request gets 504

pub mod pool;

pub use pool::{DispatchError, DispatchPool};
