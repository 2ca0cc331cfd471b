//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! (identifier, resolved address)
//!     → cache.rs (hit: existing pipeline / miss: build under lock)
//!     → pipeline.rs (rewrite URI to https://<address>, forward)
//!     → tls.rs (rustls client, any backend certificate accepted)
//!     → Backend
//! ```

pub mod cache;
pub mod pipeline;
pub mod tls;

pub use cache::PipelineCache;
pub use pipeline::{ForwardError, Pipeline, Transport};
