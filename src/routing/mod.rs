//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Host header)
//!     → identifier.rs (leftmost host label)
//!     → resolver.rs (directory query: id ∧ tunnel type)
//!     → Return: backend address, NotFound, or directory error
//! ```
//!
//! # Design Decisions
//! - Identifiers are not validated; malformed ones simply fail to resolve
//! - Resolution is stateless; the pipeline cache sits above it
//! - Tunnel-type filtering is strict, never advisory

pub mod identifier;
pub mod resolver;

pub use identifier::{extract_identifier, request_host};
pub use resolver::{BackendResolver, ResolveError};
