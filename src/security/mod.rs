//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarded request:
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-*)
//!     → Pipeline
//! Backend response:
//!     → headers.rs (strip hop-by-hop)
//!     → Client
//! ```
//!
//! # Design Decisions
//! - Inbound requests are not authenticated; the backend owns that
//! - No trust in client-supplied connection headers

pub mod headers;
