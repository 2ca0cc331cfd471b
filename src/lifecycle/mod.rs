//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Directory client → Transport → AppState → HttpServer
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then directory, then listener
//! - Fail fast: any startup error is fatal
//! - All long-lived state is built here and injected, nothing is global

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
