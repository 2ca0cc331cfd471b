//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Every request log line carries identifier, path and backend (or error)
//! - Request ID flows from the inbound request to the backend and back
//! - Metric macros are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
