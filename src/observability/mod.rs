//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Accept loop and query handlers produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape, when configured)
//! ```
//!
//! # Design Decisions
//! - Every query log line carries query, peer and elapsed_ms fields
//! - Metrics are cheap no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
