//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Load dataset → Load TLS → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     stop() → Stop accepting → Drain in-flight queries → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then dataset, then listener
//! - Fail fast: any startup error is fatal and nothing is bound
//! - Shutdown drain has a deadline; stragglers are not killed, just not awaited

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
