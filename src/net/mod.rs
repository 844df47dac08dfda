//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept with poll timeout, connection limits)
//!     → tls.rs (optional TLS handshake, inside the connection task)
//!     → connection.rs (id + lifecycle tracking)
//!     → Hand off to the query handler
//!
//! Connection States:
//!     Accepting → Handshaking → Active → Closed
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked so shutdown can drain in-flight queries
//! - TLS is optional and handled transparently

pub mod connection;
pub mod listener;
pub mod tls;
