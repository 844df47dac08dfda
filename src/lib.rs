//! Exact-match line lookup over TCP, optionally secured with TLS.
//!
//! A client connects, sends one query, receives one of four response lines
//! and the connection is closed.

pub mod client;
pub mod config;
pub mod dataset;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod server;

pub use config::schema::ServerConfig;
pub use lifecycle::Shutdown;
pub use server::{LookupServer, Response, ServerHandle};
