//! Query server subsystem.
//!
//! # Data Flow
//! ```text
//! acceptor.rs  bind → accept loop → one task per connection
//!     → (TLS handshake if enabled)
//!     → handler.rs  read → validate → lookup → respond → close
//!     → response.rs  one of four fixed lines
//! ```
//!
//! # Design Decisions
//! - One-shot protocol: a connection carries one query and one response
//! - Handlers never report errors upward; every outcome is a response line
//!   or a logged, abandoned connection
//! - `stop()` halts accepting only; in-flight handlers finish on their own

pub mod acceptor;
pub mod handler;
pub mod response;

pub use acceptor::{LookupServer, ServerError, ServerHandle};
pub use handler::QueryHandler;
pub use response::Response;
