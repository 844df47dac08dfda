//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config.txt (key=value lines)
//!     → loader.rs (flat string mapping)
//!     → schema.rs (serde: typed ServerConfig with defaults)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → shared via Arc with the accept loop and handlers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; overrides happen at construction time
//! - Every key except `linuxpath` has a default
//! - Unknown keys are ignored so client-only settings can share the file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::ServerConfig;
pub use validation::{validate_config, ValidationError};
