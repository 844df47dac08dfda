//! Dataset subsystem.
//!
//! # Data Flow
//! ```text
//! Cached mode:
//!     startup → Dataset::load (once) → Arc<Dataset> shared by every handler
//!
//! Reread mode:
//!     each query → spawn_blocking(Dataset::load) → lookup → dropped
//! ```
//!
//! # Design Decisions
//! - A loaded Dataset is never mutated; a refresh means building a new one
//! - Cached-mode load failures are fatal at startup
//! - Reread-mode load failures are reported per query and never stop the server

pub mod lines;
pub mod store;

pub use lines::{Dataset, DatasetError};
pub use store::{DatasetMode, DatasetStore};
