//! Shared domain types for the Fingerlink biometric access node.
//!
//! This crate holds the vocabulary every other crate speaks: template
//! identifiers, inbound commands, report variants, connectivity states and
//! the timing/retry constants that bound every workflow.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
