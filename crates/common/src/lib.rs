//! Meetcast Common Utilities
//!
//! Shared infrastructure for all Meetcast crates:
//! - Error types and result aliases
//! - Render configuration (layout, feature flags, encoder settings)
//! - Tracing/logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
