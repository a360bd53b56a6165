//! Unified error types for Resip.
//!
//! This module provides the error type shared by the XML primitives, the
//! SEDA model, the importers and the import orchestration.

// Submodule declarations
pub mod types;
pub mod conversions;

// Re-exports
pub use types::{Error, Result};
