//! Common types and utilities shared across the SEDA model, the importers
//! and the application layer.

// Submodule declarations
pub mod error;
pub mod id;
pub mod progress;
pub mod xml;

// Re-exports for convenience
pub use error::{Error, Result};
pub use progress::{ProgressLevel, ProgressLogger, ProgressSink};
