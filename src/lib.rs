//! Resip - A Rust library for building SEDA archival transfer packages
//!
//! This library reads, builds and writes the packages exchanged with a SEDA
//! 2.1 archiving system: the `ArchiveTransfer` manifest of a SIP and the
//! `ArchiveDeliveryRequestReply` manifest of a DIP, with the files they
//! describe.
//!
//! # Features
//!
//! - **Manifest model**: archive units, data object groups, binary and
//!   physical objects, typed descriptive metadata
//! - **Streaming XML**: pull reader and indenting writer over `quick-xml`
//! - **Normalization**: SEDA 2.0 object linkage resolution and reference checks
//! - **Importers**: directory trees, SIP and DIP containers, CSV
//!   classification trees and metadata, mail containers
//! - **Export**: SIP containers
//! - **Background imports**: one cancellable import at a time, with
//!   all-or-nothing installation of the result
//!
//! # Example - Reading a manifest
//!
//! ```no_run
//! use resip::core::{ArchiveTransfer, vitam_normalize};
//! use resip::common::ProgressLogger;
//!
//! # fn main() -> resip::Result<()> {
//! let progress = ProgressLogger::silent();
//! let mut transfer = ArchiveTransfer::from_file("sip/manifest.xml".as_ref(), &progress)?;
//! let summary = vitam_normalize(&mut transfer.package, &progress)?;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Importing a directory tree
//!
//! ```no_run
//! use resip::common::ProgressLogger;
//! use resip::inout::{DiskToArchiveTransferImporter, Importer};
//!
//! # fn main() -> resip::Result<()> {
//! let progress = ProgressLogger::silent();
//! let mut importer = DiskToArchiveTransferImporter::from_path("fonds")
//!     .with_ignore_patterns(&["Thumbs\\.db"])?;
//! let outcome = importer.do_import(&progress)?;
//! println!("{}", outcome.summary);
//! # Ok(())
//! # }
//! ```

/// Error type, progress reporting and identifier helpers
pub mod common;

/// Streaming XML reader and writer
pub mod xml;

/// SEDA metadata type hierarchy
pub mod metadata;

/// Package model, manifests and normalization
pub mod core;

/// Importers and the SIP exporter
pub mod inout;

/// Boundary with mail container extraction
pub mod mailextract;

/// Preferences, import orchestration and edition helpers
pub mod app;

pub use common::{Error, Result};
