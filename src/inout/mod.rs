//! Importers building a [`DataObjectPackage`] from outside sources, and the
//! SIP exporter.
//!
//! Every importer implements [`Importer`]. An import only produces a raw
//! package: callers run [`crate::core::vitam_normalize`] on it before use.
//!
//! | Source                  | Importer                                 | Feature     |
//! |-------------------------|------------------------------------------|-------------|
//! | Directory tree          | [`DiskToArchiveTransferImporter`]        |             |
//! | SIP container           | [`SipToArchiveTransferImporter`]         | `container` |
//! | DIP container           | [`DipToArchiveDeliveryRequestReplyImporter`] | `container` |
//! | Classification tree CSV | [`CsvTreeToDataObjectPackageImporter`]   | `csv`       |
//! | Metadata CSV            | [`CsvMetadataToDataObjectPackageImporter`] | `csv`     |
//! | Mail container          | [`MailImporter`]                         |             |

pub mod container;
pub mod csv_metadata;
pub mod csv_tree;
pub mod disk;
pub mod file_object;
pub mod mail;

#[cfg(feature = "csv")]
mod csv_source;

pub use container::{DipToArchiveDeliveryRequestReplyImporter, SipExporter, SipToArchiveTransferImporter};
pub use csv_metadata::CsvMetadataToDataObjectPackageImporter;
pub use csv_tree::CsvTreeToDataObjectPackageImporter;
pub use disk::DiskToArchiveTransferImporter;
pub use mail::MailImporter;

use crate::common::{ProgressLogger, Result};
use crate::core::{DataObjectPackage, GlobalMetadata};

/// Result of one import.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub package: DataObjectPackage,
    /// Manifest header and trailer, when the source carries one
    pub global_metadata: Option<GlobalMetadata>,
    pub summary: String,
}

/// A source of packages.
pub trait Importer: Send {
    /// Run the import, polling `progress` for cancellation.
    fn do_import(&mut self, progress: &ProgressLogger) -> Result<ImportOutcome>;
}
