//! What an import reads, and how.

use crate::app::prefs::Prefs;
use crate::common::{Error, Result};
use crate::inout::{
    CsvMetadataToDataObjectPackageImporter, CsvTreeToDataObjectPackageImporter,
    DipToArchiveDeliveryRequestReplyImporter, DiskToArchiveTransferImporter, Importer, MailImporter,
    SipToArchiveTransferImporter,
};
use crate::mailextract::{MailExtractOptions, MailExtractor};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source of one import, selecting the importer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportContext {
    Disk {
        paths: Vec<PathBuf>,
        ignore_patterns: Vec<String>,
    },
    Sip {
        source: PathBuf,
    },
    Dip {
        source: PathBuf,
    },
    CsvTree {
        path: PathBuf,
        charset: String,
        delimiter: char,
    },
    CsvMetadata {
        path: PathBuf,
        charset: String,
        delimiter: char,
    },
    Mail {
        source: PathBuf,
        options: MailExtractOptions,
        ignore_patterns: Vec<String>,
    },
}

impl ImportContext {
    pub fn disk(paths: Vec<PathBuf>, prefs: &Prefs) -> Self {
        ImportContext::Disk {
            paths,
            ignore_patterns: prefs.ignore_patterns.clone(),
        }
    }

    pub fn sip(source: impl Into<PathBuf>) -> Self {
        ImportContext::Sip { source: source.into() }
    }

    pub fn dip(source: impl Into<PathBuf>) -> Self {
        ImportContext::Dip { source: source.into() }
    }

    pub fn csv_tree(path: impl Into<PathBuf>, prefs: &Prefs) -> Self {
        ImportContext::CsvTree {
            path: path.into(),
            charset: prefs.csv_charset.clone(),
            delimiter: prefs.csv_delimiter,
        }
    }

    pub fn csv_metadata(path: impl Into<PathBuf>, prefs: &Prefs) -> Self {
        ImportContext::CsvMetadata {
            path: path.into(),
            charset: prefs.csv_charset.clone(),
            delimiter: prefs.csv_delimiter,
        }
    }

    pub fn mail(source: impl Into<PathBuf>, options: MailExtractOptions, prefs: &Prefs) -> Self {
        ImportContext::Mail {
            source: source.into(),
            options,
            ignore_patterns: prefs.ignore_patterns.clone(),
        }
    }

    /// Short label of the import kind.
    pub fn description(&self) -> &'static str {
        match self {
            ImportContext::Disk { .. } => "disk tree",
            ImportContext::Sip { .. } => "SIP",
            ImportContext::Dip { .. } => "DIP",
            ImportContext::CsvTree { .. } => "CSV classification tree",
            ImportContext::CsvMetadata { .. } => "CSV metadata",
            ImportContext::Mail { .. } => "mail container",
        }
    }

    /// Container to extract before import, if any.
    ///
    /// Such sources need a temporary directory under the work directory.
    pub fn on_disk_input(&self) -> Option<&Path> {
        match self {
            ImportContext::Sip { source } | ImportContext::Dip { source } | ImportContext::Mail { source, .. } => {
                Some(source)
            },
            _ => None,
        }
    }

    /// Directory holding what the import reads, remembered in the prefs.
    pub fn import_dir(&self) -> Option<PathBuf> {
        let source = match self {
            ImportContext::Disk { paths, .. } => paths.first()?,
            ImportContext::CsvTree { path, .. } | ImportContext::CsvMetadata { path, .. } => path,
            ImportContext::Sip { source } | ImportContext::Dip { source } | ImportContext::Mail { source, .. } => {
                source
            },
        };
        source
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }

    /// Importer for this context.
    ///
    /// `target` is the extraction directory of containers, `extractor` the
    /// mail extractor, only needed by mail imports.
    pub fn build_importer(
        &self,
        target: Option<&Path>,
        extractor: Option<Arc<dyn MailExtractor>>,
    ) -> Result<Box<dyn Importer>> {
        let target = || {
            target
                .map(Path::to_path_buf)
                .ok_or_else(|| Error::Other(format!("No extraction directory for the {} import", self.description())))
        };
        let importer: Box<dyn Importer> = match self {
            ImportContext::Disk { paths, ignore_patterns } => {
                Box::new(DiskToArchiveTransferImporter::new(paths.clone()).with_ignore_patterns(ignore_patterns)?)
            },
            ImportContext::Sip { source } => Box::new(SipToArchiveTransferImporter::new(source, target()?)),
            ImportContext::Dip { source } => Box::new(DipToArchiveDeliveryRequestReplyImporter::new(source, target()?)),
            ImportContext::CsvTree { path, charset, delimiter } => {
                Box::new(CsvTreeToDataObjectPackageImporter::new(path, charset, *delimiter))
            },
            ImportContext::CsvMetadata { path, charset, delimiter } => {
                Box::new(CsvMetadataToDataObjectPackageImporter::new(path, charset, *delimiter))
            },
            ImportContext::Mail {
                source,
                options,
                ignore_patterns,
            } => {
                let extractor = extractor
                    .ok_or_else(|| Error::Unsupported("No mail extractor available".to_string()))?;
                Box::new(
                    MailImporter::new(extractor, options.clone(), source, target()?)
                        .with_ignore_patterns(ignore_patterns.clone()),
                )
            },
        };
        Ok(importer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_take_prefs_defaults() {
        let prefs = Prefs {
            csv_charset: "windows-1252".to_string(),
            csv_delimiter: ',',
            ..Default::default()
        };
        assert_eq!(
            ImportContext::csv_tree("tree.csv", &prefs),
            ImportContext::CsvTree {
                path: PathBuf::from("tree.csv"),
                charset: "windows-1252".to_string(),
                delimiter: ',',
            }
        );
        let ImportContext::Disk { ignore_patterns, .. } = ImportContext::disk(vec![], &prefs) else {
            panic!("disk context expected");
        };
        assert_eq!(ignore_patterns, prefs.ignore_patterns);
    }

    #[test]
    fn test_on_disk_input() {
        let prefs = Prefs::default();
        assert_eq!(ImportContext::sip("a.zip").on_disk_input(), Some(Path::new("a.zip")));
        assert_eq!(
            ImportContext::mail("box.pst", MailExtractOptions::default(), &prefs).on_disk_input(),
            Some(Path::new("box.pst"))
        );
        assert!(ImportContext::csv_metadata("m.csv", &prefs).on_disk_input().is_none());
    }

    #[test]
    fn test_mail_without_extractor() {
        let context = ImportContext::mail("box.pst", MailExtractOptions::default(), &Prefs::default());
        let err = context.build_importer(Some(Path::new("/tmp/box-tmpdir")), None).err().unwrap();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_container_needs_target() {
        assert!(ImportContext::dip("d.zip").build_importer(None, None).is_err());
    }
}
