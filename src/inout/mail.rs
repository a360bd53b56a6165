//! Import of a mail container through a [`MailExtractor`].
//!
//! The extractor unpacks the container into the target directory, which is
//! then imported as a directory tree.

use crate::common::{ProgressLevel, ProgressLogger, Result};
use crate::inout::{DiskToArchiveTransferImporter, ImportOutcome, Importer};
use crate::mailextract::{MailExtractOptions, MailExtractor};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Imports a mail container.
#[derive(Clone)]
pub struct MailImporter {
    extractor: Arc<dyn MailExtractor>,
    options: MailExtractOptions,
    source: PathBuf,
    target: PathBuf,
    ignore_patterns: Vec<String>,
}

impl MailImporter {
    pub fn new(
        extractor: Arc<dyn MailExtractor>,
        options: MailExtractOptions,
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
    ) -> Self {
        Self {
            extractor,
            options,
            source: source.into(),
            target: target.into(),
            ignore_patterns: Vec::new(),
        }
    }

    /// Patterns of extracted file names left out of the package.
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }
}

impl fmt::Debug for MailImporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailImporter")
            .field("options", &self.options)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("ignore_patterns", &self.ignore_patterns)
            .finish_non_exhaustive()
    }
}

impl Importer for MailImporter {
    fn do_import(&mut self, progress: &ProgressLogger) -> Result<ImportOutcome> {
        progress.progress_log(
            ProgressLevel::Global,
            &format!(
                "Extraction of the {} container [{}]",
                self.options.protocol,
                self.source.display()
            ),
        )?;
        std::fs::create_dir_all(&self.target)?;
        let mail_summary = self
            .extractor
            .extract(&self.options, &self.source, &self.target, progress)?;
        progress.progress_log(ProgressLevel::Step, "Extraction finished")?;

        let mut disk = DiskToArchiveTransferImporter::new(vec![self.target.clone()])
            .with_ignore_patterns(&self.ignore_patterns)?;
        let mut outcome = disk.do_import(progress)?;
        outcome.summary = format!("{}\n{}", mail_summary, outcome.summary);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use crate::mailextract::MailExtractError;
    use std::path::Path;

    /// Writes one message folder per call, with a body and an attachment.
    struct FakeExtractor;

    impl MailExtractor for FakeExtractor {
        fn extract(
            &self,
            options: &MailExtractOptions,
            _source: &Path,
            target: &Path,
            progress: &ProgressLogger,
        ) -> std::result::Result<String, MailExtractError> {
            if options.protocol != "mbox" {
                return Err(MailExtractError::UnknownProtocol(options.protocol.clone()));
            }
            progress.check_interrupt()?;
            let message = target.join("Inbox").join("Hello");
            std::fs::create_dir_all(&message)?;
            std::fs::write(message.join("message.eml"), "Subject: Hello")?;
            std::fs::write(message.join("budget.xlsx"), "attachment")?;
            std::fs::write(message.join("Thumbs.db"), "junk")?;
            Ok("Mail extraction: 1 message".to_string())
        }
    }

    fn options(protocol: &str) -> MailExtractOptions {
        MailExtractOptions {
            protocol: protocol.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_mail_import() {
        let dir = tempfile::tempdir().unwrap();
        let mut importer = MailImporter::new(
            Arc::new(FakeExtractor),
            options("mbox"),
            dir.path().join("box.mbox"),
            dir.path().join("box-tmpdir"),
        )
        .with_ignore_patterns(vec!["Thumbs\\.db".to_string()]);
        let outcome = importer.do_import(&ProgressLogger::silent()).unwrap();
        assert!(outcome.summary.starts_with("Mail extraction: 1 message\nDisk import"));
        assert_eq!(outcome.package.binary_data_object_count(), 2);
    }

    #[test]
    fn test_unknown_protocol() {
        let dir = tempfile::tempdir().unwrap();
        let err = MailImporter::new(Arc::new(FakeExtractor), options("pst"), "box.pst", dir.path().join("t"))
            .do_import(&ProgressLogger::silent())
            .unwrap_err();
        assert!(matches!(err, Error::MailExtract(msg) if msg.contains("pst")));
    }

    #[test]
    fn test_cancelled_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let progress = ProgressLogger::silent();
        let mut importer = MailImporter::new(Arc::new(FakeExtractor), options("mbox"), "box", dir.path().join("t"));
        progress.cancel();
        assert!(matches!(importer.do_import(&progress), Err(Error::Interrupted)));
    }
}
