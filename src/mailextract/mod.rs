//! Boundary with mail container extraction.
//!
//! Mailbox formats are parsed by an external [`MailExtractor`]. It unpacks a
//! container into a directory tree that the on-disk importer then reads.

use crate::common::ProgressLogger;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised by a mail extractor.
#[derive(Error, Debug)]
pub enum MailExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Container protocol not handled by the extractor
    #[error("Unknown mail protocol: {0}")]
    UnknownProtocol(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Extraction interrupted")]
    Interrupted,
}

/// What to extract from a mail container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailExtractOptions {
    /// Container protocol, such as `pst`, `mbox`, `eml` or `thunderbird`
    pub protocol: String,
    /// Folder to extract, the whole container when empty
    pub mail_folder: String,
    pub default_charset: String,
    pub extract_message_text_file: bool,
    pub extract_message_text_metadata: bool,
    pub extract_attachment_text_file: bool,
    pub extract_attachment_text_metadata: bool,
}

impl Default for MailExtractOptions {
    fn default() -> Self {
        Self {
            protocol: "pst".to_string(),
            mail_folder: String::new(),
            default_charset: "windows-1252".to_string(),
            extract_message_text_file: false,
            extract_message_text_metadata: false,
            extract_attachment_text_file: false,
            extract_attachment_text_metadata: false,
        }
    }
}

/// Mail container extractor.
///
/// Implementations write the extracted tree under `target` and return a
/// summary line. They should poll `progress` to honour cancellation and
/// report [`MailExtractError::Interrupted`] when it fires.
pub trait MailExtractor: Send + Sync {
    fn extract(
        &self,
        options: &MailExtractOptions,
        source: &Path,
        target: &Path,
        progress: &ProgressLogger,
    ) -> Result<String, MailExtractError>;
}

impl From<crate::common::Error> for MailExtractError {
    fn from(err: crate::common::Error) -> Self {
        match err {
            crate::common::Error::Interrupted => MailExtractError::Interrupted,
            crate::common::Error::Io(e) => MailExtractError::Io(e),
            other => MailExtractError::Extraction(other.to_string()),
        }
    }
}
