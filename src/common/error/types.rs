//! Unified error types for Resip.
//!
//! Parse-level failures carry the identifier of the element being read when
//! one is known, see [`Error::context`].
use thiserror::Error;

/// Main error type for Resip operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Low-level XML syntax error
    #[error("XML error: {0}")]
    XmlError(String),

    /// XML does not have the expected tag or shape
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Metadata fragment does not match its expected element
    #[error("Malformed metadata: {0}")]
    MalformedMetadata(String),

    /// SEDA 2.0 and SEDA 2.1 data object linkage mixed in one document
    #[error("Schema version conflict: {0}")]
    SchemaVersionConflict(String),

    /// Identifier already used in the package
    #[error("Duplicate identifier: {0}")]
    DuplicateId(String),

    /// Named resource on disk already exists
    #[error("Resource conflict: {0}")]
    ResourceConflict(String),

    /// Work interrupted through the progress logger
    #[error("Interrupted")]
    Interrupted,

    /// Operation cancelled by the user
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// An import is already running
    #[error("An import is already in progress")]
    ImportInProgress,

    /// CSV reading error
    #[error("CSV error: {0}")]
    Csv(String),

    /// ZIP container error
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// Preferences could not be read or written
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mail extraction collaborator failure
    #[error("Mail extraction error: {0}")]
    MailExtract(String),

    /// Unsupported feature
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Feature disabled at compile time
    #[error("Feature '{0}' is disabled. Enable it with --features {0}")]
    FeatureDisabled(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap a parse-level error with the element it happened in.
    ///
    /// The variant is kept so that callers can still tell a schema conflict
    /// from a plain malformed document. Non parse-level errors are returned
    /// unchanged.
    pub fn context(self, element: &str) -> Self {
        match self {
            Error::MalformedDocument(msg) => {
                Error::MalformedDocument(format!("{}\n->{}", element, msg))
            },
            Error::MalformedMetadata(msg) => {
                Error::MalformedMetadata(format!("{}\n->{}", element, msg))
            },
            Error::SchemaVersionConflict(msg) => {
                Error::SchemaVersionConflict(format!("{}\n->{}", element, msg))
            },
            Error::XmlError(msg) => Error::MalformedDocument(format!("{}\n->{}", element, msg)),
            other => other,
        }
    }

    /// Whether this error stops a run without being a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Interrupted | Error::Cancelled(_))
    }
}

/// Result type for Resip operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_variant() {
        let err = Error::SchemaVersionConflict("mixed linkage".to_string())
            .context("DataObjectGroup [ID1]");
        match err {
            Error::SchemaVersionConflict(msg) => {
                assert!(msg.starts_with("DataObjectGroup [ID1]"));
                assert!(msg.ends_with("mixed linkage"));
            },
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_context_turns_xml_error_into_malformed_document() {
        let err = Error::XmlError("unexpected EOF".to_string()).context("ArchiveUnit [ID4]");
        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[test]
    fn test_context_leaves_io_untouched() {
        let err = Error::Io(std::io::Error::other("disk")).context("ArchiveUnit [ID4]");
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_cancellation());
        assert!(Error::Interrupted.is_cancellation());
    }
}
