//! SEDA package model: data objects, archive units, the package holding
//! them, manifests and normalization.

pub mod archive_unit;
pub mod data_object;
pub mod manifest;
pub mod normalize;
pub mod package;

pub use archive_unit::ArchiveUnit;
pub use data_object::{
    BinaryDataObject, DataObject, DataObjectGroup, DataObjectRef, MessageDigest, PhysicalDataObject,
};
pub use manifest::{ArchiveDeliveryRequestReply, ArchiveTransfer, GlobalMetadata};
pub use normalize::vitam_normalize;
pub use package::DataObjectPackage;

use crate::common::Result;

/// Outcome of trying to read one element kind at the reader position.
///
/// `NotPresent` means another element is next and nothing was consumed.
/// Malformed input is reported through the surrounding `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome<T> {
    NotPresent,
    Ok(T),
}

impl<T> ParseOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            ParseOutcome::NotPresent => None,
            ParseOutcome::Ok(value) => Some(value),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, ParseOutcome::Ok(_))
    }
}

/// Elements whose editable part is exchanged as indented XML fragments.
pub trait SedaXmlFragments {
    /// Editable content of the element as XML fragments.
    fn to_seda_xml_fragments(&self) -> Result<String>;

    /// Replace the editable content from XML fragments, keeping identity
    /// and links. Nothing changes on error.
    fn from_seda_xml_fragments(&mut self, fragments: &str) -> Result<()>;
}
