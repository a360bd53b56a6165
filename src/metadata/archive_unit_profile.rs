//! `ArchiveUnitProfile` element of an ArchiveUnit.

use crate::common::Result;
use crate::metadata::StringType;
use crate::xml::{SedaXmlEventReader, SedaXmlStreamWriter};
use std::io::{BufRead, Write};
use std::ops::Deref;

pub const ELEMENT_NAME: &str = "ArchiveUnitProfile";

/// Reference to the profile an ArchiveUnit conforms to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveUnitProfile(StringType);

impl ArchiveUnitProfile {
    pub fn new(value: &str) -> Self {
        Self(StringType::new(ELEMENT_NAME, value))
    }

    pub fn to_seda_xml<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        self.0.to_seda_xml(writer)
    }

    pub fn from_seda_xml<R: BufRead>(reader: &mut SedaXmlEventReader<R>) -> Result<Self> {
        StringType::from_seda_xml(reader, ELEMENT_NAME).map(Self)
    }
}

impl Default for ArchiveUnitProfile {
    fn default() -> Self {
        Self::new("")
    }
}

impl Deref for ArchiveUnitProfile {
    type Target = StringType;

    fn deref(&self) -> &StringType {
        &self.0
    }
}
