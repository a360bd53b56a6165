//! Opaque XML elements kept verbatim.

use crate::common::{Error, Result};
use crate::xml::{SedaXmlEventReader, SedaXmlStreamWriter};
use std::io::{BufRead, Write};

/// Element whose content is not modeled, kept as compact XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnyXmlType {
    element_name: String,
    raw_xml: String,
}

impl AnyXmlType {
    /// Wrap an already serialized block. The block is checked when written.
    pub fn new(element_name: &str, raw_xml: &str) -> Self {
        Self {
            element_name: element_name.to_string(),
            raw_xml: raw_xml.to_string(),
        }
    }

    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    pub fn raw_xml(&self) -> &str {
        &self.raw_xml
    }

    pub fn to_seda_xml<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        writer.write_raw_xml_block_if_not_empty(Some(&self.raw_xml))
    }

    pub fn from_seda_xml<R: BufRead>(reader: &mut SedaXmlEventReader<R>, element_name: &str) -> Result<Self> {
        match reader.next_block_as_string_if_named(element_name)? {
            Some(raw_xml) => Ok(Self::new(element_name, &raw_xml)),
            None => Err(Error::MalformedMetadata(format!("Expected <{}>", element_name))),
        }
    }
}
