//! Plain string and language-tagged text elements.

use crate::common::{Error, Result};
use crate::xml::{SedaXmlEventReader, SedaXmlStreamWriter};
use std::io::{BufRead, Write};

/// Element holding a plain string, such as `ArchiveUnitProfile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringType {
    element_name: String,
    value: String,
}

impl StringType {
    pub fn new(element_name: &str, value: &str) -> Self {
        Self {
            element_name: element_name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }

    pub fn to_seda_xml<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        writer.write_element_value(&self.element_name, &self.value)
    }

    pub fn from_seda_xml<R: BufRead>(reader: &mut SedaXmlEventReader<R>, element_name: &str) -> Result<Self> {
        match reader.next_value_if_named(element_name)? {
            Some(value) => Ok(Self::new(element_name, &value)),
            None => Err(Error::MalformedMetadata(format!("Expected <{}>", element_name))),
        }
    }
}

/// Element holding text with an optional `xml:lang`, such as `Title`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextType {
    element_name: String,
    value: String,
    lang: Option<String>,
}

impl TextType {
    pub fn new(element_name: &str, value: &str, lang: Option<&str>) -> Self {
        Self {
            element_name: element_name.to_string(),
            value: value.to_string(),
            lang: lang.map(str::to_string),
        }
    }

    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    pub fn to_seda_xml<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        writer.write_start_element(&self.element_name)?;
        if let Some(lang) = &self.lang {
            writer.write_attribute("xml:lang", lang)?;
        }
        if !self.value.is_empty() {
            writer.write_characters(&self.value)?;
        }
        writer.write_end_element()
    }

    pub fn from_seda_xml<R: BufRead>(reader: &mut SedaXmlEventReader<R>, element_name: &str) -> Result<Self> {
        match reader.next_value_with_attributes_if_named(element_name)? {
            Some((attributes, value)) => {
                let lang = attributes
                    .iter()
                    .find(|(k, _)| k == "xml:lang" || k == "lang")
                    .map(|(_, v)| v.as_str());
                Ok(Self::new(element_name, &value, lang))
            },
            None => Err(Error::MalformedMetadata(format!("Expected <{}>", element_name))),
        }
    }
}
