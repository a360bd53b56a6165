//! Enumerated string elements.

use crate::common::{Error, Result};
use crate::xml::{SedaXmlEventReader, SedaXmlStreamWriter};
use std::io::{BufRead, Write};

/// Element whose value belongs to a closed list, such as `DescriptionLevel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    element_name: String,
    value: String,
    allowed: &'static [&'static str],
}

impl EnumType {
    /// Build a value, failing if it is not in `allowed`.
    pub fn new(element_name: &str, value: &str, allowed: &'static [&'static str]) -> Result<Self> {
        let value = value.trim();
        if !allowed.contains(&value) {
            return Err(Error::MalformedMetadata(format!(
                "Value \"{}\" not allowed in <{}>, expected one of {}",
                value,
                element_name,
                allowed.join(", ")
            )));
        }
        Ok(Self {
            element_name: element_name.to_string(),
            value: value.to_string(),
            allowed,
        })
    }

    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn allowed(&self) -> &'static [&'static str] {
        self.allowed
    }

    pub fn to_seda_xml<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        writer.write_element_value(&self.element_name, &self.value)
    }

    pub fn from_seda_xml<R: BufRead>(
        reader: &mut SedaXmlEventReader<R>,
        element_name: &str,
        allowed: &'static [&'static str],
    ) -> Result<Self> {
        match reader.next_value_if_named(element_name)? {
            Some(text) => Self::new(element_name, &text, allowed),
            None => Err(Error::MalformedMetadata(format!("Expected <{}>", element_name))),
        }
    }
}
