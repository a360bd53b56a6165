//! Integer elements.

use crate::common::{Error, Result};
use crate::xml::{SedaXmlEventReader, SedaXmlStreamWriter};
use std::io::{BufRead, Write};

/// Element holding an integer, such as `GpsAltitude`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerType {
    element_name: String,
    value: i64,
}

impl IntegerType {
    pub fn new(element_name: &str, value: i64) -> Self {
        Self {
            element_name: element_name.to_string(),
            value,
        }
    }

    pub fn parse(element_name: &str, text: &str) -> Result<Self> {
        let value = text.trim().parse::<i64>().map_err(|e| {
            Error::MalformedMetadata(format!("Invalid integer \"{}\" in <{}>: {}", text, element_name, e))
        })?;
        Ok(Self::new(element_name, value))
    }

    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn to_seda_xml<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        let mut buffer = itoa::Buffer::new();
        writer.write_element_value(&self.element_name, buffer.format(self.value))
    }

    pub fn from_seda_xml<R: BufRead>(reader: &mut SedaXmlEventReader<R>, element_name: &str) -> Result<Self> {
        match reader.next_value_if_named(element_name)? {
            Some(text) => Self::parse(element_name, &text),
            None => Err(Error::MalformedMetadata(format!("Expected <{}>", element_name))),
        }
    }
}
