//! Date and date-time elements.

use crate::common::{Error, Result};
use crate::xml::{SedaXmlEventReader, SedaXmlStreamWriter};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use std::io::{BufRead, Write};

/// Element holding an `xsd:date`, such as `BirthDate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateType {
    element_name: String,
    value: NaiveDate,
}

impl DateType {
    pub fn new(element_name: &str, value: NaiveDate) -> Self {
        Self {
            element_name: element_name.to_string(),
            value,
        }
    }

    /// Parse from the lexical `YYYY-MM-DD` form.
    pub fn parse(element_name: &str, text: &str) -> Result<Self> {
        let value = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|e| {
            Error::MalformedMetadata(format!("Invalid date \"{}\" in <{}>: {}", text, element_name, e))
        })?;
        Ok(Self::new(element_name, value))
    }

    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    pub fn value(&self) -> NaiveDate {
        self.value
    }

    pub fn lexical(&self) -> String {
        self.value.format("%Y-%m-%d").to_string()
    }

    pub fn to_seda_xml<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        writer.write_element_value(&self.element_name, &self.lexical())
    }

    pub fn from_seda_xml<R: BufRead>(reader: &mut SedaXmlEventReader<R>, element_name: &str) -> Result<Self> {
        match reader.next_value_if_named(element_name)? {
            Some(text) => Self::parse(element_name, &text),
            None => Err(Error::MalformedMetadata(format!("Expected <{}>", element_name))),
        }
    }
}

/// Parsed value of a date-time element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeValue {
    /// Date only, accepted where SEDA allows a date or a date-time
    Date(NaiveDate),
    /// Date-time without offset
    Local(NaiveDateTime),
    /// Date-time with offset
    Zoned(DateTime<FixedOffset>),
}

/// Element holding an `xsd:dateTime`, such as `CreatedDate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeType {
    element_name: String,
    value: DateTimeValue,
}

impl DateTimeType {
    pub fn new(element_name: &str, value: DateTimeValue) -> Self {
        Self {
            element_name: element_name.to_string(),
            value,
        }
    }

    /// Parse from any of the accepted lexical forms.
    pub fn parse(element_name: &str, text: &str) -> Result<Self> {
        let text = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Ok(Self::new(element_name, DateTimeValue::Zoned(dt)));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self::new(element_name, DateTimeValue::Local(dt)));
        }
        if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Ok(Self::new(element_name, DateTimeValue::Date(d)));
        }
        Err(Error::MalformedMetadata(format!(
            "Invalid date-time \"{}\" in <{}>",
            text, element_name
        )))
    }

    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    pub fn value(&self) -> DateTimeValue {
        self.value
    }

    pub fn lexical(&self) -> String {
        match self.value {
            DateTimeValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            DateTimeValue::Local(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            DateTimeValue::Zoned(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }

    pub fn to_seda_xml<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        writer.write_element_value(&self.element_name, &self.lexical())
    }

    pub fn from_seda_xml<R: BufRead>(reader: &mut SedaXmlEventReader<R>, element_name: &str) -> Result<Self> {
        match reader.next_value_if_named(element_name)? {
            Some(text) => Self::parse(element_name, &text),
            None => Err(Error::MalformedMetadata(format!("Expected <{}>", element_name))),
        }
    }
}
