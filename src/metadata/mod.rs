//! SEDA metadata type hierarchy.
//!
//! Descriptive and management metadata are trees of [`SedaMetadata`] nodes.
//! Each node is one XML element: a scalar (string, text, date, date-time,
//! integer, enumerated value), a composite [`ComplexListType`] holding an
//! ordered list of children, or an opaque [`AnyXmlType`] block.
//!
//! The element name decides the node kind through a static registry, see
//! [`registry::kind_of`].
//!
//! # Example
//!
//! ```
//! use resip::metadata::SedaMetadata;
//!
//! let fragment = "<Writer>\n  <FullName>Jean Dupont</FullName>\n</Writer>";
//! let writer = SedaMetadata::from_xml_fragment("Writer", fragment)?;
//! assert_eq!(writer.to_xml_fragment()?, fragment);
//! # Ok::<(), resip::common::Error>(())
//! ```

pub mod archive_unit_profile;
pub mod namedtype;
pub mod registry;

pub use archive_unit_profile::ArchiveUnitProfile;
pub use namedtype::{
    AnyXmlType, ComplexListType, DateTimeType, DateTimeValue, DateType, EnumType, IntegerType, StringType, TextType,
};
pub use registry::{DEFAULT_SAMPLE_VALUES, MetadataKind};

use crate::common::{Error, Result};
use crate::xml::{STANDARD_INDENT, SedaXmlEventReader, SedaXmlStreamWriter, write_to_string};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::io::{BufRead, Write};

/// One SEDA metadata element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SedaMetadata {
    String(StringType),
    Text(TextType),
    Date(DateType),
    DateTime(DateTimeType),
    Integer(IntegerType),
    Enum(EnumType),
    Complex(ComplexListType),
    AnyXml(AnyXmlType),
}

impl SedaMetadata {
    /// Element name of the node.
    pub fn xml_element_name(&self) -> &str {
        match self {
            SedaMetadata::String(m) => m.element_name(),
            SedaMetadata::Text(m) => m.element_name(),
            SedaMetadata::Date(m) => m.element_name(),
            SedaMetadata::DateTime(m) => m.element_name(),
            SedaMetadata::Integer(m) => m.element_name(),
            SedaMetadata::Enum(m) => m.element_name(),
            SedaMetadata::Complex(m) => m.element_name(),
            SedaMetadata::AnyXml(m) => m.element_name(),
        }
    }

    /// Lexical value of a scalar node, `None` for composites and opaque blocks.
    pub fn value_string(&self) -> Option<String> {
        match self {
            SedaMetadata::String(m) => Some(m.value().to_string()),
            SedaMetadata::Text(m) => Some(m.value().to_string()),
            SedaMetadata::Date(m) => Some(m.lexical()),
            SedaMetadata::DateTime(m) => Some(m.lexical()),
            SedaMetadata::Integer(m) => Some(m.value().to_string()),
            SedaMetadata::Enum(m) => Some(m.value().to_string()),
            SedaMetadata::Complex(_) | SedaMetadata::AnyXml(_) => None,
        }
    }

    pub fn as_complex(&self) -> Option<&ComplexListType> {
        match self {
            SedaMetadata::Complex(complex) => Some(complex),
            _ => None,
        }
    }

    pub fn to_seda_xml<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        match self {
            SedaMetadata::String(m) => m.to_seda_xml(writer),
            SedaMetadata::Text(m) => m.to_seda_xml(writer),
            SedaMetadata::Date(m) => m.to_seda_xml(writer),
            SedaMetadata::DateTime(m) => m.to_seda_xml(writer),
            SedaMetadata::Integer(m) => m.to_seda_xml(writer),
            SedaMetadata::Enum(m) => m.to_seda_xml(writer),
            SedaMetadata::Complex(m) => m.to_seda_xml(writer),
            SedaMetadata::AnyXml(m) => m.to_seda_xml(writer),
        }
    }

    /// Indented XML fragment of this node.
    pub fn to_xml_fragment(&self) -> Result<String> {
        write_to_string(Some(STANDARD_INDENT), |w| self.to_seda_xml(w))
    }

    /// Read the element `element_name` at the reader position.
    pub fn from_seda_xml<R: BufRead>(reader: &mut SedaXmlEventReader<R>, element_name: &str) -> Result<Self> {
        Ok(match registry::kind_of(element_name) {
            Some(MetadataKind::String) => SedaMetadata::String(StringType::from_seda_xml(reader, element_name)?),
            Some(MetadataKind::Text) => SedaMetadata::Text(TextType::from_seda_xml(reader, element_name)?),
            Some(MetadataKind::Date) => SedaMetadata::Date(DateType::from_seda_xml(reader, element_name)?),
            Some(MetadataKind::DateTime) => {
                SedaMetadata::DateTime(DateTimeType::from_seda_xml(reader, element_name)?)
            },
            Some(MetadataKind::Integer) => SedaMetadata::Integer(IntegerType::from_seda_xml(reader, element_name)?),
            Some(MetadataKind::Enum(allowed)) => {
                SedaMetadata::Enum(EnumType::from_seda_xml(reader, element_name, allowed)?)
            },
            Some(MetadataKind::Complex(schema)) => {
                SedaMetadata::Complex(ComplexListType::from_seda_xml(reader, element_name, schema)?)
            },
            Some(MetadataKind::AnyXml) | None => SedaMetadata::AnyXml(AnyXmlType::from_seda_xml(reader, element_name)?),
        })
    }

    /// Parse a standalone fragment whose root must be `expected_name`.
    ///
    /// Anything else than a single well-formed `expected_name` element is
    /// reported as [`Error::MalformedMetadata`].
    pub fn from_xml_fragment(expected_name: &str, fragment: &str) -> Result<Self> {
        let mut reader = SedaXmlEventReader::from_str(fragment);
        parse_single_root(&mut reader, expected_name).map_err(|e| match e {
            Error::MalformedMetadata(_) => e,
            other => Error::MalformedMetadata(other.to_string()),
        })
    }

    /// Scalar node built from its lexical value.
    pub fn from_value(element_name: &str, value: &str) -> Result<Self> {
        Ok(match registry::kind_of(element_name) {
            Some(MetadataKind::String) => SedaMetadata::String(StringType::new(element_name, value)),
            Some(MetadataKind::Text) => SedaMetadata::Text(TextType::new(element_name, value, None)),
            Some(MetadataKind::Date) => SedaMetadata::Date(DateType::parse(element_name, value)?),
            Some(MetadataKind::DateTime) => SedaMetadata::DateTime(DateTimeType::parse(element_name, value)?),
            Some(MetadataKind::Integer) => SedaMetadata::Integer(IntegerType::parse(element_name, value)?),
            Some(MetadataKind::Enum(allowed)) => SedaMetadata::Enum(EnumType::new(element_name, value, allowed)?),
            Some(MetadataKind::Complex(_)) => {
                return Err(Error::MalformedMetadata(format!(
                    "<{}> is a composite and can't be built from a value",
                    element_name
                )));
            },
            Some(MetadataKind::AnyXml) | None => {
                return Err(Error::MalformedMetadata(format!(
                    "<{}> is not a known metadata element",
                    element_name
                )));
            },
        })
    }

    /// Sample node filled with default values, as offered in edition.
    ///
    /// A minimal sample of a composite only holds its first child, a full one
    /// holds every registered child once.
    pub fn sample(element_name: &str, minimal: bool) -> Result<Self> {
        Ok(match registry::kind_of(element_name) {
            Some(MetadataKind::String) => SedaMetadata::String(StringType::new(element_name, "Text")),
            Some(MetadataKind::Text) => SedaMetadata::Text(TextType::new(element_name, "Text", None)),
            Some(MetadataKind::Date) => SedaMetadata::Date(DateType::new(element_name, sample_date())),
            Some(MetadataKind::DateTime) => SedaMetadata::DateTime(DateTimeType::new(
                element_name,
                DateTimeValue::Local(sample_date_time()),
            )),
            Some(MetadataKind::Integer) => SedaMetadata::Integer(IntegerType::new(element_name, 0)),
            Some(MetadataKind::Enum(allowed)) => {
                let first = allowed.first().copied().unwrap_or_default();
                SedaMetadata::Enum(EnumType::new(element_name, first, allowed)?)
            },
            Some(MetadataKind::Complex(schema)) => {
                let mut complex = ComplexListType::with_schema(element_name, schema);
                for def in schema.children {
                    if registry::kind_of(def.name).is_none() {
                        continue;
                    }
                    complex.add_metadata(Self::sample(def.name, minimal)?)?;
                    if minimal {
                        break;
                    }
                }
                SedaMetadata::Complex(complex)
            },
            Some(MetadataKind::AnyXml) | None => {
                return Err(Error::MalformedMetadata(format!(
                    "No sample available for <{}>",
                    element_name
                )));
            },
        })
    }

    /// Copy without the sample default values.
    ///
    /// Scalars whose lexical value is one of [`DEFAULT_SAMPLE_VALUES`] are
    /// dropped, then composites left empty. Returns `None` when nothing
    /// remains.
    pub fn clean_default_values(&self) -> Option<SedaMetadata> {
        match self {
            SedaMetadata::Complex(complex) => {
                let mut cleaned = ComplexListType::with_schema(complex.element_name(), complex.schema());
                for child in complex.children() {
                    if let Some(child) = child.clean_default_values() {
                        // Children already passed the schema once
                        let _ = cleaned.add_metadata(child);
                    }
                }
                (!cleaned.is_empty()).then_some(SedaMetadata::Complex(cleaned))
            },
            SedaMetadata::AnyXml(_) => Some(self.clone()),
            scalar => match scalar.value_string() {
                Some(value) if DEFAULT_SAMPLE_VALUES.contains(&value.as_str()) => None,
                _ => Some(self.clone()),
            },
        }
    }
}

impl fmt::Display for SedaMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fragment = self.to_xml_fragment().map_err(|_| fmt::Error)?;
        f.write_str(&fragment)
    }
}

fn parse_single_root<R: BufRead>(reader: &mut SedaXmlEventReader<R>, expected_name: &str) -> Result<SedaMetadata> {
    match reader.peek_name()? {
        Some(ref name) if name == expected_name => {},
        Some(name) => {
            return Err(Error::MalformedMetadata(format!(
                "Expected <{}> fragment, found <{}>",
                expected_name, name
            )));
        },
        None => return Err(Error::MalformedMetadata(format!("Expected <{}> fragment", expected_name))),
    }
    let metadata = SedaMetadata::from_seda_xml(reader, expected_name)?;
    if !reader.at_end()? {
        return Err(Error::MalformedMetadata(format!(
            "Unexpected content after <{}> fragment",
            expected_name
        )));
    }
    Ok(metadata)
}

fn sample_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn sample_date_time() -> NaiveDateTime {
    sample_date().and_hms_opt(1, 0, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_round_trip() {
        let fragment = "<Content>\n  <DescriptionLevel>Item</DescriptionLevel>\n  <Title xml:lang=\"fr\">Lettre</Title>\n  <Writer>\n    <FullName>Jean Dupont</FullName>\n  </Writer>\n  <CreatedDate>2019-03-12T10:15:30</CreatedDate>\n</Content>";
        let content = SedaMetadata::from_xml_fragment("Content", fragment).unwrap();
        assert_eq!(content.to_xml_fragment().unwrap(), fragment);
        assert_eq!(content.to_string(), fragment);
    }

    #[test]
    fn test_fragment_root_mismatch() {
        let err = SedaMetadata::from_xml_fragment("Content", "<Writer><FullName>x</FullName></Writer>").unwrap_err();
        assert!(matches!(err, Error::MalformedMetadata(_)));
        let err = SedaMetadata::from_xml_fragment("Content", "<Content></Content><Content/>").unwrap_err();
        assert!(matches!(err, Error::MalformedMetadata(_)));
        let err = SedaMetadata::from_xml_fragment("Content", "<Content><Title>x</Content>").unwrap_err();
        assert!(matches!(err, Error::MalformedMetadata(_)));
    }

    #[test]
    fn test_child_error_carries_context() {
        let err = SedaMetadata::from_xml_fragment("Content", "<Content><CreatedDate>never</CreatedDate></Content>")
            .unwrap_err();
        match err {
            Error::MalformedMetadata(msg) => {
                assert!(msg.starts_with("<Content>"), "{}", msg);
                assert!(msg.contains("never"));
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_root_is_opaque() {
        let any = SedaMetadata::from_xml_fragment("Custom", "<Custom a=\"1\"><X>y</X></Custom>").unwrap();
        assert!(matches!(any, SedaMetadata::AnyXml(_)));
    }

    #[test]
    fn test_sample_then_clean_is_empty() {
        for name in ["AgentType", "AccessRule", "FileInfo"] {
            let sample = SedaMetadata::sample(name, false).unwrap();
            assert!(sample.as_complex().is_some_and(|c| !c.is_empty()), "{}", name);
            assert_eq!(sample.clean_default_values(), None, "{}", name);
        }
    }

    #[test]
    fn test_clean_keeps_enumerated_values() {
        let sample = SedaMetadata::sample("Content", false).unwrap();
        let cleaned = sample.clean_default_values().unwrap();
        let content = cleaned.as_complex().unwrap();
        assert_eq!(content.first_value("DescriptionLevel").as_deref(), Some("Fonds"));
        assert!(content.get_first("Title").is_none());
        assert!(content.get_first("Writer").is_none());
    }

    #[test]
    fn test_clean_keeps_real_values() {
        let writer = SedaMetadata::from_xml_fragment(
            "Writer",
            "<Writer><FirstName>Text</FirstName><FullName>Jean Dupont</FullName></Writer>",
        )
        .unwrap();
        let cleaned = writer.clean_default_values().unwrap();
        assert_eq!(
            cleaned.to_xml_fragment().unwrap(),
            "<Writer>\n  <FullName>Jean Dupont</FullName>\n</Writer>"
        );
    }

    #[test]
    fn test_minimal_sample() {
        let sample = SedaMetadata::sample("Content", true).unwrap();
        assert_eq!(
            sample.to_xml_fragment().unwrap(),
            "<Content>\n  <DescriptionLevel>Fonds</DescriptionLevel>\n</Content>"
        );
    }

    #[test]
    fn test_from_value() {
        assert!(matches!(
            SedaMetadata::from_value("GpsAltitude", "12"),
            Ok(SedaMetadata::Integer(_))
        ));
        assert!(SedaMetadata::from_value("Writer", "x").is_err());
        assert!(SedaMetadata::from_value("NotSeda", "x").is_err());
    }
}
