//! SEDA XML stream writer.
//!
//! The writer produces either compact XML or XML indented with a fixed
//! number of spaces per level. Elements that contain text are written on a
//! single line, elements that only contain elements get one child per line.

use crate::common::xml::{escape_attribute, escape_text};
use crate::common::{Error, Result};
use crate::xml::reader::{SedaXmlEventReader, XmlEvent};
use std::io::Write;

/// Default indentation used for manifests and edited fragments.
pub const STANDARD_INDENT: usize = 2;

#[derive(Debug)]
struct OpenElement {
    name: String,
    has_children: bool,
    has_text: bool,
}

/// Streaming XML writer with optional indentation.
pub struct SedaXmlStreamWriter<W: Write> {
    out: W,
    indent: Option<usize>,
    stack: Vec<OpenElement>,
    start_tag_open: bool,
    wrote_anything: bool,
}

impl<W: Write> SedaXmlStreamWriter<W> {
    /// Writer without any formatting whitespace.
    pub fn compact(out: W) -> Self {
        Self::new(out, None)
    }

    /// Writer indenting each level by `indent` spaces.
    pub fn indented(out: W, indent: usize) -> Self {
        Self::new(out, Some(indent))
    }

    fn new(out: W, indent: Option<usize>) -> Self {
        Self {
            out,
            indent,
            stack: Vec::new(),
            start_tag_open: false,
            wrote_anything: false,
        }
    }

    /// Current element nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn close_start_tag(&mut self) -> Result<()> {
        if self.start_tag_open {
            self.out.write_all(b">")?;
            self.start_tag_open = false;
        }
        Ok(())
    }

    fn newline_and_indent(&mut self, depth: usize) -> Result<()> {
        if let Some(indent) = self.indent {
            if self.wrote_anything {
                self.out.write_all(b"\n")?;
            }
            for _ in 0..depth * indent {
                self.out.write_all(b" ")?;
            }
        }
        Ok(())
    }

    /// Write the XML declaration.
    pub fn write_start_document(&mut self) -> Result<()> {
        if self.wrote_anything {
            return Err(Error::Other("XML declaration must come first".to_string()));
        }
        self.out.write_all(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        self.wrote_anything = true;
        Ok(())
    }

    /// Open an element.
    pub fn write_start_element(&mut self, name: &str) -> Result<()> {
        self.close_start_tag()?;
        let inline = match self.stack.last_mut() {
            Some(parent) => {
                parent.has_children = true;
                parent.has_text
            },
            None => false,
        };
        if !inline {
            self.newline_and_indent(self.stack.len())?;
        }
        self.out.write_all(b"<")?;
        self.out.write_all(name.as_bytes())?;
        self.stack.push(OpenElement {
            name: name.to_string(),
            has_children: false,
            has_text: inline,
        });
        self.start_tag_open = true;
        self.wrote_anything = true;
        Ok(())
    }

    /// Add an attribute to the element just opened.
    pub fn write_attribute(&mut self, key: &str, value: &str) -> Result<()> {
        if !self.start_tag_open {
            return Err(Error::Other(format!("Attribute {} written outside of a start tag", key)));
        }
        write!(self.out, " {}=\"{}\"", key, escape_attribute(value))?;
        Ok(())
    }

    /// Write escaped text in the current element.
    pub fn write_characters(&mut self, text: &str) -> Result<()> {
        self.close_start_tag()?;
        if let Some(current) = self.stack.last_mut() {
            current.has_text = true;
        }
        self.out.write_all(escape_text(text).as_bytes())?;
        self.wrote_anything = true;
        Ok(())
    }

    /// Close the innermost open element.
    pub fn write_end_element(&mut self) -> Result<()> {
        let element = self
            .stack
            .pop()
            .ok_or_else(|| Error::Other("No element to close".to_string()))?;
        if self.start_tag_open {
            self.out.write_all(b"/>")?;
            self.start_tag_open = false;
            return Ok(());
        }
        if element.has_children && !element.has_text {
            self.newline_and_indent(self.stack.len())?;
        }
        self.out.write_all(b"</")?;
        self.out.write_all(element.name.as_bytes())?;
        self.out.write_all(b">")?;
        Ok(())
    }

    /// Write `<name>value</name>`.
    pub fn write_element_value(&mut self, name: &str, value: &str) -> Result<()> {
        self.write_start_element(name)?;
        if !value.is_empty() {
            self.write_characters(value)?;
        }
        self.write_end_element()
    }

    /// Write `<name>value</name>` when a value is present.
    pub fn write_element_value_if_not_empty(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(v) if !v.is_empty() => self.write_element_value(name, v),
            _ => Ok(()),
        }
    }

    /// Write a pre-serialized XML block.
    ///
    /// The block is parsed and replayed so that it is checked for
    /// well-formedness and indented like the rest of the output. Nothing is
    /// written for `None` or blank input.
    pub fn write_raw_xml_block_if_not_empty(&mut self, raw: Option<&str>) -> Result<()> {
        let Some(raw) = raw else {
            return Ok(());
        };
        if raw.trim().is_empty() {
            return Ok(());
        }
        let mut reader = SedaXmlEventReader::from_str(raw);
        loop {
            match reader.peek_event()? {
                XmlEvent::EndDocument => break,
                XmlEvent::StartElement { .. } => reader.copy_block(self)?,
                other => {
                    return Err(Error::MalformedDocument(format!(
                        "Raw XML block must only contain elements, found {:?}",
                        other
                    )));
                },
            }
        }
        Ok(())
    }

    /// Check that every element is closed and flush.
    pub fn write_end_document(&mut self) -> Result<()> {
        if let Some(open) = self.stack.last() {
            return Err(Error::Other(format!("Element <{}> left open", open.name)));
        }
        self.out.flush()?;
        Ok(())
    }

    /// Finish writing and return the underlying sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.write_end_document()?;
        Ok(self.out)
    }
}

/// Serialize with a closure into a `String`.
pub fn write_to_string<F>(indent: Option<usize>, f: F) -> Result<String>
where
    F: FnOnce(&mut SedaXmlStreamWriter<Vec<u8>>) -> Result<()>,
{
    let mut writer = SedaXmlStreamWriter::new(Vec::new(), indent);
    f(&mut writer)?;
    let bytes = writer.into_inner()?;
    String::from_utf8(bytes).map_err(|e| Error::XmlError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_output() {
        let xml = write_to_string(None, |w| {
            w.write_start_element("DataObjectGroup")?;
            w.write_attribute("id", "ID1")?;
            w.write_element_value("Uri", "a&b.txt")?;
            w.write_start_element("Empty")?;
            w.write_end_element()?;
            w.write_end_element()
        })
        .unwrap();
        assert_eq!(xml, "<DataObjectGroup id=\"ID1\"><Uri>a&amp;b.txt</Uri><Empty/></DataObjectGroup>");
    }

    #[test]
    fn test_indented_output() {
        let xml = write_to_string(Some(2), |w| {
            w.write_start_element("A")?;
            w.write_start_element("B")?;
            w.write_element_value("C", "x")?;
            w.write_end_element()?;
            w.write_element_value("D", "y")?;
            w.write_end_element()
        })
        .unwrap();
        assert_eq!(xml, "<A>\n  <B>\n    <C>x</C>\n  </B>\n  <D>y</D>\n</A>");
    }

    #[test]
    fn test_raw_block_is_replayed() {
        let xml = write_to_string(Some(2), |w| {
            w.write_start_element("DataObjectGroup")?;
            w.write_raw_xml_block_if_not_empty(Some("<LogBook><Event><EventType>x</EventType></Event></LogBook>"))?;
            w.write_raw_xml_block_if_not_empty(None)?;
            w.write_end_element()
        })
        .unwrap();
        assert_eq!(
            xml,
            "<DataObjectGroup>\n  <LogBook>\n    <Event>\n      <EventType>x</EventType>\n    </Event>\n  </LogBook>\n</DataObjectGroup>"
        );
    }

    #[test]
    fn test_raw_block_rejects_malformed() {
        let result = write_to_string(None, |w| {
            w.write_start_element("A")?;
            w.write_raw_xml_block_if_not_empty(Some("<LogBook><Event></LogBook>"))?;
            w.write_end_element()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_unclosed_element_is_an_error() {
        let result = write_to_string(None, |w| w.write_start_element("A"));
        assert!(result.is_err());
    }
}
