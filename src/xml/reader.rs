//! Pull reader over SEDA XML with one-event lookahead.
//!
//! [`SedaXmlEventReader`] turns the quick-xml event stream into owned
//! [`XmlEvent`]s with local element names, merged text runs and no
//! whitespace-only text between elements. Callers drive a recursive descent
//! by peeking the next element name and dispatching on it.

use crate::common::xml::{resolve_entity, unescape_xml};
use crate::common::{Error, Result};
use crate::xml::writer::SedaXmlStreamWriter;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::VecDeque;
use std::io::BufRead;

/// Owned XML event as seen by SEDA parsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Opening tag, local name and attributes in document order
    StartElement {
        name: String,
        attributes: Vec<(String, String)>,
    },
    /// Closing tag, local name
    EndElement { name: String },
    /// Text content, unescaped
    Characters(String),
    /// End of input
    EndDocument,
}

impl XmlEvent {
    /// Local name of a start element.
    pub fn start_name(&self) -> Option<&str> {
        match self {
            XmlEvent::StartElement { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Attribute value of a start element, matched on the local part of the key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        match self {
            XmlEvent::StartElement { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == key || local_part(k) == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// Local part of a possibly prefixed name.
pub(crate) fn local_part(name: &str) -> &str {
    match name.rfind(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Streaming SEDA XML reader.
pub struct SedaXmlEventReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    pending: VecDeque<XmlEvent>,
    finished: bool,
}

impl<'a> SedaXmlEventReader<&'a [u8]> {
    /// Create a reader over an in-memory XML string.
    pub fn from_str(xml: &'a str) -> Self {
        Self::from_reader(xml.as_bytes())
    }
}

impl<R: BufRead> SedaXmlEventReader<R> {
    /// Create a reader over any buffered source.
    pub fn from_reader(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().expand_empty_elements = true;
        Self {
            reader,
            buf: Vec::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Byte offset of the underlying parser, for diagnostics.
    pub fn position(&self) -> u64 {
        self.reader.buffer_position()
    }

    fn malformed(&self, msg: impl AsRef<str>) -> Error {
        Error::MalformedDocument(format!("{} (position {})", msg.as_ref(), self.position()))
    }

    /// Pull quick-xml events until one useful event is available.
    fn fill(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            return Ok(());
        }
        if self.finished {
            self.pending.push_back(XmlEvent::EndDocument);
            return Ok(());
        }

        let mut text = String::new();
        let mut has_text = false;
        loop {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|e| Error::XmlError(format!("{} (position {})", e, self.reader.buffer_position())))?;
            match event {
                Event::Text(ref t) => {
                    let raw = std::str::from_utf8(t)?;
                    text.push_str(&unescape_xml(raw));
                    has_text = true;
                },
                Event::CData(ref c) => {
                    text.push_str(std::str::from_utf8(c)?);
                    has_text = true;
                },
                Event::GeneralRef(ref r) => {
                    let name = std::str::from_utf8(r)?;
                    text.push_str(&resolve_reference(name));
                    has_text = true;
                },
                Event::Start(ref e) => {
                    let start = start_event(e)?;
                    push_text(&mut self.pending, &mut text, has_text);
                    self.pending.push_back(start);
                    return Ok(());
                },
                Event::End(ref e) => {
                    let name = std::str::from_utf8(e.local_name().as_ref())?.to_string();
                    push_text(&mut self.pending, &mut text, has_text);
                    self.pending.push_back(XmlEvent::EndElement { name });
                    return Ok(());
                },
                Event::Eof => {
                    self.finished = true;
                    push_text(&mut self.pending, &mut text, has_text);
                    self.pending.push_back(XmlEvent::EndDocument);
                    return Ok(());
                },
                // Declarations, comments, processing instructions, doctype
                _ => {},
            }
        }
    }

    /// Look at the next useful event without consuming it.
    pub fn peek_event(&mut self) -> Result<&XmlEvent> {
        self.fill()?;
        self.pending
            .front()
            .ok_or_else(|| Error::XmlError("Empty event queue".to_string()))
    }

    /// Consume the next useful event.
    pub fn next_event(&mut self) -> Result<XmlEvent> {
        self.fill()?;
        self.pending
            .pop_front()
            .ok_or_else(|| Error::XmlError("Empty event queue".to_string()))
    }

    /// Local name of the next element if the next event opens one.
    pub fn peek_name(&mut self) -> Result<Option<String>> {
        Ok(self.peek_event()?.start_name().map(str::to_string))
    }

    /// Whether the next event opens an element named `name`.
    pub fn peek_block_if_named(&mut self, name: &str) -> Result<bool> {
        Ok(self.peek_event()?.start_name() == Some(name))
    }

    /// Value of attribute `attribute` when the next event opens `name`.
    ///
    /// Returns `None` without consuming anything when the next element has
    /// another name or lacks the attribute.
    pub fn peek_attribute_block_if_named(&mut self, name: &str, attribute: &str) -> Result<Option<String>> {
        let event = self.peek_event()?;
        if event.start_name() != Some(name) {
            return Ok(None);
        }
        Ok(event.attribute(attribute).map(str::to_string))
    }

    /// Consume the opening tag of `name` if it is next.
    pub fn next_block_if_named(&mut self, name: &str) -> Result<bool> {
        if self.peek_block_if_named(name)? {
            self.next_event()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consume the opening tag of `name`, failing if something else is next.
    pub fn start_block_named(&mut self, name: &str) -> Result<XmlEvent> {
        let event = self.next_event()?;
        if event.start_name() == Some(name) {
            Ok(event)
        } else {
            Err(self.malformed(format!("Expected <{}>, found {}", name, describe(&event))))
        }
    }

    /// Consume the closing tag of `name`, failing if something else is next.
    pub fn end_block_named(&mut self, name: &str) -> Result<()> {
        match self.next_event()? {
            XmlEvent::EndElement { name: ref found } if found == name => Ok(()),
            other => Err(self.malformed(format!("Expected </{}>, found {}", name, describe(&other)))),
        }
    }

    /// Consume any text content then the closing tag of `name`.
    fn text_until_end(&mut self, name: &str) -> Result<String> {
        let mut value = String::new();
        loop {
            match self.next_event()? {
                XmlEvent::Characters(text) => value.push_str(&text),
                XmlEvent::EndElement { name: ref found } if found == name => return Ok(value),
                other => {
                    return Err(self.malformed(format!(
                        "Element <{}> must only contain text, found {}",
                        name,
                        describe(&other)
                    )));
                },
            }
        }
    }

    /// Read `<name>value</name>` if it is next.
    pub fn next_value_if_named(&mut self, name: &str) -> Result<Option<String>> {
        if !self.next_block_if_named(name)? {
            return Ok(None);
        }
        self.text_until_end(name).map(Some)
    }

    /// Read `<name attr="..">value</name>` if it is next, with its attributes.
    pub fn next_value_with_attributes_if_named(
        &mut self,
        name: &str,
    ) -> Result<Option<(Vec<(String, String)>, String)>> {
        if !self.peek_block_if_named(name)? {
            return Ok(None);
        }
        let attributes = match self.next_event()? {
            XmlEvent::StartElement { attributes, .. } => attributes,
            _ => Vec::new(),
        };
        let value = self.text_until_end(name)?;
        Ok(Some((attributes, value)))
    }

    /// Read `<name>value</name>`, failing if absent.
    pub fn next_mandatory_value(&mut self, name: &str) -> Result<String> {
        match self.next_value_if_named(name)? {
            Some(value) => Ok(value),
            None => Err(self.malformed(format!("Missing mandatory element <{}>", name))),
        }
    }

    /// Read the whole `name` block as a compact XML string if it is next.
    pub fn next_block_as_string_if_named(&mut self, name: &str) -> Result<Option<String>> {
        if !self.peek_block_if_named(name)? {
            return Ok(None);
        }
        self.next_block_as_string().map(Some)
    }

    /// Read the next element, whatever its name, as a compact XML string.
    pub fn next_block_as_string(&mut self) -> Result<String> {
        let mut writer = SedaXmlStreamWriter::compact(Vec::new());
        self.copy_block(&mut writer)?;
        let bytes = writer.into_inner()?;
        String::from_utf8(bytes).map_err(|e| Error::XmlError(e.to_string()))
    }

    /// Replay the next element and its subtree into `writer`.
    pub fn copy_block<W: std::io::Write>(&mut self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        let first = self.next_event()?;
        let XmlEvent::StartElement { name, attributes } = first else {
            return Err(self.malformed(format!("Expected an element, found {}", describe(&first))));
        };
        writer.write_start_element(&name)?;
        for (key, value) in &attributes {
            writer.write_attribute(key, value)?;
        }
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_event()? {
                XmlEvent::StartElement { name, attributes } => {
                    writer.write_start_element(&name)?;
                    for (key, value) in &attributes {
                        writer.write_attribute(key, value)?;
                    }
                    depth += 1;
                },
                XmlEvent::EndElement { .. } => {
                    writer.write_end_element()?;
                    depth -= 1;
                },
                XmlEvent::Characters(text) => writer.write_characters(&text)?,
                XmlEvent::EndDocument => {
                    return Err(self.malformed(format!("Unterminated element <{}>", name)));
                },
            }
        }
        Ok(())
    }

    /// Skip the next element and its subtree.
    pub fn skip_block(&mut self) -> Result<()> {
        let first = self.next_event()?;
        if first.start_name().is_none() {
            return Err(self.malformed(format!("Expected an element, found {}", describe(&first))));
        }
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_event()? {
                XmlEvent::StartElement { .. } => depth += 1,
                XmlEvent::EndElement { .. } => depth -= 1,
                XmlEvent::Characters(_) => {},
                XmlEvent::EndDocument => return Err(self.malformed("Unterminated element")),
            }
        }
        Ok(())
    }

    /// Whether the input is exhausted.
    pub fn at_end(&mut self) -> Result<bool> {
        Ok(matches!(self.peek_event()?, XmlEvent::EndDocument))
    }
}

fn push_text(pending: &mut VecDeque<XmlEvent>, text: &mut String, has_text: bool) {
    if has_text && !text.trim().is_empty() {
        pending.push_back(XmlEvent::Characters(std::mem::take(text)));
    }
}

fn start_event(e: &BytesStart<'_>) -> Result<XmlEvent> {
    let name = std::str::from_utf8(e.local_name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = unescape_xml(std::str::from_utf8(&attr.value)?);
        attributes.push((key, value));
    }
    Ok(XmlEvent::StartElement { name, attributes })
}

/// Resolve a general or character reference name (without `&` and `;`).
fn resolve_reference(name: &str) -> String {
    match resolve_entity(name) {
        Some(ch) => ch.to_string(),
        None => format!("&{};", name),
    }
}

fn describe(event: &XmlEvent) -> String {
    match event {
        XmlEvent::StartElement { name, .. } => format!("<{}>", name),
        XmlEvent::EndElement { name } => format!("</{}>", name),
        XmlEvent::Characters(text) => format!("text \"{}\"", text.trim()),
        XmlEvent::EndDocument => "end of document".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_does_not_consume() {
        let mut reader = SedaXmlEventReader::from_str("<BinaryDataObject id=\"x\"><Uri>a</Uri></BinaryDataObject>");
        assert_eq!(reader.peek_name().unwrap().as_deref(), Some("BinaryDataObject"));
        assert_eq!(
            reader
                .peek_attribute_block_if_named("DataObjectGroup", "id")
                .unwrap(),
            None
        );
        assert_eq!(
            reader
                .peek_attribute_block_if_named("BinaryDataObject", "id")
                .unwrap()
                .as_deref(),
            Some("x")
        );
        assert!(reader.next_block_if_named("BinaryDataObject").unwrap());
        assert_eq!(reader.next_value_if_named("Uri").unwrap().as_deref(), Some("a"));
        reader.end_block_named("BinaryDataObject").unwrap();
        assert!(reader.at_end().unwrap());
    }

    #[test]
    fn test_entities_and_whitespace() {
        let xml = "<Root>\n  <Title>Dupont &amp; fils &#233;t&#xE9;</Title>\n  <Empty/>\n</Root>";
        let mut reader = SedaXmlEventReader::from_str(xml);
        reader.start_block_named("Root").unwrap();
        assert_eq!(reader.next_mandatory_value("Title").unwrap(), "Dupont & fils été");
        assert_eq!(reader.next_value_if_named("Empty").unwrap().as_deref(), Some(""));
        reader.end_block_named("Root").unwrap();
    }

    #[test]
    fn test_block_as_string() {
        let xml = "<LogBook>\n <Event><EventType>Check &lt;1&gt;</EventType></Event>\n</LogBook><Next/>";
        let mut reader = SedaXmlEventReader::from_str(xml);
        let block = reader.next_block_as_string_if_named("LogBook").unwrap().unwrap();
        assert_eq!(block, "<LogBook><Event><EventType>Check &lt;1&gt;</EventType></Event></LogBook>");
        assert_eq!(reader.peek_name().unwrap().as_deref(), Some("Next"));
        assert_eq!(reader.next_block_as_string_if_named("LogBook").unwrap(), None);
    }

    #[test]
    fn test_namespace_prefix_is_stripped() {
        let xml = "<seda:Title xml:lang=\"fr\">Titre</seda:Title>";
        let mut reader = SedaXmlEventReader::from_str(xml);
        let event = reader.peek_event().unwrap().clone();
        assert_eq!(event.start_name(), Some("Title"));
        assert_eq!(event.attribute("lang"), Some("fr"));
        assert_eq!(event.attribute("xml:lang"), Some("fr"));
    }

    #[test]
    fn test_mismatch_is_malformed() {
        let mut reader = SedaXmlEventReader::from_str("<A><B>x</B></A>");
        reader.start_block_named("A").unwrap();
        let err = reader.end_block_named("A").unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
        let err = reader.next_mandatory_value("C").unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[test]
    fn test_skip_block() {
        let mut reader = SedaXmlEventReader::from_str("<A><B><C>x</C></B><D>y</D></A>");
        reader.start_block_named("A").unwrap();
        reader.skip_block().unwrap();
        assert_eq!(reader.next_value_if_named("D").unwrap().as_deref(), Some("y"));
    }
}
