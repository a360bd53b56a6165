//! Re-indentation of XML fragments.
//!
//! Used to present fragments for edition in a canonical, indented form. The
//! input may hold several sibling elements, as the fragments of an
//! ArchiveUnit do.

use crate::common::{Error, Result};
use crate::xml::reader::{SedaXmlEventReader, XmlEvent};
use crate::xml::writer::write_to_string;

/// Indent an XML fragment with `indent` spaces per level.
///
/// Declarations and comments are dropped, whitespace between elements is
/// normalized.
pub fn indent_xml(xml: &str, indent: usize) -> Result<String> {
    let mut reader = SedaXmlEventReader::from_str(xml);
    write_to_string(Some(indent), |writer| {
        loop {
            match reader.peek_event()? {
                XmlEvent::EndDocument => return Ok(()),
                XmlEvent::StartElement { .. } => reader.copy_block(writer)?,
                XmlEvent::Characters(text) => {
                    return Err(Error::MalformedDocument(format!(
                        "Text outside of any element: \"{}\"",
                        text.trim()
                    )));
                },
                XmlEvent::EndElement { name } => {
                    return Err(Error::MalformedDocument(format!("Unexpected </{}>", name)));
                },
            }
        }
    })
}
