//! XML stream primitives.
//!
//! - [`SedaXmlEventReader`]: pull reader with lookahead, named block helpers
//!   and verbatim block capture
//! - [`SedaXmlStreamWriter`]: compact or indented writer with raw block
//!   passthrough
//! - [`indent_xml`]: canonical indentation of fragments

pub mod indent;
pub mod reader;
pub mod writer;

pub use indent::indent_xml;
pub use reader::{SedaXmlEventReader, XmlEvent};
pub use writer::{STANDARD_INDENT, SedaXmlStreamWriter, write_to_string};
