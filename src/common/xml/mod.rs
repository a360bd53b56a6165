//! XML text helpers shared by the reader and the writer.

mod escape;

pub use escape::{escape_attribute, escape_text, resolve_entity, unescape_xml};
