//! XML edition of package elements.
//!
//! An element is edited as indented XML fragments: [`fragment_for_edit`]
//! gives the text, [`apply_edit`] parses the edited text back. A parse
//! failure leaves the element unchanged. Metadata helpers offer samples,
//! canonical ordering and removal of the sample default values.

use crate::common::{Error, Result};
use crate::core::SedaXmlFragments;
use crate::metadata::SedaMetadata;
use crate::xml::{STANDARD_INDENT, indent_xml};

/// Editable fragments of `item`, indented.
pub fn fragment_for_edit<T: SedaXmlFragments + ?Sized>(item: &T) -> Result<String> {
    indent(&item.to_seda_xml_fragments()?)
}

/// Replace the editable content of `item` by the edited `fragments`.
pub fn apply_edit<T: SedaXmlFragments + ?Sized>(item: &mut T, fragments: &str) -> Result<()> {
    item.from_seda_xml_fragments(fragments)?;
    tracing::debug!("Edited fragments applied");
    Ok(())
}

/// Indented form of edited XML.
pub fn indent(xml: &str) -> Result<String> {
    indent_xml(xml, STANDARD_INDENT)
}

/// Sample of `element_name` with default values, as XML.
pub fn sample(element_name: &str, minimal: bool) -> Result<String> {
    SedaMetadata::sample(element_name, minimal)?.to_xml_fragment()
}

/// `fragment` with its composites in schema order.
pub fn canonize(element_name: &str, fragment: &str) -> Result<String> {
    let mut metadata = SedaMetadata::from_xml_fragment(element_name, fragment)?;
    if let SedaMetadata::Complex(complex) = &mut metadata {
        complex.canonize();
    }
    metadata.to_xml_fragment()
}

/// `fragment` without the sample default values, empty when nothing is left.
pub fn clean_fragment(element_name: &str, fragment: &str) -> Result<String> {
    match SedaMetadata::from_xml_fragment(element_name, fragment)?.clean_default_values() {
        Some(cleaned) => cleaned.to_xml_fragment(),
        None => Ok(String::new()),
    }
}

/// Add the metadata `fragment` to the `Content` of `unit`.
///
/// The fragment root names the element; it must be a known `Content` child.
pub fn add_content_metadata(unit: &mut crate::core::ArchiveUnit, fragment: &str) -> Result<()> {
    let name = root_name(fragment)?;
    let metadata = SedaMetadata::from_xml_fragment(&name, fragment)?;
    unit.content.add_metadata(metadata)?;
    unit.content.canonize();
    Ok(())
}

fn root_name(fragment: &str) -> Result<String> {
    let mut reader = crate::xml::SedaXmlEventReader::from_str(fragment);
    reader
        .peek_name()?
        .ok_or_else(|| Error::MalformedMetadata("Empty metadata fragment".to_string()))
}
