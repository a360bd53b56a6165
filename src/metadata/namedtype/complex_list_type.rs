//! Composite elements: an ordered list of typed children.

use crate::common::{Error, Result};
use crate::metadata::SedaMetadata;
use crate::metadata::namedtype::AnyXmlType;
use crate::metadata::registry::{self, ComplexSchema};
use crate::xml::{SedaXmlEventReader, SedaXmlStreamWriter, XmlEvent};
use std::io::{BufRead, Write};

/// Composite element such as `Content`, `Writer` or `AccessRule`.
///
/// Children keep their document order. Which children are allowed, and how
/// many times, comes from the element schema in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexListType {
    element_name: String,
    schema: &'static ComplexSchema,
    children: Vec<SedaMetadata>,
}

impl ComplexListType {
    /// Empty composite for a registered composite element name.
    pub fn new(element_name: &str) -> Result<Self> {
        let schema = registry::complex_schema(element_name).ok_or_else(|| {
            Error::MalformedMetadata(format!("<{}> is not a composite metadata element", element_name))
        })?;
        Ok(Self::with_schema(element_name, schema))
    }

    pub(crate) fn with_schema(element_name: &str, schema: &'static ComplexSchema) -> Self {
        Self {
            element_name: element_name.to_string(),
            schema,
            children: Vec::new(),
        }
    }

    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    pub fn schema(&self) -> &'static ComplexSchema {
        self.schema
    }

    pub fn children(&self) -> &[SedaMetadata] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Append a child, checking that the schema allows it.
    pub fn add_metadata(&mut self, child: SedaMetadata) -> Result<()> {
        let name = child.xml_element_name();
        match self.schema.child(name) {
            Some(def) if !def.many && self.get_first(name).is_some() => Err(Error::MalformedMetadata(format!(
                "<{}> can only contain one <{}>",
                self.element_name, name
            ))),
            Some(_) => {
                self.children.push(child);
                Ok(())
            },
            None if self.schema.expandable => {
                self.children.push(child);
                Ok(())
            },
            None => Err(Error::MalformedMetadata(format!(
                "<{}> is not allowed in <{}>",
                name, self.element_name
            ))),
        }
    }

    /// Append a scalar child built from its lexical value.
    pub fn add_new_metadata(&mut self, name: &str, value: &str) -> Result<()> {
        let child = SedaMetadata::from_value(name, value)?;
        self.add_metadata(child)
    }

    /// Append a scalar child addressed by a dotted path such as
    /// `Writer.FullName`.
    ///
    /// Intermediate composites are reused when the last child with that name
    /// does not hold the leaf yet, and created otherwise.
    pub fn add_metadata_by_path(&mut self, path: &str, value: &str) -> Result<()> {
        let Some((head, rest)) = path.split_once('.') else {
            return self.add_new_metadata(path, value);
        };
        let leaf = rest.rsplit('.').next().unwrap_or(rest);
        let reusable = self.children.iter().rposition(|c| match c {
            SedaMetadata::Complex(complex) if complex.element_name == head => {
                rest.contains('.') || complex.get_first(leaf).is_none()
            },
            _ => false,
        });
        match reusable {
            Some(index) => match &mut self.children[index] {
                SedaMetadata::Complex(complex) => complex.add_metadata_by_path(rest, value),
                _ => Err(Error::Other("Composite child changed kind".to_string())),
            },
            None => {
                let mut complex = ComplexListType::new(head)?;
                complex.add_metadata_by_path(rest, value)?;
                self.add_metadata(SedaMetadata::Complex(complex))
            },
        }
    }

    /// First child named `name`.
    pub fn get_first(&self, name: &str) -> Option<&SedaMetadata> {
        self.children.iter().find(|c| c.xml_element_name() == name)
    }

    /// All children named `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a SedaMetadata> + 'a {
        self.children.iter().filter(move |c| c.xml_element_name() == name)
    }

    /// Lexical value of the first scalar child named `name`.
    pub fn first_value(&self, name: &str) -> Option<String> {
        self.get_first(name).and_then(SedaMetadata::value_string)
    }

    /// Remove every child named `name`, returning how many were removed.
    pub fn remove_all(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|c| c.xml_element_name() != name);
        before - self.children.len()
    }

    /// Replace the children named `name` by `child`, at the position of the
    /// first one or in schema order when absent.
    pub fn replace(&mut self, child: SedaMetadata) -> Result<()> {
        let name = child.xml_element_name().to_string();
        match self.children.iter().position(|c| c.xml_element_name() == name) {
            Some(index) => {
                self.remove_all(&name);
                self.children.insert(index, child);
                Ok(())
            },
            None => {
                self.add_metadata(child)?;
                let rank = self.schema.rank(&name);
                let index = self
                    .children
                    .iter()
                    .position(|c| self.schema.rank(c.xml_element_name()) > rank)
                    .unwrap_or(self.children.len() - 1);
                if let Some(child) = self.children.pop() {
                    self.children.insert(index, child);
                }
                Ok(())
            },
        }
    }

    /// Order children by schema order, recursively.
    ///
    /// The sort is stable so repeated children keep their relative order.
    /// Schemas whose order carries meaning are left as they are.
    pub fn canonize(&mut self) {
        if self.schema.reorderable {
            let schema = self.schema;
            self.children
                .sort_by_key(|c| schema.rank(c.xml_element_name()));
        }
        for child in &mut self.children {
            if let SedaMetadata::Complex(complex) = child {
                complex.canonize();
            }
        }
    }

    pub fn to_seda_xml<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        writer.write_start_element(&self.element_name)?;
        for child in &self.children {
            child.to_seda_xml(writer)?;
        }
        writer.write_end_element()
    }

    pub fn from_seda_xml<R: BufRead>(
        reader: &mut SedaXmlEventReader<R>,
        element_name: &str,
        schema: &'static ComplexSchema,
    ) -> Result<Self> {
        reader.start_block_named(element_name)?;
        let mut complex = Self::with_schema(element_name, schema);
        loop {
            let child_name = match reader.peek_event()? {
                XmlEvent::StartElement { name, .. } => name.clone(),
                XmlEvent::EndElement { .. } => break,
                XmlEvent::Characters(text) => {
                    return Err(Error::MalformedMetadata(format!(
                        "Unexpected text \"{}\" in <{}>",
                        text.trim(),
                        element_name
                    )));
                },
                XmlEvent::EndDocument => {
                    return Err(Error::MalformedMetadata(format!("Unterminated <{}>", element_name)));
                },
            };
            let child = if schema.child(&child_name).is_some() {
                SedaMetadata::from_seda_xml(reader, &child_name)
            } else if schema.expandable {
                AnyXmlType::from_seda_xml(reader, &child_name).map(SedaMetadata::AnyXml)
            } else {
                Err(Error::MalformedMetadata(format!(
                    "<{}> is not allowed in <{}>",
                    child_name, element_name
                )))
            };
            let child = child.map_err(|e| e.context(&format!("<{}>", element_name)))?;
            complex
                .add_metadata(child)
                .map_err(|e| e.context(&format!("<{}>", element_name)))?;
        }
        reader.end_block_named(element_name)?;
        Ok(complex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinality() {
        let mut content = ComplexListType::new("Content").unwrap();
        content.add_new_metadata("DescriptionLevel", "Item").unwrap();
        assert!(content.add_new_metadata("DescriptionLevel", "File").is_err());
        content.add_new_metadata("Title", "a").unwrap();
        content.add_new_metadata("Title", "b").unwrap();
        assert_eq!(content.get_all("Title").count(), 2);
    }

    #[test]
    fn test_non_expandable_rejects_unknown() {
        let mut writer = ComplexListType::new("Writer").unwrap();
        let unknown = SedaMetadata::AnyXml(AnyXmlType::new("Nickname", "<Nickname>x</Nickname>"));
        assert!(matches!(writer.add_metadata(unknown), Err(Error::MalformedMetadata(_))));

        let mut reader =
            SedaXmlEventReader::from_str("<Writer><FullName>A</FullName><Nickname>x</Nickname></Writer>");
        let err = ComplexListType::from_seda_xml(&mut reader, "Writer", complex_schema("Writer")).unwrap_err();
        assert!(matches!(err, Error::MalformedMetadata(_)));
    }

    #[test]
    fn test_expandable_keeps_unknown() {
        let mut reader = SedaXmlEventReader::from_str(
            "<Content><Title>T</Title><Extra><Inner>v</Inner></Extra><Description>d</Description></Content>",
        );
        let content = ComplexListType::from_seda_xml(&mut reader, "Content", complex_schema("Content")).unwrap();
        let names: Vec<_> = content.children().iter().map(|c| c.xml_element_name()).collect();
        assert_eq!(names, ["Title", "Extra", "Description"]);
        match content.get_first("Extra") {
            Some(SedaMetadata::AnyXml(any)) => assert_eq!(any.raw_xml(), "<Extra><Inner>v</Inner></Extra>"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_path_add_groups_leaves() {
        let mut content = ComplexListType::new("Content").unwrap();
        content.add_metadata_by_path("Writer.FullName", "Alice").unwrap();
        content.add_metadata_by_path("Writer.Role", "author").unwrap();
        content.add_metadata_by_path("Writer.FullName", "Bob").unwrap();
        let writers: Vec<_> = content.get_all("Writer").collect();
        assert_eq!(writers.len(), 2);
        match writers[0] {
            SedaMetadata::Complex(w) => {
                assert_eq!(w.first_value("FullName").as_deref(), Some("Alice"));
                assert_eq!(w.first_value("Role").as_deref(), Some("author"));
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_canonize_is_stable() {
        let mut content = ComplexListType::new("Content").unwrap();
        content.add_new_metadata("Description", "d").unwrap();
        content.add_new_metadata("Title", "t1").unwrap();
        content.add_new_metadata("DescriptionLevel", "Item").unwrap();
        content.add_new_metadata("Title", "t2").unwrap();
        content.canonize();
        let values: Vec<_> = content.children().iter().filter_map(|c| c.value_string()).collect();
        assert_eq!(values, ["Item", "t1", "t2", "d"]);
    }

    #[test]
    fn test_rule_order_is_kept() {
        let mut rule = ComplexListType::new("AccessRule").unwrap();
        rule.add_new_metadata("Rule", "ACC-1").unwrap();
        rule.add_new_metadata("StartDate", "2001-01-01").unwrap();
        rule.add_new_metadata("Rule", "ACC-2").unwrap();
        rule.canonize();
        let names: Vec<_> = rule.children().iter().map(|c| c.xml_element_name()).collect();
        assert_eq!(names, ["Rule", "StartDate", "Rule"]);
    }

    #[test]
    fn test_replace_in_schema_order() {
        let mut content = ComplexListType::new("Content").unwrap();
        content.add_new_metadata("Title", "t").unwrap();
        content.add_new_metadata("Description", "d").unwrap();
        content
            .replace(SedaMetadata::from_value("DescriptionLevel", "File").unwrap())
            .unwrap();
        assert_eq!(content.children()[0].xml_element_name(), "DescriptionLevel");
        content
            .replace(SedaMetadata::from_value("Title", "new").unwrap())
            .unwrap();
        assert_eq!(content.first_value("Title").as_deref(), Some("new"));
        assert_eq!(content.children().len(), 3);
    }

    fn complex_schema(name: &str) -> &'static ComplexSchema {
        registry::complex_schema(name).unwrap()
    }
}
