//! Units of description.
//!
//! An [`ArchiveUnit`] holds its descriptive metadata and refers to its
//! children and to its DataObjectGroup by identifier. The package owns every
//! unit, so a unit can be the child of several parents.

use crate::common::{Error, ProgressLevel, ProgressLogger, Result};
use crate::core::package::DataObjectPackage;
use crate::core::{ParseOutcome, SedaXmlFragments};
use crate::metadata::registry::{CONTENT_SCHEMA, MANAGEMENT_SCHEMA};
use crate::metadata::{ArchiveUnitProfile, ComplexListType};
use crate::xml::{STANDARD_INDENT, SedaXmlEventReader, SedaXmlStreamWriter, write_to_string};
use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// A node of the description tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveUnit {
    id: String,
    pub archive_unit_profile: Option<ArchiveUnitProfile>,
    pub management: Option<ComplexListType>,
    pub content: ComplexListType,
    children: Vec<String>,
    data_object_group_reference_id: Option<String>,
    data_object_reference_id: Option<String>,
    /// Directory or file the unit was imported from, if any
    pub on_disk_path: Option<PathBuf>,
}

impl ArchiveUnit {
    /// Unit with an empty `Content`.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            archive_unit_profile: None,
            management: None,
            content: ComplexListType::with_schema("Content", CONTENT_SCHEMA),
            children: Vec::new(),
            data_object_group_reference_id: None,
            data_object_reference_id: None,
            on_disk_path: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// First title of the unit, if any.
    pub fn title(&self) -> Option<String> {
        self.content.first_value("Title")
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Append a child unit, ignoring an already present one.
    pub fn add_child(&mut self, child_id: &str) {
        if !self.children.iter().any(|c| c == child_id) {
            self.children.push(child_id.to_string());
        }
    }

    pub fn remove_child(&mut self, child_id: &str) -> bool {
        let before = self.children.len();
        self.children.retain(|c| c != child_id);
        before != self.children.len()
    }

    pub fn data_object_group_reference_id(&self) -> Option<&str> {
        self.data_object_group_reference_id.as_deref()
    }

    pub fn set_data_object_group_reference_id(&mut self, group_id: Option<&str>) {
        self.data_object_group_reference_id = group_id.map(str::to_string);
    }

    /// SEDA 2.0 reference to a data object, resolved by normalization.
    pub fn data_object_reference_id(&self) -> Option<&str> {
        self.data_object_reference_id.as_deref()
    }

    pub fn set_data_object_reference_id(&mut self, object_id: Option<&str>) {
        self.data_object_reference_id = object_id.map(str::to_string);
    }

    /// Order `Content` and `Management` children in schema order.
    pub fn canonize(&mut self) {
        self.content.canonize();
        if let Some(management) = &mut self.management {
            management.canonize();
        }
    }

    fn write_metadata<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        if let Some(profile) = &self.archive_unit_profile {
            profile.to_seda_xml(writer)?;
        }
        if let Some(management) = &self.management {
            management.to_seda_xml(writer)?;
        }
        self.content.to_seda_xml(writer)
    }

    fn read_metadata<R: BufRead>(&mut self, reader: &mut SedaXmlEventReader<R>) -> Result<()> {
        if reader.peek_block_if_named("ArchiveUnitProfile")? {
            self.archive_unit_profile = Some(ArchiveUnitProfile::from_seda_xml(reader)?);
        }
        if reader.peek_block_if_named("Management")? {
            self.management = Some(ComplexListType::from_seda_xml(reader, "Management", MANAGEMENT_SCHEMA)?);
        }
        if !reader.peek_block_if_named("Content")? {
            return Err(Error::MalformedDocument("Missing mandatory Content".to_string()));
        }
        self.content = ComplexListType::from_seda_xml(reader, "Content", CONTENT_SCHEMA)?;
        Ok(())
    }

    /// Write the unit, its not yet written children and its group reference.
    ///
    /// A child already written elsewhere in the document is written as an
    /// `ArchiveUnitRefId` pointer.
    pub fn to_seda_xml<W: Write>(
        &self,
        writer: &mut SedaXmlStreamWriter<W>,
        package: &DataObjectPackage,
        state: &mut ArchiveUnitWriteState,
        progress: &ProgressLogger,
    ) -> Result<()> {
        state.written.insert(self.id.clone());
        state.count += 1;
        progress.progress_log_if_step(
            ProgressLevel::ObjectsGroup,
            state.count,
            &format!("{} ArchiveUnits exported", state.count),
        )?;

        writer.write_start_element("ArchiveUnit")?;
        writer.write_attribute("id", &self.id)?;
        self.write_metadata(writer)
            .map_err(|e| e.context(&format!("Error writing ArchiveUnit [{}]", self.id)))?;
        for child_id in &self.children {
            write_archive_unit_by_id(writer, package, child_id, state, progress)?;
        }
        if self.data_object_group_reference_id.is_some() || self.data_object_reference_id.is_some() {
            writer.write_start_element("DataObjectReference")?;
            writer.write_element_value_if_not_empty("DataObjectReferenceId", self.data_object_reference_id.as_deref())?;
            writer.write_element_value_if_not_empty(
                "DataObjectGroupReferenceId",
                self.data_object_group_reference_id.as_deref(),
            )?;
            writer.write_end_element()?;
        }
        writer.write_end_element()
    }

    /// Read an `ArchiveUnit` and its nested children into `package`.
    ///
    /// Returns [`ParseOutcome::NotPresent`] without consuming anything when
    /// the next element is not an `ArchiveUnit` with an `id`. An
    /// `ArchiveUnitRefId` pointer yields the identifier it points to.
    pub fn id_from_seda_xml<R: BufRead>(
        reader: &mut SedaXmlEventReader<R>,
        package: &mut DataObjectPackage,
        progress: &ProgressLogger,
    ) -> Result<ParseOutcome<String>> {
        let Some(id) = reader.peek_attribute_block_if_named("ArchiveUnit", "id")? else {
            return Ok(ParseOutcome::NotPresent);
        };
        Self::read_body(reader, package, &id, progress)
            .map(ParseOutcome::Ok)
            .map_err(|e| e.context(&format!("Error reading ArchiveUnit [{}]", id)))
    }

    fn read_body<R: BufRead>(
        reader: &mut SedaXmlEventReader<R>,
        package: &mut DataObjectPackage,
        id: &str,
        progress: &ProgressLogger,
    ) -> Result<String> {
        reader.next_event()?;
        if let Some(target) = reader.next_value_if_named("ArchiveUnitRefId")? {
            reader.end_block_named("ArchiveUnit")?;
            return Ok(target.trim().to_string());
        }

        let mut unit = ArchiveUnit::new(id);
        unit.read_metadata(reader)?;
        while let ParseOutcome::Ok(child_id) = ArchiveUnit::id_from_seda_xml(reader, package, progress)? {
            unit.add_child(&child_id);
        }
        while reader.next_block_if_named("DataObjectReference")? {
            if unit.data_object_reference_id.is_some() || unit.data_object_group_reference_id.is_some() {
                return Err(Error::MalformedDocument(
                    "Only one DataObjectReference is supported per ArchiveUnit".to_string(),
                ));
            }
            unit.data_object_reference_id = reader.next_value_if_named("DataObjectReferenceId")?;
            unit.data_object_group_reference_id = reader.next_value_if_named("DataObjectGroupReferenceId")?;
            reader.end_block_named("DataObjectReference")?;
        }
        reader.end_block_named("ArchiveUnit")?;

        package.add_archive_unit(unit)?;
        let count = package.archive_unit_count() as u64;
        progress.progress_log_if_step(
            ProgressLevel::ObjectsGroup,
            count,
            &format!("{} ArchiveUnits imported", count),
        )?;
        Ok(id.to_string())
    }
}

impl SedaXmlFragments for ArchiveUnit {
    fn to_seda_xml_fragments(&self) -> Result<String> {
        write_to_string(Some(STANDARD_INDENT), |w| self.write_metadata(w))
    }

    fn from_seda_xml_fragments(&mut self, fragments: &str) -> Result<()> {
        let mut reader = SedaXmlEventReader::from_str(fragments);
        let mut parsed = ArchiveUnit::new(&self.id);
        parsed
            .read_metadata(&mut reader)
            .map_err(|e| e.context(&format!("Error reading ArchiveUnit [{}]", self.id)))?;
        if let Some(name) = reader.peek_name()? {
            return Err(Error::MalformedDocument(format!(
                "Unexpected <{}> in ArchiveUnit [{}] fragments",
                name, self.id
            )));
        }
        if !reader.at_end()? {
            return Err(Error::MalformedDocument(format!(
                "Unexpected content in ArchiveUnit [{}] fragments",
                self.id
            )));
        }
        self.archive_unit_profile = parsed.archive_unit_profile;
        self.management = parsed.management;
        self.content = parsed.content;
        Ok(())
    }
}

/// Bookkeeping while writing the unit graph of a package.
#[derive(Debug, Default)]
pub struct ArchiveUnitWriteState {
    written: HashSet<String>,
    pointers: u64,
    count: u64,
}

impl ArchiveUnitWriteState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of units written in full.
    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Write unit `id`, or an `ArchiveUnitRefId` pointer if it was already written.
pub fn write_archive_unit_by_id<W: Write>(
    writer: &mut SedaXmlStreamWriter<W>,
    package: &DataObjectPackage,
    id: &str,
    state: &mut ArchiveUnitWriteState,
    progress: &ProgressLogger,
) -> Result<()> {
    if state.written.contains(id) {
        state.pointers += 1;
        writer.write_start_element("ArchiveUnit")?;
        writer.write_attribute("id", &format!("{}_ref{}", id, state.pointers))?;
        writer.write_element_value("ArchiveUnitRefId", id)?;
        return writer.write_end_element();
    }
    let unit = package
        .archive_unit(id)
        .ok_or_else(|| Error::MalformedDocument(format!("Unknown ArchiveUnit [{}]", id)))?;
    unit.to_seda_xml(writer, package, state, progress)
}
