//! The package of one transfer: every unit, every group, and the shared
//! identifier namespace.

use crate::common::id::{compare_ids, format_id};
use crate::common::{Error, Result};
use crate::core::archive_unit::ArchiveUnit;
use crate::core::data_object::{BinaryDataObject, DataObjectGroup, PhysicalDataObject};
use std::collections::{HashMap, HashSet};

/// Units and groups of one transfer, indexed by package-local identifier.
///
/// Units, groups, binary objects and physical objects share one identifier
/// namespace. Generated identifiers have the form `ID<n>` and never collide
/// with identifiers read from a manifest.
#[derive(Debug, Clone, Default)]
pub struct DataObjectPackage {
    archive_units: HashMap<String, ArchiveUnit>,
    data_object_groups: HashMap<String, DataObjectGroup>,
    /// Data object identifier to owning group identifier
    data_object_index: HashMap<String, String>,
    root_units: Vec<String>,
    pending_binary_data_objects: Vec<BinaryDataObject>,
    pending_physical_data_objects: Vec<PhysicalDataObject>,
    used_ids: HashSet<String>,
    /// Generated identifiers not yet given to any element
    unclaimed_ids: HashSet<String>,
    next_id: u64,
    management_metadata_xml: Option<String>,
}

impl DataObjectPackage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh identifier, unused in this package.
    ///
    /// The identifier is held back from manifest identifiers until the
    /// element it was generated for is added.
    pub fn next_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let id = format_id(self.next_id);
            if self.used_ids.insert(id.clone()) {
                self.unclaimed_ids.insert(id.clone());
                return id;
            }
        }
    }

    /// Whether an element of the package already has identifier `id`.
    pub fn is_id_used(&self, id: &str) -> bool {
        self.used_ids.contains(id) && !self.unclaimed_ids.contains(id)
    }

    fn reserve_id(&mut self, id: &str) -> Result<()> {
        if self.unclaimed_ids.remove(id) || self.used_ids.insert(id.to_string()) {
            Ok(())
        } else {
            Err(Error::DuplicateId(id.to_string()))
        }
    }

    // Units

    /// Register a unit under its identifier.
    pub fn add_archive_unit(&mut self, unit: ArchiveUnit) -> Result<()> {
        self.reserve_id(unit.id())?;
        self.archive_units.insert(unit.id().to_string(), unit);
        Ok(())
    }

    /// Register a unit and list it among the roots.
    pub fn add_root_archive_unit(&mut self, unit: ArchiveUnit) -> Result<()> {
        let id = unit.id().to_string();
        self.add_archive_unit(unit)?;
        self.root_units.push(id);
        Ok(())
    }

    /// List an already registered unit among the roots.
    pub fn add_root_unit_id(&mut self, id: &str) {
        if !self.root_units.iter().any(|r| r == id) {
            self.root_units.push(id.to_string());
        }
    }

    pub fn root_unit_ids(&self) -> &[String] {
        &self.root_units
    }

    pub fn archive_unit(&self, id: &str) -> Option<&ArchiveUnit> {
        self.archive_units.get(id)
    }

    pub fn archive_unit_mut(&mut self, id: &str) -> Option<&mut ArchiveUnit> {
        self.archive_units.get_mut(id)
    }

    /// Units in natural identifier order.
    pub fn archive_units(&self) -> Vec<&ArchiveUnit> {
        let mut units: Vec<_> = self.archive_units.values().collect();
        units.sort_by(|a, b| compare_ids(a.id(), b.id()));
        units
    }

    pub(crate) fn archive_units_mut(&mut self) -> impl Iterator<Item = &mut ArchiveUnit> {
        self.archive_units.values_mut()
    }

    pub fn archive_unit_count(&self) -> usize {
        self.archive_units.len()
    }

    // Groups

    /// Register a group and all of its objects.
    ///
    /// Every identifier is checked before anything is registered.
    pub fn add_data_object_group(&mut self, group: DataObjectGroup) -> Result<()> {
        let mut seen = HashSet::new();
        for id in std::iter::once(group.id()).chain(group.data_object_ids()) {
            if self.is_id_used(id) || !seen.insert(id) {
                return Err(Error::DuplicateId(id.to_string()));
            }
        }
        for id in std::iter::once(group.id()).chain(group.data_object_ids()) {
            self.unclaimed_ids.remove(id);
            self.used_ids.insert(id.to_string());
        }
        self.index_group(&group);
        self.data_object_groups.insert(group.id().to_string(), group);
        Ok(())
    }

    fn index_group(&mut self, group: &DataObjectGroup) {
        for object_id in group.data_object_ids() {
            self.data_object_index
                .insert(object_id.to_string(), group.id().to_string());
        }
    }

    /// Register a new empty group with a generated identifier.
    pub fn new_data_object_group(&mut self) -> String {
        let id = self.next_id();
        self.unclaimed_ids.remove(&id);
        self.data_object_groups
            .insert(id.clone(), DataObjectGroup::new(&id));
        id
    }

    /// Attach a binary object to an existing group, registering its identifier.
    pub fn add_binary_data_object(&mut self, group_id: &str, bdo: BinaryDataObject) -> Result<()> {
        if !self.data_object_groups.contains_key(group_id) {
            return Err(Error::MalformedDocument(format!("Unknown DataObjectGroup [{}]", group_id)));
        }
        self.reserve_id(bdo.id())?;
        self.attach_binary_data_object(group_id, bdo)
    }

    /// Attach a physical object to an existing group, registering its identifier.
    pub fn add_physical_data_object(&mut self, group_id: &str, pdo: PhysicalDataObject) -> Result<()> {
        if !self.data_object_groups.contains_key(group_id) {
            return Err(Error::MalformedDocument(format!("Unknown DataObjectGroup [{}]", group_id)));
        }
        self.reserve_id(pdo.id())?;
        self.attach_physical_data_object(group_id, pdo)
    }

    /// Attach an object whose identifier is already registered.
    pub(crate) fn attach_binary_data_object(&mut self, group_id: &str, bdo: BinaryDataObject) -> Result<()> {
        let group = self
            .data_object_groups
            .get_mut(group_id)
            .ok_or_else(|| Error::MalformedDocument(format!("Unknown DataObjectGroup [{}]", group_id)))?;
        self.data_object_index
            .insert(bdo.id().to_string(), group_id.to_string());
        group.add_binary_data_object(bdo);
        Ok(())
    }

    pub(crate) fn attach_physical_data_object(&mut self, group_id: &str, pdo: PhysicalDataObject) -> Result<()> {
        let group = self
            .data_object_groups
            .get_mut(group_id)
            .ok_or_else(|| Error::MalformedDocument(format!("Unknown DataObjectGroup [{}]", group_id)))?;
        self.data_object_index
            .insert(pdo.id().to_string(), group_id.to_string());
        group.add_physical_data_object(pdo);
        Ok(())
    }

    /// Register an empty group under an identifier declared by a SEDA 2.0
    /// object.
    pub(crate) fn declare_data_object_group(&mut self, id: &str) -> Result<()> {
        if self.data_object_groups.contains_key(id) {
            return Ok(());
        }
        self.reserve_id(id)?;
        self.data_object_groups
            .insert(id.to_string(), DataObjectGroup::new(id));
        Ok(())
    }

    pub fn data_object_group(&self, id: &str) -> Option<&DataObjectGroup> {
        self.data_object_groups.get(id)
    }

    pub fn data_object_group_mut(&mut self, id: &str) -> Option<&mut DataObjectGroup> {
        self.data_object_groups.get_mut(id)
    }

    /// Groups in natural identifier order.
    pub fn data_object_groups(&self) -> Vec<&DataObjectGroup> {
        let mut groups: Vec<_> = self.data_object_groups.values().collect();
        groups.sort_by(|a, b| compare_ids(a.id(), b.id()));
        groups
    }

    pub fn data_object_group_count(&self) -> usize {
        self.data_object_groups.len()
    }

    /// Identifier of the group owning data object `object_id`.
    pub fn group_id_of_data_object(&self, object_id: &str) -> Option<&str> {
        self.data_object_index.get(object_id).map(String::as_str)
    }

    pub fn binary_data_object_count(&self) -> usize {
        self.data_object_groups
            .values()
            .map(|g| g.binary_data_objects().len())
            .sum()
    }

    pub fn physical_data_object_count(&self) -> usize {
        self.data_object_groups
            .values()
            .map(|g| g.physical_data_objects().len())
            .sum()
    }

    // SEDA 2.0 objects waiting for normalization

    /// Keep a group-less binary object until normalization.
    pub fn add_pending_binary_data_object(&mut self, bdo: BinaryDataObject) -> Result<()> {
        self.reserve_id(bdo.id())?;
        self.pending_binary_data_objects.push(bdo);
        Ok(())
    }

    /// Keep a group-less physical object until normalization.
    pub fn add_pending_physical_data_object(&mut self, pdo: PhysicalDataObject) -> Result<()> {
        self.reserve_id(pdo.id())?;
        self.pending_physical_data_objects.push(pdo);
        Ok(())
    }

    pub fn pending_binary_data_objects(&self) -> &[BinaryDataObject] {
        &self.pending_binary_data_objects
    }

    pub fn pending_physical_data_objects(&self) -> &[PhysicalDataObject] {
        &self.pending_physical_data_objects
    }

    pub(crate) fn take_pending_data_objects(&mut self) -> (Vec<BinaryDataObject>, Vec<PhysicalDataObject>) {
        (
            std::mem::take(&mut self.pending_binary_data_objects),
            std::mem::take(&mut self.pending_physical_data_objects),
        )
    }

    // Management metadata

    pub fn management_metadata_xml(&self) -> Option<&str> {
        self.management_metadata_xml.as_deref()
    }

    pub fn set_management_metadata_xml(&mut self, xml: Option<String>) {
        self.management_metadata_xml = xml;
    }

    /// Merge group `source_id` into group `target_id`.
    ///
    /// Objects move to the target, the LogBooks are spliced and every unit
    /// referring to the source now refers to the target. The source
    /// identifier stays reserved. Nothing changes on error.
    pub fn merge_data_object_groups(&mut self, target_id: &str, source_id: &str) -> Result<()> {
        if target_id == source_id {
            return Err(Error::Other(format!("Can't merge DataObjectGroup [{}] with itself", target_id)));
        }
        if !self.data_object_groups.contains_key(target_id) {
            return Err(Error::MalformedDocument(format!("Unknown DataObjectGroup [{}]", target_id)));
        }
        let Some(mut source) = self.data_object_groups.remove(source_id) else {
            return Err(Error::MalformedDocument(format!("Unknown DataObjectGroup [{}]", source_id)));
        };
        let Some(target) = self.data_object_groups.get_mut(target_id) else {
            self.data_object_groups.insert(source_id.to_string(), source);
            return Err(Error::MalformedDocument(format!("Unknown DataObjectGroup [{}]", target_id)));
        };
        let moved: Vec<String> = source.data_object_ids().map(str::to_string).collect();
        if let Err(e) = target.merge(&mut source) {
            self.data_object_groups.insert(source_id.to_string(), source);
            return Err(e);
        }
        for object_id in moved {
            self.data_object_index.insert(object_id, target_id.to_string());
        }
        for unit in self.archive_units.values_mut() {
            if unit.data_object_group_reference_id() == Some(source_id) {
                unit.set_data_object_group_reference_id(Some(target_id));
            }
        }
        tracing::debug!(target_group = target_id, source_group = source_id, "DataObjectGroups merged");
        Ok(())
    }

    /// Counts line used in import summaries.
    pub fn description(&self) -> String {
        format!(
            "{} ArchiveUnit(s), {} DataObjectGroup(s), {} BinaryDataObject(s), {} PhysicalDataObject(s)",
            self.archive_unit_count(),
            self.data_object_group_count(),
            self.binary_data_object_count(),
            self.physical_data_object_count()
        )
    }
}
