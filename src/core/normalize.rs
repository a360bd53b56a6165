//! Package normalization run after every import.
//!
//! Normalization turns whatever an importer produced into a package where
//! every data object sits in a group, every unit refers to groups only, and
//! every reference resolves.

use crate::common::{Error, ProgressLevel, ProgressLogger, Result};
use crate::core::package::DataObjectPackage;
use std::collections::HashMap;

/// Normalize `package` and return a summary of its content.
///
/// Steps, any failure aborting the whole import:
/// 1. attach SEDA 2.0 objects to the group they reference or declare;
/// 2. wrap objects without any group in a fresh group;
/// 3. resolve SEDA 2.0 unit references to data objects into group references;
/// 4. check that every reference resolves and that units form no cycle.
pub fn vitam_normalize(package: &mut DataObjectPackage, progress: &ProgressLogger) -> Result<String> {
    progress.progress_log(ProgressLevel::Step, "Normalization started")?;
    attach_pending_data_objects(package, progress)?;
    resolve_data_object_references(package)?;
    verify_references(package)?;
    verify_no_cycle(package)?;
    let summary = format!("Normalized package: {}", package.description());
    progress.progress_log(ProgressLevel::Step, &summary)?;
    Ok(summary)
}

fn target_group(
    package: &mut DataObjectPackage,
    object_id: &str,
    reference_id: Option<&str>,
    declared_id: Option<&str>,
) -> Result<String> {
    if let Some(reference_id) = reference_id {
        return match package.data_object_group(reference_id) {
            Some(_) => Ok(reference_id.to_string()),
            None => Err(Error::MalformedDocument(format!(
                "DataObject [{}] refers to unknown DataObjectGroup [{}]",
                object_id, reference_id
            ))),
        };
    }
    if let Some(declared_id) = declared_id {
        package.declare_data_object_group(declared_id).map_err(|e| match e {
            Error::DuplicateId(id) => Error::MalformedDocument(format!(
                "DataObject [{}] declares DataObjectGroup [{}] whose identifier is already used",
                object_id, id
            )),
            other => other,
        })?;
        return Ok(declared_id.to_string());
    }
    Ok(package.new_data_object_group())
}

fn attach_pending_data_objects(package: &mut DataObjectPackage, progress: &ProgressLogger) -> Result<()> {
    let (binaries, physicals) = package.take_pending_data_objects();
    let mut count = 0u64;
    // Declarations first so that references may precede them in the manifest
    for bdo in &binaries {
        if let Some(declared) = &bdo.data_object_group_id {
            target_group(package, bdo.id(), None, Some(declared.as_str()))?;
        }
    }
    for pdo in &physicals {
        if let Some(declared) = &pdo.data_object_group_id {
            target_group(package, pdo.id(), None, Some(declared.as_str()))?;
        }
    }
    for mut bdo in binaries {
        let group_id = target_group(
            package,
            bdo.id(),
            bdo.data_object_group_reference_id.as_deref(),
            bdo.data_object_group_id.as_deref(),
        )?;
        bdo.clear_legacy_linkage();
        package.attach_binary_data_object(&group_id, bdo)?;
        count += 1;
        progress.progress_log_if_step(
            ProgressLevel::ObjectsGroup,
            count,
            &format!("{} DataObjects attached to their group", count),
        )?;
    }
    for mut pdo in physicals {
        let group_id = target_group(
            package,
            pdo.id(),
            pdo.data_object_group_reference_id.as_deref(),
            pdo.data_object_group_id.as_deref(),
        )?;
        pdo.clear_legacy_linkage();
        package.attach_physical_data_object(&group_id, pdo)?;
        count += 1;
        progress.progress_log_if_step(
            ProgressLevel::ObjectsGroup,
            count,
            &format!("{} DataObjects attached to their group", count),
        )?;
    }
    Ok(())
}

fn resolve_data_object_references(package: &mut DataObjectPackage) -> Result<()> {
    let mut resolved = Vec::new();
    for unit in package.archive_units() {
        let Some(object_id) = unit.data_object_reference_id() else {
            continue;
        };
        let group_id = match package.group_id_of_data_object(object_id) {
            Some(group_id) => group_id.to_string(),
            None if package.data_object_group(object_id).is_some() => object_id.to_string(),
            None => {
                return Err(Error::MalformedDocument(format!(
                    "ArchiveUnit [{}] refers to unknown DataObject [{}]",
                    unit.id(),
                    object_id
                )));
            },
        };
        if let Some(existing) = unit.data_object_group_reference_id()
            && existing != group_id
        {
            return Err(Error::MalformedDocument(format!(
                "ArchiveUnit [{}] refers to both DataObjectGroup [{}] and DataObject [{}] of DataObjectGroup [{}]",
                unit.id(),
                existing,
                object_id,
                group_id
            )));
        }
        resolved.push((unit.id().to_string(), group_id));
    }
    for (unit_id, group_id) in resolved {
        if let Some(unit) = package.archive_unit_mut(&unit_id) {
            unit.set_data_object_reference_id(None);
            unit.set_data_object_group_reference_id(Some(&group_id));
        }
    }
    Ok(())
}

fn verify_references(package: &DataObjectPackage) -> Result<()> {
    for root in package.root_unit_ids() {
        if package.archive_unit(root).is_none() {
            return Err(Error::MalformedDocument(format!("Unknown root ArchiveUnit [{}]", root)));
        }
    }
    for unit in package.archive_units() {
        for child in unit.children() {
            if package.archive_unit(child).is_none() {
                return Err(Error::MalformedDocument(format!(
                    "ArchiveUnit [{}] refers to unknown child ArchiveUnit [{}]",
                    unit.id(),
                    child
                )));
            }
        }
        if let Some(group_id) = unit.data_object_group_reference_id()
            && package.data_object_group(group_id).is_none()
        {
            return Err(Error::MalformedDocument(format!(
                "ArchiveUnit [{}] refers to unknown DataObjectGroup [{}]",
                unit.id(),
                group_id
            )));
        }
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

fn verify_no_cycle(package: &DataObjectPackage) -> Result<()> {
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    for unit in package.archive_units() {
        if marks.contains_key(unit.id()) {
            continue;
        }
        // Iterative depth-first walk, deep trees must not overflow the stack
        let mut stack: Vec<(&str, usize)> = vec![(unit.id(), 0)];
        marks.insert(unit.id(), Mark::InProgress);
        while let Some((id, next_child)) = stack.pop() {
            let children = package.archive_unit(id).map(|u| u.children()).unwrap_or_default();
            if next_child < children.len() {
                stack.push((id, next_child + 1));
                let child = children[next_child].as_str();
                match marks.get(child) {
                    Some(Mark::InProgress) => {
                        return Err(Error::MalformedDocument(format!(
                            "ArchiveUnit [{}] is its own ancestor",
                            child
                        )));
                    },
                    Some(Mark::Done) => {},
                    None => {
                        marks.insert(child, Mark::InProgress);
                        stack.push((child, 0));
                    },
                }
            } else {
                marks.insert(id, Mark::Done);
            }
        }
    }
    Ok(())
}
