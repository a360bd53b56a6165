//! Import of a directory tree.
//!
//! Directories become units of description level `RecordGrp`, files become
//! `Item` units holding one `BinaryMaster_1` object. A few reserved file
//! names carry metadata instead of content:
//!
//! - `__ArchiveUnitMetadata.xml` in a directory replaces the generated
//!   metadata of the directory unit;
//! - `__ManagementMetadata.xml` and `__GlobalMetadata.xml` at the top of an
//!   imported directory give the package management metadata and the
//!   manifest header;
//! - `__<Usage>_<n>__name` files are objects of the directory unit itself.

use crate::common::{Error, ProgressLevel, ProgressLogger, Result};
use crate::core::{ArchiveUnit, DataObjectPackage, GlobalMetadata, SedaXmlFragments};
use crate::inout::file_object::{DEFAULT_DATA_OBJECT_VERSION, binary_data_object_from_file, split_usage_prefix};
use crate::inout::{ImportOutcome, Importer};
use crate::xml::SedaXmlEventReader;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

pub const ARCHIVE_UNIT_METADATA_FILE: &str = "__ArchiveUnitMetadata.xml";
pub const MANAGEMENT_METADATA_FILE: &str = "__ManagementMetadata.xml";
pub const GLOBAL_METADATA_FILE: &str = "__GlobalMetadata.xml";

const RESERVED_FILES: &[&str] = &[ARCHIVE_UNIT_METADATA_FILE, MANAGEMENT_METADATA_FILE, GLOBAL_METADATA_FILE];

/// Imports files and directories as a package.
#[derive(Debug, Clone)]
pub struct DiskToArchiveTransferImporter {
    paths: Vec<PathBuf>,
    ignore_patterns: Vec<Regex>,
}

impl DiskToArchiveTransferImporter {
    /// Importer of `paths`, each becoming a root unit.
    ///
    /// A single directory is unwrapped: its entries become the roots and its
    /// reserved files describe the package.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            ignore_patterns: Vec::new(),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(vec![path.into()])
    }

    /// Skip entries whose whole name matches `pattern`.
    pub fn add_ignore_pattern(&mut self, pattern: &str) -> Result<()> {
        self.ignore_patterns.push(Regex::new(&format!("^(?:{})$", pattern))?);
        Ok(())
    }

    pub fn with_ignore_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        for pattern in patterns {
            self.add_ignore_pattern(pattern.as_ref())?;
        }
        Ok(self)
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignore_patterns.iter().any(|p| p.is_match(name))
    }

    /// Entries of `dir` to import, sorted by name.
    fn entries(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if RESERVED_FILES.contains(&name.as_str()) {
                continue;
            }
            if self.is_ignored(&name) {
                tracing::debug!(path = %entry.path().display(), "Ignored by pattern");
                continue;
            }
            entries.push(entry.path());
        }
        entries.sort();
        Ok(entries)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Title and description level of a unit without metadata file.
fn set_generated_content(unit: &mut ArchiveUnit, title: &str, description_level: &str) -> Result<()> {
    unit.content.add_new_metadata("DescriptionLevel", description_level)?;
    unit.content.add_new_metadata("Title", title)?;
    Ok(())
}

struct DiskWalk<'a> {
    importer: &'a DiskToArchiveTransferImporter,
    package: DataObjectPackage,
    progress: &'a ProgressLogger,
    files: u64,
}

impl DiskWalk<'_> {
    fn count_file(&mut self) -> Result<()> {
        self.files += 1;
        self.progress.progress_log_if_step(
            ProgressLevel::ObjectsGroup,
            self.files,
            &format!("{} files imported", self.files),
        )
    }

    fn unit_from_path(&mut self, path: &Path) -> Result<String> {
        if path.is_dir() {
            self.directory_unit(path)
        } else if path.is_file() {
            self.file_unit(path)
        } else {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Can't import [{}]", path.display()),
            )))
        }
    }

    fn file_unit(&mut self, path: &Path) -> Result<String> {
        let name = file_name_of(path);
        let unit_id = self.package.next_id();
        let mut unit = ArchiveUnit::new(&unit_id);
        set_generated_content(&mut unit, &name, "Item")?;
        unit.on_disk_path = Some(path.to_path_buf());

        let group_id = self.package.new_data_object_group();
        let bdo_id = self.package.next_id();
        let bdo = binary_data_object_from_file(&bdo_id, path, DEFAULT_DATA_OBJECT_VERSION, &name)?;
        self.package.add_binary_data_object(&group_id, bdo)?;
        unit.set_data_object_group_reference_id(Some(&group_id));
        self.package.add_archive_unit(unit)?;
        self.count_file()?;
        Ok(unit_id)
    }

    fn directory_unit(&mut self, dir: &Path) -> Result<String> {
        let unit_id = self.package.next_id();
        let mut unit = ArchiveUnit::new(&unit_id);
        unit.on_disk_path = Some(dir.to_path_buf());

        let metadata_file = dir.join(ARCHIVE_UNIT_METADATA_FILE);
        if metadata_file.is_file() {
            let fragments = fs::read_to_string(&metadata_file)?;
            unit.from_seda_xml_fragments(&fragments)
                .map_err(|e| e.context(&format!("Error reading [{}]", metadata_file.display())))?;
        } else {
            set_generated_content(&mut unit, &file_name_of(dir), "RecordGrp")?;
        }

        let mut own_group: Option<String> = None;
        for entry in self.importer.entries(dir)? {
            let entry_name = file_name_of(&entry);
            if entry.is_file()
                && let Some((version, name)) = split_usage_prefix(&entry_name)
            {
                let group_id = match &own_group {
                    Some(group_id) => group_id.clone(),
                    None => {
                        let group_id = self.package.new_data_object_group();
                        unit.set_data_object_group_reference_id(Some(&group_id));
                        own_group = Some(group_id.clone());
                        group_id
                    },
                };
                let bdo_id = self.package.next_id();
                let bdo = binary_data_object_from_file(&bdo_id, &entry, version, name)?;
                self.package.add_binary_data_object(&group_id, bdo)?;
                self.count_file()?;
                continue;
            }
            let child_id = self.unit_from_path(&entry)?;
            unit.add_child(&child_id);
        }
        self.package.add_archive_unit(unit)?;
        Ok(unit_id)
    }
}

fn read_management_metadata(dir: &Path) -> Result<Option<String>> {
    let path = dir.join(MANAGEMENT_METADATA_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let xml = fs::read_to_string(&path)?;
    let mut reader = SedaXmlEventReader::from_str(&xml);
    match reader.next_block_as_string_if_named("ManagementMetadata")? {
        Some(block) => Ok(Some(block)),
        None => Err(Error::MalformedDocument(format!(
            "[{}] must hold a <ManagementMetadata> element",
            path.display()
        ))),
    }
}

fn read_global_metadata(dir: &Path) -> Result<Option<GlobalMetadata>> {
    let path = dir.join(GLOBAL_METADATA_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let mut metadata = GlobalMetadata::default();
    metadata
        .from_seda_xml_fragments(&fs::read_to_string(&path)?)
        .map_err(|e| e.context(&format!("Error reading [{}]", path.display())))?;
    Ok(Some(metadata))
}

impl Importer for DiskToArchiveTransferImporter {
    fn do_import(&mut self, progress: &ProgressLogger) -> Result<ImportOutcome> {
        let shown: Vec<String> = self.paths.iter().map(|p| p.display().to_string()).collect();
        progress.progress_log(
            ProgressLevel::Global,
            &format!("Import from disk of [{}]", shown.join(", ")),
        )?;

        let mut global_metadata = None;
        let mut management_metadata = None;
        let roots = match self.paths.as_slice() {
            [dir] if dir.is_dir() => {
                global_metadata = read_global_metadata(dir)?;
                management_metadata = read_management_metadata(dir)?;
                self.entries(dir)?
            },
            paths => paths.to_vec(),
        };

        let mut walk = DiskWalk {
            importer: self,
            package: DataObjectPackage::new(),
            progress,
            files: 0,
        };
        for root in &roots {
            let id = walk.unit_from_path(root)?;
            walk.package.add_root_unit_id(&id);
        }
        let mut package = walk.package;
        package.set_management_metadata_xml(management_metadata);

        let summary = format!("Disk import: {}", package.description());
        progress.progress_log(ProgressLevel::Step, &summary)?;
        Ok(ImportOutcome {
            package,
            global_metadata,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_tree_import() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("fonds");
        write(&root.join("letters/a.txt"), "a");
        write(&root.join("letters/b.txt"), "bb");
        write(&root.join("notes.txt"), "notes");
        write(&root.join("letters/.DS_Store"), "");

        let mut importer = DiskToArchiveTransferImporter::from_path(&root)
            .with_ignore_patterns(&["\\.DS_Store"])
            .unwrap();
        let outcome = importer.do_import(&ProgressLogger::silent()).unwrap();
        let package = &outcome.package;
        assert!(outcome.global_metadata.is_none());
        assert_eq!(package.root_unit_ids().len(), 2);
        assert_eq!(package.archive_unit_count(), 4);
        assert_eq!(package.binary_data_object_count(), 3);

        let letters = package.archive_unit(&package.root_unit_ids()[0]).unwrap();
        assert_eq!(letters.title().as_deref(), Some("letters"));
        assert_eq!(letters.content.first_value("DescriptionLevel").as_deref(), Some("RecordGrp"));
        let titles: Vec<_> = letters
            .children()
            .iter()
            .map(|id| package.archive_unit(id).unwrap().title().unwrap())
            .collect();
        assert_eq!(titles, ["a.txt", "b.txt"]);

        let b = package.archive_unit(&letters.children()[1]).unwrap();
        let group = package.data_object_group(b.data_object_group_reference_id().unwrap()).unwrap();
        let bdo = &group.binary_data_objects()[0];
        assert_eq!(bdo.size, Some(2));
        assert_eq!(bdo.data_object_version.as_deref(), Some("BinaryMaster_1"));
    }

    #[test]
    fn test_reserved_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("sip");
        write(
            &root.join(GLOBAL_METADATA_FILE),
            "<MessageIdentifier>MSG-3</MessageIdentifier><ArchivalAgency><Identifier>AA</Identifier></ArchivalAgency>",
        );
        write(
            &root.join(MANAGEMENT_METADATA_FILE),
            "<ManagementMetadata><OriginatingAgencyIdentifier>FRAN</OriginatingAgencyIdentifier></ManagementMetadata>",
        );
        write(
            &root.join("file/__ArchiveUnitMetadata.xml"),
            "<Content><DescriptionLevel>Item</DescriptionLevel><Title>Scanned letter</Title></Content>",
        );
        write(&root.join("file/__BinaryMaster_1__letter.pdf"), "pdf");
        write(&root.join("file/__TextContent_1__letter.txt"), "text");

        let mut importer = DiskToArchiveTransferImporter::from_path(&root);
        let outcome = importer.do_import(&ProgressLogger::silent()).unwrap();
        let metadata = outcome.global_metadata.unwrap();
        assert_eq!(metadata.message_identifier.as_deref(), Some("MSG-3"));
        assert_eq!(metadata.archival_agency_identifier.as_deref(), Some("AA"));

        let package = &outcome.package;
        assert!(package.management_metadata_xml().unwrap().contains("FRAN"));
        assert_eq!(package.archive_unit_count(), 1);
        let unit = package.archive_unit(&package.root_unit_ids()[0]).unwrap();
        assert_eq!(unit.title().as_deref(), Some("Scanned letter"));
        assert!(unit.children().is_empty());
        let group = package.data_object_group(unit.data_object_group_reference_id().unwrap()).unwrap();
        let master = group.find_data_object_by_data_object_version("BinaryMaster_1").unwrap();
        assert!(group.find_data_object_by_data_object_version("TextContent_1").is_some());
        let master_filename = match master {
            crate::core::DataObjectRef::Binary(bdo) => bdo.file_info.as_ref().unwrap().first_value("Filename"),
            crate::core::DataObjectRef::Physical(_) => None,
        };
        assert_eq!(master_filename.as_deref(), Some("letter.pdf"));
    }

    #[test]
    fn test_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut importer = DiskToArchiveTransferImporter::new(vec![dir.path().join("absent.txt"), dir.path().join("x")]);
        assert!(matches!(
            importer.do_import(&ProgressLogger::silent()),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_bad_ignore_pattern() {
        let mut importer = DiskToArchiveTransferImporter::from_path("/tmp");
        assert!(matches!(importer.add_ignore_pattern("("), Err(Error::Config(_))));
    }
}
