//! Import of unit metadata described in CSV.
//!
//! The header names the columns. `ID` identifies a line, `ParentID` names
//! the parent line (empty for roots) and the optional `File` column gives a
//! file relative to the CSV file directory. Every other column names a
//! `Content` child, with dots for nested composites such as
//! `Writer.FullName`. A `Content.` prefix is accepted and ignored.

use crate::common::{Error, ProgressLogger, Result};
use crate::inout::{ImportOutcome, Importer};
use std::path::PathBuf;

pub const ID_COLUMN: &str = "ID";
pub const PARENT_ID_COLUMN: &str = "ParentID";
pub const FILE_COLUMN: &str = "File";

/// Imports a metadata CSV file.
#[derive(Debug, Clone)]
#[cfg_attr(not(feature = "csv"), allow(dead_code))]
pub struct CsvMetadataToDataObjectPackageImporter {
    path: PathBuf,
    charset: String,
    delimiter: char,
}

impl CsvMetadataToDataObjectPackageImporter {
    pub fn new(path: impl Into<PathBuf>, charset: &str, delimiter: char) -> Self {
        Self {
            path: path.into(),
            charset: charset.to_string(),
            delimiter,
        }
    }
}

#[cfg(not(feature = "csv"))]
impl Importer for CsvMetadataToDataObjectPackageImporter {
    fn do_import(&mut self, _progress: &ProgressLogger) -> Result<ImportOutcome> {
        Err(Error::FeatureDisabled("csv".to_string()))
    }
}

#[cfg(feature = "csv")]
impl Importer for CsvMetadataToDataObjectPackageImporter {
    fn do_import(&mut self, progress: &ProgressLogger) -> Result<ImportOutcome> {
        use crate::common::ProgressLevel;
        use crate::core::{ArchiveUnit, DataObjectPackage};
        use crate::inout::csv_source::{field, read_csv_table};
        use crate::inout::file_object::{DEFAULT_DATA_OBJECT_VERSION, binary_data_object_from_file};
        use std::collections::HashMap;
        use std::path::Path;

        progress.progress_log(
            ProgressLevel::Global,
            &format!("Import of the metadata file [{}]", self.path.display()),
        )?;
        let table = read_csv_table(&self.path, &self.charset, self.delimiter)?;
        let id_col = table
            .column(ID_COLUMN)
            .ok_or_else(|| Error::MalformedDocument(format!("Missing {} column", ID_COLUMN)))?;
        let parent_col = table.column(PARENT_ID_COLUMN);
        let file_col = table.column(FILE_COLUMN);
        let metadata_cols: Vec<(usize, &str)> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != id_col && Some(*i) != parent_col && Some(*i) != file_col)
            .map(|(i, h)| (i, h.strip_prefix("Content.").unwrap_or(h)))
            .filter(|(_, h)| !h.is_empty())
            .collect();
        let base_dir = self.path.parent().unwrap_or_else(|| Path::new("."));

        let mut package = DataObjectPackage::new();
        let mut ids_by_key: HashMap<String, String> = HashMap::new();
        let mut links = Vec::with_capacity(table.records.len());
        for (count, (line, record)) in table.records.iter().enumerate() {
            let key = field(record, Some(id_col));
            if key.is_empty() {
                return Err(Error::MalformedDocument(format!("Line {}: empty {}", line, ID_COLUMN)));
            }
            if ids_by_key.contains_key(key) {
                return Err(Error::MalformedDocument(format!(
                    "Line {}: duplicate {} [{}]",
                    line, ID_COLUMN, key
                )));
            }

            let id = package.next_id();
            let mut unit = ArchiveUnit::new(&id);
            for (col, path) in &metadata_cols {
                let value = field(record, Some(*col));
                if !value.is_empty() {
                    unit.content
                        .add_metadata_by_path(path, value)
                        .map_err(|e| e.context(&format!("Line {}, column {}", line, path)))?;
                }
            }
            unit.canonize();

            let file = field(record, file_col);
            if !file.is_empty() {
                let file_path = base_dir.join(file);
                let name = file_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.to_string());
                let group_id = package.new_data_object_group();
                let bdo_id = package.next_id();
                let bdo = binary_data_object_from_file(&bdo_id, &file_path, DEFAULT_DATA_OBJECT_VERSION, &name)
                    .map_err(|e| match e {
                        Error::Io(io) => Error::Io(std::io::Error::new(
                            io.kind(),
                            format!("Line {}: can't read [{}]: {}", line, file_path.display(), io),
                        )),
                        other => other,
                    })?;
                package.add_binary_data_object(&group_id, bdo)?;
                unit.set_data_object_group_reference_id(Some(&group_id));
                unit.on_disk_path = Some(file_path);
            }

            package.add_archive_unit(unit)?;
            ids_by_key.insert(key.to_string(), id.clone());
            links.push((*line, id, field(record, parent_col).to_string()));
            progress.progress_log_if_step(
                ProgressLevel::ObjectsGroup,
                count as u64 + 1,
                &format!("{} metadata lines imported", count + 1),
            )?;
        }

        for (line, id, parent) in links {
            if parent.is_empty() {
                package.add_root_unit_id(&id);
                continue;
            }
            let parent_id = ids_by_key.get(&parent).ok_or_else(|| {
                Error::MalformedDocument(format!("Line {}: unknown {} [{}]", line, PARENT_ID_COLUMN, parent))
            })?;
            if let Some(parent_unit) = package.archive_unit_mut(parent_id) {
                parent_unit.add_child(&id);
            }
        }

        let summary = format!("Metadata CSV import: {}", package.description());
        progress.progress_log(ProgressLevel::Step, &summary)?;
        Ok(ImportOutcome {
            package,
            global_metadata: None,
            summary,
        })
    }
}

#[cfg(all(test, feature = "csv"))]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_import() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("files")).unwrap();
        std::fs::write(dir.path().join("files/minutes.txt"), "minutes").unwrap();
        let path = dir.path().join("metadata.csv");
        std::fs::write(
            &path,
            "ID;ParentID;File;Content.Title;DescriptionLevel;Writer.FullName;Writer.FullName;StartDate\n\
             A;;;Board;RecordGrp;;;\n\
             B;A;files/minutes.txt;Minutes;Item;Jane Doe;John Doe;2023-05-04T10:00:00\n",
        )
        .unwrap();

        let mut importer = CsvMetadataToDataObjectPackageImporter::new(&path, "UTF-8", ';');
        let outcome = importer.do_import(&ProgressLogger::silent()).unwrap();
        let package = &outcome.package;
        assert_eq!(package.root_unit_ids().len(), 1);
        let board = package.archive_unit(&package.root_unit_ids()[0]).unwrap();
        assert_eq!(board.title().as_deref(), Some("Board"));
        let minutes = package.archive_unit(&board.children()[0]).unwrap();
        // Canonized: DescriptionLevel comes before Title
        assert_eq!(minutes.content.children()[0].xml_element_name(), "DescriptionLevel");
        let writers: Vec<_> = minutes.content.get_all("Writer").collect();
        assert_eq!(writers.len(), 2);
        assert_eq!(
            writers[1].as_complex().unwrap().first_value("FullName").as_deref(),
            Some("John Doe")
        );
        let group_id = minutes.data_object_group_reference_id().unwrap();
        assert_eq!(package.data_object_group(group_id).unwrap().binary_data_objects()[0].size, Some(7));
    }

    #[test]
    fn test_missing_id_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.csv");
        std::fs::write(&path, "Title\nA\n").unwrap();
        let err = CsvMetadataToDataObjectPackageImporter::new(&path, "UTF-8", ';')
            .do_import(&ProgressLogger::silent())
            .unwrap_err();
        assert!(err.to_string().contains("Missing ID column"));
    }

    #[test]
    fn test_unknown_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.csv");
        std::fs::write(&path, "ID;ParentID;Title\nA;Z;First\n").unwrap();
        let err = CsvMetadataToDataObjectPackageImporter::new(&path, "UTF-8", ';')
            .do_import(&ProgressLogger::silent())
            .unwrap_err();
        assert!(err.to_string().contains("unknown ParentID [Z]"));
    }
}
