//! Import of a classification tree described in CSV.
//!
//! The file has a header line then one line per node:
//! `Cote;Title;FatherCote;DescriptionLevel`. A node without father is a
//! root. Each node becomes a unit whose `FilePlanPosition` is its cote.

use crate::common::{Error, ProgressLogger, Result};
use crate::inout::{ImportOutcome, Importer};
use std::path::PathBuf;

/// Imports a classification tree CSV file.
#[derive(Debug, Clone)]
#[cfg_attr(not(feature = "csv"), allow(dead_code))]
pub struct CsvTreeToDataObjectPackageImporter {
    path: PathBuf,
    charset: String,
    delimiter: char,
}

impl CsvTreeToDataObjectPackageImporter {
    pub fn new(path: impl Into<PathBuf>, charset: &str, delimiter: char) -> Self {
        Self {
            path: path.into(),
            charset: charset.to_string(),
            delimiter,
        }
    }
}

#[cfg(not(feature = "csv"))]
impl Importer for CsvTreeToDataObjectPackageImporter {
    fn do_import(&mut self, _progress: &ProgressLogger) -> Result<ImportOutcome> {
        Err(Error::FeatureDisabled("csv".to_string()))
    }
}

#[cfg(feature = "csv")]
impl Importer for CsvTreeToDataObjectPackageImporter {
    fn do_import(&mut self, progress: &ProgressLogger) -> Result<ImportOutcome> {
        use crate::common::ProgressLevel;
        use crate::core::{ArchiveUnit, DataObjectPackage};
        use crate::inout::csv_source::{field, read_csv_table};
        use std::collections::HashMap;

        progress.progress_log(
            ProgressLevel::Global,
            &format!("Import of the classification tree [{}]", self.path.display()),
        )?;
        let table = read_csv_table(&self.path, &self.charset, self.delimiter)?;
        // Positional columns, the header only names them
        let (cote_col, title_col, father_col, level_col) = (Some(0), Some(1), Some(2), Some(3));

        let mut package = DataObjectPackage::new();
        let mut ids_by_cote: HashMap<String, String> = HashMap::new();
        let mut nodes = Vec::with_capacity(table.records.len());
        for (count, (line, record)) in table.records.iter().enumerate() {
            let cote = field(record, cote_col);
            if cote.is_empty() {
                return Err(Error::MalformedDocument(format!("Line {}: empty cote", line)));
            }
            if ids_by_cote.contains_key(cote) {
                return Err(Error::MalformedDocument(format!("Line {}: duplicate cote [{}]", line, cote)));
            }
            let id = package.next_id();
            let mut unit = ArchiveUnit::new(&id);
            let level = match field(record, level_col) {
                "" => "RecordGrp",
                level => level,
            };
            let fill = |unit: &mut ArchiveUnit| -> Result<()> {
                unit.content.add_new_metadata("DescriptionLevel", level)?;
                unit.content.add_new_metadata("Title", field(record, title_col))?;
                unit.content.add_new_metadata("FilePlanPosition", cote)?;
                Ok(())
            };
            fill(&mut unit).map_err(|e| e.context(&format!("Line {}", line)))?;
            package.add_archive_unit(unit)?;
            ids_by_cote.insert(cote.to_string(), id.clone());
            nodes.push((*line, id, field(record, father_col).to_string()));
            progress.progress_log_if_step(
                ProgressLevel::ObjectsGroup,
                count as u64 + 1,
                &format!("{} tree nodes imported", count + 1),
            )?;
        }

        for (line, id, father) in nodes {
            if father.is_empty() {
                package.add_root_unit_id(&id);
                continue;
            }
            let father_id = ids_by_cote.get(&father).ok_or_else(|| {
                Error::MalformedDocument(format!("Line {}: unknown father cote [{}]", line, father))
            })?;
            if let Some(father_unit) = package.archive_unit_mut(father_id) {
                father_unit.add_child(&id);
            }
        }

        let summary = format!("Classification tree import: {}", package.description());
        progress.progress_log(ProgressLevel::Step, &summary)?;
        Ok(ImportOutcome {
            package,
            global_metadata: None,
            summary,
        })
    }
}
