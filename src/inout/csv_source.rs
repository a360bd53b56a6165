//! Reading of CSV sources in any charset.

use crate::common::{Error, Result};
use encoding_rs::Encoding;
use std::path::Path;

/// Header and records of a CSV file.
pub(crate) struct CsvTable {
    pub headers: Vec<String>,
    /// Records with their 1-based line number in the file
    pub records: Vec<(u64, Vec<String>)>,
}

impl CsvTable {
    /// Index of column `name`, matched without surrounding blanks.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Decode `path` from `charset` and split it on `delimiter`.
pub(crate) fn read_csv_table(path: &Path, charset: &str, delimiter: char) -> Result<CsvTable> {
    let encoding = Encoding::for_label(charset.trim().as_bytes())
        .ok_or_else(|| Error::Config(format!("Unknown charset {}", charset)))?;
    if !delimiter.is_ascii() {
        return Err(Error::Config(format!("CSV delimiter {:?} must be ASCII", delimiter)));
    }
    let bytes = std::fs::read(path)?;
    let (text, _, had_errors) = encoding.decode(&bytes);
    if had_errors {
        tracing::warn!(path = %path.display(), charset, "Undecodable bytes replaced in CSV file");
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let fields: Vec<String> = record.iter().map(|f| f.trim().to_string()).collect();
        if fields.iter().all(String::is_empty) {
            continue;
        }
        records.push((line, fields));
    }
    Ok(CsvTable { headers, records })
}

/// Field `index` of a record, empty when the record is short.
pub(crate) fn field(record: &[String], index: Option<usize>) -> &str {
    index.and_then(|i| record.get(i)).map(String::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_semicolon() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.csv");
        // "Série" in windows-1252
        std::fs::write(&path, b"Cote;Title\nA;S\xe9rie\n;\n").unwrap();
        let table = read_csv_table(&path, "windows-1252", ';').unwrap();
        assert_eq!(table.headers, ["Cote", "Title"]);
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].0, 2);
        assert_eq!(table.records[0].1, ["A", "Série"]);
        assert_eq!(table.column("Title"), Some(1));
    }

    #[test]
    fn test_unknown_charset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.csv");
        std::fs::write(&path, "a\n").unwrap();
        assert!(matches!(read_csv_table(&path, "klingon", ';'), Err(Error::Config(_))));
    }
}
