//! Binary objects built from files on disk.

use crate::common::Result;
use crate::core::{BinaryDataObject, MessageDigest};
use crate::metadata::{ComplexListType, DateTimeType, DateTimeValue, SedaMetadata};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha512};
use std::fs::File;
use std::path::Path;

/// Version given to files that don't name one.
pub const DEFAULT_DATA_OBJECT_VERSION: &str = "BinaryMaster_1";

/// Digest algorithm of imported files.
pub const DIGEST_ALGORITHM: &str = "SHA-512";

/// Lower-case hexadecimal SHA-512 of a file.
pub fn sha512_hex(path: &Path) -> Result<String> {
    let mut hasher = Sha512::new();
    let mut file = File::open(path)?;
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect())
}

/// Binary object describing `path`, with size, digest and `FileInfo`.
///
/// `filename` is the name recorded in `FileInfo`, which differs from the
/// file name when a usage prefix was stripped.
pub fn binary_data_object_from_file(id: &str, path: &Path, version: &str, filename: &str) -> Result<BinaryDataObject> {
    let metadata = std::fs::metadata(path)?;
    let mut bdo = BinaryDataObject::new(id);
    bdo.data_object_version = Some(version.to_string());
    bdo.size = Some(metadata.len());
    bdo.message_digest = Some(MessageDigest {
        value: sha512_hex(path)?,
        algorithm: DIGEST_ALGORITHM.to_string(),
    });

    let mut file_info = ComplexListType::new("FileInfo")?;
    file_info.add_new_metadata("Filename", filename)?;
    if let Ok(modified) = metadata.modified() {
        let modified: DateTime<Utc> = modified.into();
        file_info.add_metadata(SedaMetadata::DateTime(DateTimeType::new(
            "LastModified",
            DateTimeValue::Zoned(modified.fixed_offset()),
        )))?;
    }
    bdo.file_info = Some(file_info);
    bdo.on_disk_path = Some(path.to_path_buf());
    Ok(bdo)
}

/// Split a `__<Usage>_<n>__name` file name into its version and name.
///
/// Returns `None` for names without a well-formed prefix.
pub fn split_usage_prefix(file_name: &str) -> Option<(&str, &str)> {
    let rest = file_name.strip_prefix("__")?;
    let end = memchr::memmem::find(rest.as_bytes(), b"__")?;
    let version = &rest[..end];
    let name = &rest[end + 2..];
    let (usage, number) = version.rsplit_once('_')?;
    let well_formed = !usage.is_empty()
        && !number.is_empty()
        && number.bytes().all(|b| b.is_ascii_digit())
        && usage.bytes().all(|b| b.is_ascii_alphanumeric())
        && !name.is_empty();
    well_formed.then_some((version, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_split_usage_prefix() {
        assert_eq!(
            split_usage_prefix("__BinaryMaster_1__scan.pdf"),
            Some(("BinaryMaster_1", "scan.pdf"))
        );
        assert_eq!(
            split_usage_prefix("__TextContent_12__scan.txt"),
            Some(("TextContent_12", "scan.txt"))
        );
        assert_eq!(split_usage_prefix("__ArchiveUnitMetadata.xml"), None);
        assert_eq!(split_usage_prefix("__BinaryMaster__x"), None);
        assert_eq!(split_usage_prefix("__BinaryMaster_1__"), None);
        assert_eq!(split_usage_prefix("report.pdf"), None);
    }

    #[test]
    fn test_sha512_hex_of_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        File::create(&path).unwrap();
        assert_eq!(
            sha512_hex(&path).unwrap(),
            "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
             47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e"
        );
    }

    #[test]
    fn test_binary_data_object_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"hello").unwrap();
        drop(file);

        let bdo = binary_data_object_from_file("ID7", &path, DEFAULT_DATA_OBJECT_VERSION, "hello.txt").unwrap();
        assert_eq!(bdo.size, Some(5));
        let digest = bdo.message_digest.as_ref().unwrap();
        assert_eq!(digest.algorithm, "SHA-512");
        assert!(digest.value.starts_with("9b71d224bd62f378"));
        assert_eq!(digest.value.len(), 128);
        let file_info = bdo.file_info.as_ref().unwrap();
        assert_eq!(file_info.first_value("Filename").as_deref(), Some("hello.txt"));
        assert!(file_info.get_first("LastModified").is_some());
    }
}
