//! SIP and DIP ZIP containers.
//!
//! A container holds a `manifest.xml` at its root and the payload files at
//! the paths given by the binary objects `Uri`. Import extracts the container
//! into a target directory and reads the manifest from there.

use crate::common::{Error, ProgressLogger, Result};
use crate::core::{DataObjectPackage, GlobalMetadata};
use crate::inout::{ImportOutcome, Importer};
use std::path::{Path, PathBuf};

/// Name of the manifest inside a container.
pub const MANIFEST_NAME: &str = "manifest.xml";

/// Directory of the payload files inside exported containers.
pub const CONTENT_DIR: &str = "content";

/// Imports a SIP container.
#[derive(Debug, Clone)]
pub struct SipToArchiveTransferImporter {
    source: PathBuf,
    target: PathBuf,
}

impl SipToArchiveTransferImporter {
    /// Importer of `source` extracting into `target`.
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Imports a DIP container.
#[derive(Debug, Clone)]
pub struct DipToArchiveDeliveryRequestReplyImporter {
    source: PathBuf,
    target: PathBuf,
}

impl DipToArchiveDeliveryRequestReplyImporter {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Writes a package as a SIP container.
///
/// The package must be normalized. Binary objects get `content/<id>.<ext>`
/// URIs in the written manifest; the package itself is left untouched.
#[derive(Debug)]
pub struct SipExporter<'a> {
    package: &'a DataObjectPackage,
    global_metadata: &'a GlobalMetadata,
}

impl<'a> SipExporter<'a> {
    pub fn new(package: &'a DataObjectPackage, global_metadata: &'a GlobalMetadata) -> Self {
        Self {
            package,
            global_metadata,
        }
    }
}

/// Manifest at the root of an extracted container, matched case-insensitively.
fn find_manifest(dir: &Path) -> Result<PathBuf> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() && entry.file_name().to_string_lossy().eq_ignore_ascii_case(MANIFEST_NAME) {
            return Ok(entry.path());
        }
    }
    Err(Error::MalformedDocument(format!(
        "No {} at the root of [{}]",
        MANIFEST_NAME,
        dir.display()
    )))
}

#[cfg(feature = "container")]
mod zip_impl {
    use super::*;
    use crate::common::ProgressLevel;
    use crate::core::{ArchiveDeliveryRequestReply, ArchiveTransfer};
    use std::fs::{self, File};
    use std::io::{self, BufReader, BufWriter, Write};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipArchive, ZipWriter};

    /// Extract `source` under `target`, skipping entries escaping it.
    pub(super) fn extract_container(source: &Path, target: &Path, progress: &ProgressLogger) -> Result<u64> {
        progress.progress_log(
            ProgressLevel::Step,
            &format!("Extracting [{}] into [{}]", source.display(), target.display()),
        )?;
        let mut archive = ZipArchive::new(BufReader::new(File::open(source)?))?;
        fs::create_dir_all(target)?;
        let mut extracted = 0u64;
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let Some(relative) = entry.enclosed_name() else {
                tracing::warn!(entry = entry.name(), "Container entry outside of the target skipped");
                continue;
            };
            let path = target.join(relative);
            if entry.is_dir() {
                fs::create_dir_all(&path)?;
                continue;
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = BufWriter::new(File::create(&path)?);
            io::copy(&mut entry, &mut out)?;
            out.flush()?;
            extracted += 1;
            progress.progress_log_if_step(
                ProgressLevel::ObjectsGroup,
                extracted,
                &format!("{} files extracted", extracted),
            )?;
        }
        Ok(extracted)
    }

    impl Importer for SipToArchiveTransferImporter {
        fn do_import(&mut self, progress: &ProgressLogger) -> Result<ImportOutcome> {
            progress.progress_log(
                ProgressLevel::Global,
                &format!("Import of the SIP [{}]", self.source.display()),
            )?;
            let files = extract_container(&self.source, &self.target, progress)?;
            let manifest = find_manifest(&self.target)?;
            let transfer = ArchiveTransfer::from_file(&manifest, progress)?;
            let summary = format!(
                "SIP import: {} files extracted, {}",
                files,
                transfer.package.description()
            );
            progress.progress_log(ProgressLevel::Step, &summary)?;
            Ok(ImportOutcome {
                package: transfer.package,
                global_metadata: Some(transfer.global_metadata),
                summary,
            })
        }
    }

    impl Importer for DipToArchiveDeliveryRequestReplyImporter {
        fn do_import(&mut self, progress: &ProgressLogger) -> Result<ImportOutcome> {
            progress.progress_log(
                ProgressLevel::Global,
                &format!("Import of the DIP [{}]", self.source.display()),
            )?;
            let files = extract_container(&self.source, &self.target, progress)?;
            let manifest = find_manifest(&self.target)?;
            let reply = ArchiveDeliveryRequestReply::from_file(&manifest, progress)?;
            let summary = format!(
                "DIP import: {} files extracted, {}",
                files,
                reply.package.description()
            );
            progress.progress_log(ProgressLevel::Step, &summary)?;
            Ok(ImportOutcome {
                package: reply.package,
                global_metadata: Some(reply.global_metadata),
                summary,
            })
        }
    }

    impl SipExporter<'_> {
        /// Write the container to `path`, returning a summary line.
        pub fn export(&self, path: &Path, progress: &ProgressLogger) -> Result<String> {
            let source = self.package;
            if !source.pending_binary_data_objects().is_empty() || !source.pending_physical_data_objects().is_empty()
            {
                return Err(Error::Other("The package must be normalized before export".to_string()));
            }
            progress.progress_log(ProgressLevel::Global, &format!("Export of the SIP [{}]", path.display()))?;

            let mut package = source.clone();
            let group_ids: Vec<String> = package.data_object_groups().iter().map(|g| g.id().to_string()).collect();
            let mut payloads = Vec::new();
            for group_id in &group_ids {
                let Some(group) = package.data_object_group_mut(group_id) else {
                    continue;
                };
                for bdo in group.binary_data_objects_mut() {
                    let Some(on_disk) = bdo.on_disk_path.clone() else {
                        continue;
                    };
                    let uri = match on_disk.extension() {
                        Some(ext) => format!("{}/{}.{}", CONTENT_DIR, bdo.id(), ext.to_string_lossy()),
                        None => format!("{}/{}", CONTENT_DIR, bdo.id()),
                    };
                    bdo.uri = Some(uri.clone());
                    payloads.push((uri, on_disk));
                }
            }
            let transfer = ArchiveTransfer::new(self.global_metadata.clone(), package);
            let manifest = transfer.to_xml_string(progress)?;

            let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            let mut zip = ZipWriter::new(BufWriter::new(File::create(path)?));
            zip.start_file(MANIFEST_NAME, options)?;
            zip.write_all(manifest.as_bytes())?;
            for (count, (uri, on_disk)) in payloads.iter().enumerate() {
                zip.start_file(uri.as_str(), options)?;
                let mut payload = File::open(on_disk)?;
                io::copy(&mut payload, &mut zip)?;
                progress.progress_log_if_step(
                    ProgressLevel::ObjectsGroup,
                    count as u64 + 1,
                    &format!("{} files exported", count + 1),
                )?;
            }
            zip.finish()?.flush()?;

            let summary = format!(
                "SIP export: {} payload files, {}",
                payloads.len(),
                transfer.package.description()
            );
            progress.progress_log(ProgressLevel::Step, &summary)?;
            Ok(summary)
        }
    }
}

#[cfg(not(feature = "container"))]
mod disabled {
    use super::*;

    impl Importer for SipToArchiveTransferImporter {
        fn do_import(&mut self, _progress: &ProgressLogger) -> Result<ImportOutcome> {
            let _ = (&self.source, &self.target, find_manifest);
            Err(Error::FeatureDisabled("container".to_string()))
        }
    }

    impl Importer for DipToArchiveDeliveryRequestReplyImporter {
        fn do_import(&mut self, _progress: &ProgressLogger) -> Result<ImportOutcome> {
            let _ = (&self.source, &self.target);
            Err(Error::FeatureDisabled("container".to_string()))
        }
    }

    impl SipExporter<'_> {
        pub fn export(&self, _path: &Path, _progress: &ProgressLogger) -> Result<String> {
            let _ = (self.package, self.global_metadata);
            Err(Error::FeatureDisabled("container".to_string()))
        }
    }
}

#[cfg(all(test, feature = "container"))]
mod tests {
    use super::*;
    use crate::core::vitam_normalize;
    use crate::inout::DiskToArchiveTransferImporter;

    #[test]
    fn test_export_then_import() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("tree");
        std::fs::create_dir_all(tree.join("folder")).unwrap();
        std::fs::write(tree.join("folder/report.pdf"), "pdf content").unwrap();
        std::fs::write(tree.join("notes"), "no extension").unwrap();

        let progress = ProgressLogger::silent();
        let mut outcome = DiskToArchiveTransferImporter::from_path(&tree).do_import(&progress).unwrap();
        vitam_normalize(&mut outcome.package, &progress).unwrap();
        let metadata = GlobalMetadata {
            message_identifier: Some("MSG-9".to_string()),
            date: Some("2024-01-01T00:00:00".to_string()),
            ..Default::default()
        };
        let sip = dir.path().join("sip.zip");
        let summary = SipExporter::new(&outcome.package, &metadata).export(&sip, &progress).unwrap();
        assert!(summary.contains("2 payload files"));
        // The exported package keeps its on-disk paths and no URI
        let group = outcome.package.data_object_groups()[0];
        assert!(group.binary_data_objects()[0].uri.is_none());

        let target = dir.path().join("sip-tmpdir");
        let imported = SipToArchiveTransferImporter::new(&sip, &target).do_import(&progress).unwrap();
        assert_eq!(
            imported.global_metadata.unwrap().message_identifier.as_deref(),
            Some("MSG-9")
        );
        assert_eq!(imported.package.description(), outcome.package.description());
        for group in imported.package.data_object_groups() {
            let bdo = &group.binary_data_objects()[0];
            let uri = bdo.uri.as_deref().unwrap();
            assert!(uri.starts_with("content/"));
            assert!(bdo.on_disk_path.as_ref().unwrap().is_file());
        }
        assert!(target.join("content").is_dir());
    }

    #[test]
    fn test_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("empty.zip");
        let mut zip = zip::ZipWriter::new(std::fs::File::create(&zip_path).unwrap());
        zip.start_file("readme.txt", zip::write::SimpleFileOptions::default()).unwrap();
        std::io::Write::write_all(&mut zip, b"no manifest").unwrap();
        zip.finish().unwrap();

        let err = SipToArchiveTransferImporter::new(&zip_path, dir.path().join("out"))
            .do_import(&ProgressLogger::silent())
            .unwrap_err();
        assert!(err.to_string().contains("No manifest.xml"));
    }
}
