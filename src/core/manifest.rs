//! SEDA manifests: `ArchiveTransfer` (SIP) and `ArchiveDeliveryRequestReply`
//! (DIP).
//!
//! Both roots wrap a [`DataObjectPackage`] between header and trailer
//! elements. The header and trailer are kept in [`GlobalMetadata`], the
//! `CodeListVersions` block verbatim. Reading accepts the root children in
//! any order and skips unknown ones with a warning; writing emits them in
//! schema order.

use crate::common::{Error, ProgressLevel, ProgressLogger, Result};
use crate::core::archive_unit::{ArchiveUnit, ArchiveUnitWriteState, write_archive_unit_by_id};
use crate::core::data_object::{BinaryDataObject, DataObjectGroup, PhysicalDataObject};
use crate::core::package::DataObjectPackage;
use crate::core::{ParseOutcome, SedaXmlFragments};
use crate::xml::{STANDARD_INDENT, SedaXmlEventReader, SedaXmlStreamWriter, write_to_string};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// SEDA 2.1 namespace.
pub const SEDA_NAMESPACE: &str = "fr:gouv:culture:archivesdefrance:seda:v2.1";

const ROOT_NAMESPACES: &[(&str, &str)] = &[
    ("xmlns", SEDA_NAMESPACE),
    ("xmlns:xlink", "http://www.w3.org/1999/xlink"),
    ("xmlns:pr", "info:lc/xmlns/premis-v2"),
    ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
    (
        "xsi:schemaLocation",
        "fr:gouv:culture:archivesdefrance:seda:v2.1 seda-2.1-main.xsd",
    ),
];

/// Header and trailer of a manifest.
///
/// Fields that only exist in one of the two roots are ignored when writing
/// the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalMetadata {
    pub comments: Vec<String>,
    pub date: Option<String>,
    pub message_identifier: Option<String>,
    pub archival_agreement: Option<String>,
    /// Verbatim `CodeListVersions` block
    pub code_list_versions_xml: Option<String>,
    pub archival_agency_identifier: Option<String>,

    // ArchiveTransfer only
    pub transfer_request_reply_identifier: Option<String>,
    pub transferring_agency_identifier: Option<String>,

    // ArchiveDeliveryRequestReply only
    pub reply_code: Option<String>,
    pub message_request_identifier: Option<String>,
    pub requester_identifier: Option<String>,
}

impl GlobalMetadata {
    /// Read the header or trailer element `name` at the reader position.
    ///
    /// Returns `false` without consuming anything for other elements.
    fn read_element<R: BufRead>(&mut self, reader: &mut SedaXmlEventReader<R>, name: &str) -> Result<bool> {
        match name {
            "Comment" => {
                if let Some(comment) = reader.next_value_if_named(name)? {
                    self.comments.push(comment);
                }
            },
            "Date" => self.date = reader.next_value_if_named(name)?,
            "MessageIdentifier" => self.message_identifier = reader.next_value_if_named(name)?,
            "ArchivalAgreement" => self.archival_agreement = reader.next_value_if_named(name)?,
            "CodeListVersions" => self.code_list_versions_xml = Some(reader.next_block_as_string()?),
            "TransferRequestReplyIdentifier" => {
                self.transfer_request_reply_identifier = reader.next_value_if_named(name)?
            },
            "ReplyCode" => self.reply_code = reader.next_value_if_named(name)?,
            "MessageRequestIdentifier" => self.message_request_identifier = reader.next_value_if_named(name)?,
            "ArchivalAgency" => self.archival_agency_identifier = read_agency_identifier(reader, name)?,
            "TransferringAgency" => self.transferring_agency_identifier = read_agency_identifier(reader, name)?,
            "Requester" => self.requester_identifier = read_agency_identifier(reader, name)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl SedaXmlFragments for GlobalMetadata {
    /// Every present field, in ArchiveTransfer order then reply fields.
    fn to_seda_xml_fragments(&self) -> Result<String> {
        write_to_string(Some(STANDARD_INDENT), |w| {
            for comment in &self.comments {
                w.write_element_value("Comment", comment)?;
            }
            w.write_element_value_if_not_empty("Date", self.date.as_deref())?;
            w.write_element_value_if_not_empty("MessageIdentifier", self.message_identifier.as_deref())?;
            w.write_element_value_if_not_empty("ArchivalAgreement", self.archival_agreement.as_deref())?;
            w.write_raw_xml_block_if_not_empty(self.code_list_versions_xml.as_deref())?;
            w.write_element_value_if_not_empty(
                "TransferRequestReplyIdentifier",
                self.transfer_request_reply_identifier.as_deref(),
            )?;
            w.write_element_value_if_not_empty("ReplyCode", self.reply_code.as_deref())?;
            w.write_element_value_if_not_empty(
                "MessageRequestIdentifier",
                self.message_request_identifier.as_deref(),
            )?;
            for (name, identifier) in [
                ("ArchivalAgency", &self.archival_agency_identifier),
                ("TransferringAgency", &self.transferring_agency_identifier),
                ("Requester", &self.requester_identifier),
            ] {
                if identifier.is_some() {
                    write_agency(w, name, identifier.as_deref())?;
                }
            }
            Ok(())
        })
    }

    fn from_seda_xml_fragments(&mut self, fragments: &str) -> Result<()> {
        let mut reader = SedaXmlEventReader::from_str(fragments);
        let mut parsed = GlobalMetadata::default();
        while let Some(name) = reader.peek_name()? {
            if !parsed.read_element(&mut reader, &name)? {
                return Err(Error::MalformedDocument(format!(
                    "Unexpected <{}> in global metadata fragments",
                    name
                )));
            }
        }
        if !reader.at_end()? {
            return Err(Error::MalformedDocument(
                "Unexpected content in global metadata fragments".to_string(),
            ));
        }
        *self = parsed;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManifestKind {
    Transfer,
    DeliveryReply,
}

impl ManifestKind {
    fn root_name(self) -> &'static str {
        match self {
            ManifestKind::Transfer => "ArchiveTransfer",
            ManifestKind::DeliveryReply => "ArchiveDeliveryRequestReply",
        }
    }
}

/// A SIP manifest.
#[derive(Debug, Clone, Default)]
pub struct ArchiveTransfer {
    pub global_metadata: GlobalMetadata,
    pub package: DataObjectPackage,
}

impl ArchiveTransfer {
    pub fn new(global_metadata: GlobalMetadata, package: DataObjectPackage) -> Self {
        Self {
            global_metadata,
            package,
        }
    }

    /// Read a manifest whose binary payloads live under `root_dir`.
    pub fn from_seda_xml<R: BufRead>(
        reader: &mut SedaXmlEventReader<R>,
        root_dir: &Path,
        progress: &ProgressLogger,
    ) -> Result<Self> {
        let (global_metadata, package) = read_manifest(reader, ManifestKind::Transfer, root_dir, progress)?;
        Ok(Self {
            global_metadata,
            package,
        })
    }

    pub fn from_xml_str(xml: &str, root_dir: &Path, progress: &ProgressLogger) -> Result<Self> {
        Self::from_seda_xml(&mut SedaXmlEventReader::from_str(xml), root_dir, progress)
    }

    /// Read a manifest file, payloads being relative to its directory.
    pub fn from_file(path: &Path, progress: &ProgressLogger) -> Result<Self> {
        let root_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut reader = SedaXmlEventReader::from_reader(BufReader::new(File::open(path)?));
        Self::from_seda_xml(&mut reader, root_dir, progress)
    }

    pub fn to_seda_xml<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>, progress: &ProgressLogger) -> Result<()> {
        write_manifest(writer, ManifestKind::Transfer, &self.global_metadata, &self.package, progress)
    }

    /// Indented manifest text.
    pub fn to_xml_string(&self, progress: &ProgressLogger) -> Result<String> {
        let mut writer = SedaXmlStreamWriter::indented(Vec::new(), STANDARD_INDENT);
        self.to_seda_xml(&mut writer, progress)?;
        String::from_utf8(writer.into_inner()?).map_err(|e| Error::XmlError(e.to_string()))
    }

    pub fn to_file(&self, path: &Path, progress: &ProgressLogger) -> Result<()> {
        let mut writer = SedaXmlStreamWriter::indented(BufWriter::new(File::create(path)?), STANDARD_INDENT);
        self.to_seda_xml(&mut writer, progress)?;
        writer.into_inner()?.flush()?;
        Ok(())
    }
}

/// A DIP manifest.
#[derive(Debug, Clone, Default)]
pub struct ArchiveDeliveryRequestReply {
    pub global_metadata: GlobalMetadata,
    pub package: DataObjectPackage,
}

impl ArchiveDeliveryRequestReply {
    pub fn new(global_metadata: GlobalMetadata, package: DataObjectPackage) -> Self {
        Self {
            global_metadata,
            package,
        }
    }

    pub fn from_seda_xml<R: BufRead>(
        reader: &mut SedaXmlEventReader<R>,
        root_dir: &Path,
        progress: &ProgressLogger,
    ) -> Result<Self> {
        let (global_metadata, package) = read_manifest(reader, ManifestKind::DeliveryReply, root_dir, progress)?;
        Ok(Self {
            global_metadata,
            package,
        })
    }

    pub fn from_xml_str(xml: &str, root_dir: &Path, progress: &ProgressLogger) -> Result<Self> {
        Self::from_seda_xml(&mut SedaXmlEventReader::from_str(xml), root_dir, progress)
    }

    pub fn from_file(path: &Path, progress: &ProgressLogger) -> Result<Self> {
        let root_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut reader = SedaXmlEventReader::from_reader(BufReader::new(File::open(path)?));
        Self::from_seda_xml(&mut reader, root_dir, progress)
    }

    pub fn to_seda_xml<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>, progress: &ProgressLogger) -> Result<()> {
        write_manifest(
            writer,
            ManifestKind::DeliveryReply,
            &self.global_metadata,
            &self.package,
            progress,
        )
    }

    pub fn to_xml_string(&self, progress: &ProgressLogger) -> Result<String> {
        let mut writer = SedaXmlStreamWriter::indented(Vec::new(), STANDARD_INDENT);
        self.to_seda_xml(&mut writer, progress)?;
        String::from_utf8(writer.into_inner()?).map_err(|e| Error::XmlError(e.to_string()))
    }
}

fn read_manifest<R: BufRead>(
    reader: &mut SedaXmlEventReader<R>,
    kind: ManifestKind,
    root_dir: &Path,
    progress: &ProgressLogger,
) -> Result<(GlobalMetadata, DataObjectPackage)> {
    let root = kind.root_name();
    progress.progress_log(ProgressLevel::Step, &format!("Reading {}", root))?;
    reader
        .start_block_named(root)
        .map_err(|e| e.context(&format!("Error reading {}", root)))?;

    let mut metadata = GlobalMetadata::default();
    let mut package = DataObjectPackage::new();
    while let Some(name) = reader.peek_name()? {
        if metadata.read_element(reader, &name)? {
            continue;
        }
        if name == "DataObjectPackage" {
            read_data_object_package(reader, &mut package, root_dir, progress)
                .map_err(|e| e.context("Error reading DataObjectPackage"))?;
        } else {
            tracing::warn!(element = %name, manifest = root, "Unknown manifest element skipped");
            reader.skip_block()?;
        }
    }
    reader
        .end_block_named(root)
        .map_err(|e| e.context(&format!("Error reading {}", root)))?;

    progress.progress_log(
        ProgressLevel::Step,
        &format!("{} read: {}", root, package.description()),
    )?;
    Ok((metadata, package))
}

/// Identifier of an agency block, other agency children are skipped.
fn read_agency_identifier<R: BufRead>(reader: &mut SedaXmlEventReader<R>, name: &str) -> Result<Option<String>> {
    reader.start_block_named(name)?;
    let mut identifier = None;
    while let Some(child) = reader.peek_name()? {
        if child == "Identifier" && identifier.is_none() {
            identifier = reader.next_value_if_named("Identifier")?;
        } else {
            reader.skip_block()?;
        }
    }
    reader.end_block_named(name)?;
    Ok(identifier)
}

fn read_data_object_package<R: BufRead>(
    reader: &mut SedaXmlEventReader<R>,
    package: &mut DataObjectPackage,
    root_dir: &Path,
    progress: &ProgressLogger,
) -> Result<()> {
    reader.start_block_named("DataObjectPackage")?;
    let mut count = 0u64;
    loop {
        if DataObjectGroup::id_from_seda_xml(reader, package, root_dir)?.is_present() {
            count += 1;
        } else {
            match reader.peek_name()?.as_deref() {
                Some("BinaryDataObject") => {
                    let mut bdo = BinaryDataObject::from_seda_xml(reader)?;
                    bdo.set_on_disk_path_from_root(root_dir)?;
                    package.add_pending_binary_data_object(bdo)?;
                },
                Some("PhysicalDataObject") => {
                    let pdo = PhysicalDataObject::from_seda_xml(reader)?;
                    package.add_pending_physical_data_object(pdo)?;
                },
                _ => break,
            }
            count += 1;
        }
        progress.progress_log_if_step(
            ProgressLevel::ObjectsGroup,
            count,
            &format!("{} data objects or groups read", count),
        )?;
    }

    if reader.next_block_if_named("DescriptiveMetadata")? {
        while let ParseOutcome::Ok(id) = ArchiveUnit::id_from_seda_xml(reader, package, progress)? {
            package.add_root_unit_id(&id);
        }
        reader.end_block_named("DescriptiveMetadata")?;
    }
    package.set_management_metadata_xml(reader.next_block_as_string_if_named("ManagementMetadata")?);
    reader.end_block_named("DataObjectPackage")
}

fn write_agency<W: Write>(writer: &mut SedaXmlStreamWriter<W>, name: &str, identifier: Option<&str>) -> Result<()> {
    writer.write_start_element(name)?;
    writer.write_element_value("Identifier", identifier.unwrap_or_default())?;
    writer.write_end_element()
}

fn write_manifest<W: Write>(
    writer: &mut SedaXmlStreamWriter<W>,
    kind: ManifestKind,
    metadata: &GlobalMetadata,
    package: &DataObjectPackage,
    progress: &ProgressLogger,
) -> Result<()> {
    let root = kind.root_name();
    progress.progress_log(ProgressLevel::Step, &format!("Writing {}", root))?;
    writer.write_start_document()?;
    writer.write_start_element(root)?;
    for (key, value) in ROOT_NAMESPACES {
        writer.write_attribute(key, value)?;
    }

    for comment in &metadata.comments {
        writer.write_element_value("Comment", comment)?;
    }
    let date = match &metadata.date {
        Some(date) => date.clone(),
        None => chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
    };
    writer.write_element_value("Date", &date)?;
    writer.write_element_value("MessageIdentifier", metadata.message_identifier.as_deref().unwrap_or_default())?;
    writer.write_element_value_if_not_empty("ArchivalAgreement", metadata.archival_agreement.as_deref())?;
    match &metadata.code_list_versions_xml {
        Some(xml) => writer.write_raw_xml_block_if_not_empty(Some(xml.as_str()))?,
        None => {
            writer.write_start_element("CodeListVersions")?;
            writer.write_end_element()?;
        },
    }
    if kind == ManifestKind::Transfer {
        writer.write_element_value_if_not_empty(
            "TransferRequestReplyIdentifier",
            metadata.transfer_request_reply_identifier.as_deref(),
        )?;
    }

    write_data_object_package(writer, package, progress).map_err(|e| e.context("Error writing DataObjectPackage"))?;

    match kind {
        ManifestKind::Transfer => {
            write_agency(writer, "ArchivalAgency", metadata.archival_agency_identifier.as_deref())?;
            write_agency(writer, "TransferringAgency", metadata.transferring_agency_identifier.as_deref())?;
        },
        ManifestKind::DeliveryReply => {
            writer.write_element_value("ReplyCode", metadata.reply_code.as_deref().unwrap_or_default())?;
            writer.write_element_value_if_not_empty(
                "MessageRequestIdentifier",
                metadata.message_request_identifier.as_deref(),
            )?;
            write_agency(writer, "ArchivalAgency", metadata.archival_agency_identifier.as_deref())?;
            write_agency(writer, "Requester", metadata.requester_identifier.as_deref())?;
        },
    }
    writer.write_end_element()?;
    writer.write_end_document()?;
    progress.progress_log(ProgressLevel::Step, &format!("{} written", root))
}

fn write_data_object_package<W: Write>(
    writer: &mut SedaXmlStreamWriter<W>,
    package: &DataObjectPackage,
    progress: &ProgressLogger,
) -> Result<()> {
    writer.write_start_element("DataObjectPackage")?;
    let mut count = 0u64;
    for group in package.data_object_groups() {
        group.to_seda_xml(writer)?;
        count += 1;
        progress.progress_log_if_step(
            ProgressLevel::ObjectsGroup,
            count,
            &format!("{} DataObjectGroups exported", count),
        )?;
    }
    for bdo in package.pending_binary_data_objects() {
        bdo.to_seda_xml(writer)?;
    }
    for pdo in package.pending_physical_data_objects() {
        pdo.to_seda_xml(writer)?;
    }

    writer.write_start_element("DescriptiveMetadata")?;
    let mut state = ArchiveUnitWriteState::new();
    for root in package.root_unit_ids() {
        write_archive_unit_by_id(writer, package, root, &mut state, progress)?;
    }
    writer.write_end_element()?;

    match package.management_metadata_xml() {
        Some(xml) if !xml.trim().is_empty() => writer.write_raw_xml_block_if_not_empty(Some(xml))?,
        _ => {
            writer.write_start_element("ManagementMetadata")?;
            writer.write_end_element()?;
        },
    }
    writer.write_end_element()
}
