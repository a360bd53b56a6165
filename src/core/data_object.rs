//! Content side of a package: binary objects, physical objects and the
//! groups owning them.
//!
//! A [`DataObjectGroup`] owns its objects. Each object keeps the identifier
//! of its group as a plain handle, set when it is attached.

use crate::common::{Error, Result};
use crate::core::package::DataObjectPackage;
use crate::core::{ParseOutcome, SedaXmlFragments};
use crate::metadata::{ComplexListType, SedaMetadata};
use crate::xml::{STANDARD_INDENT, SedaXmlEventReader, SedaXmlStreamWriter, XmlEvent, indent_xml, write_to_string};
use std::io::{BufRead, Write};
use std::path::{Component, Path, PathBuf};

const LOG_BOOK_START: &str = "<LogBook>";
const LOG_BOOK_END: &str = "</LogBook>";
const LOG_BOOK_EMPTY: &str = "<LogBook/>";

/// Digest of a binary object with its algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDigest {
    pub value: String,
    pub algorithm: String,
}

/// A file of the transfer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BinaryDataObject {
    id: String,
    group_id: Option<String>,
    /// SEDA 2.0 reference to an existing group
    pub data_object_group_reference_id: Option<String>,
    /// SEDA 2.0 declaration of a new group
    pub data_object_group_id: Option<String>,
    pub data_object_version: Option<String>,
    pub uri: Option<String>,
    pub message_digest: Option<MessageDigest>,
    pub size: Option<u64>,
    pub format_identification: Option<ComplexListType>,
    pub file_info: Option<ComplexListType>,
    pub metadata_xml: Option<String>,
    pub other_metadata_xml: Option<String>,
    /// Payload file
    pub on_disk_path: Option<PathBuf>,
}

impl BinaryDataObject {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identifier of the owning group, once attached.
    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    pub(crate) fn set_group_id(&mut self, group_id: Option<&str>) {
        self.group_id = group_id.map(str::to_string);
    }

    /// Whether the object uses SEDA 2.0 group linkage.
    pub fn has_legacy_linkage(&self) -> bool {
        self.data_object_group_reference_id.is_some() || self.data_object_group_id.is_some()
    }

    pub(crate) fn clear_legacy_linkage(&mut self) {
        self.data_object_group_reference_id = None;
        self.data_object_group_id = None;
    }

    /// Set the payload path from the manifest directory and the object URI.
    ///
    /// The URI always stays under `root_dir`: a leading separator is dropped
    /// and a `..` component is a [`Error::MalformedDocument`].
    pub fn set_on_disk_path_from_root(&mut self, root_dir: &Path) -> Result<()> {
        self.on_disk_path = match self.uri.as_deref() {
            Some(uri) => Some(path_under_root(root_dir, uri).map_err(|e| {
                e.context(&format!("Error locating BinaryDataObject [{}]", self.id))
            })?),
            None => None,
        };
        Ok(())
    }

    pub fn to_seda_xml<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        writer.write_start_element("BinaryDataObject")?;
        writer.write_attribute("id", &self.id)?;
        writer.write_element_value_if_not_empty(
            "DataObjectGroupReferenceId",
            self.data_object_group_reference_id.as_deref(),
        )?;
        writer.write_element_value_if_not_empty("DataObjectGroupId", self.data_object_group_id.as_deref())?;
        self.write_fields(writer)?;
        writer.write_end_element()
    }

    fn write_fields<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        writer.write_element_value_if_not_empty("DataObjectVersion", self.data_object_version.as_deref())?;
        writer.write_element_value_if_not_empty("Uri", self.uri.as_deref())?;
        if let Some(digest) = &self.message_digest {
            writer.write_start_element("MessageDigest")?;
            writer.write_attribute("algorithm", &digest.algorithm)?;
            writer.write_characters(&digest.value)?;
            writer.write_end_element()?;
        }
        if let Some(size) = self.size {
            let mut buffer = itoa::Buffer::new();
            writer.write_element_value("Size", buffer.format(size))?;
        }
        if let Some(format) = &self.format_identification {
            format.to_seda_xml(writer)?;
        }
        if let Some(file_info) = &self.file_info {
            file_info.to_seda_xml(writer)?;
        }
        writer.write_raw_xml_block_if_not_empty(self.metadata_xml.as_deref())?;
        writer.write_raw_xml_block_if_not_empty(self.other_metadata_xml.as_deref())
    }

    /// Read the fields following the optional legacy linkage.
    fn read_fields<R: BufRead>(&mut self, reader: &mut SedaXmlEventReader<R>) -> Result<()> {
        self.data_object_version = reader.next_value_if_named("DataObjectVersion")?;
        self.uri = reader.next_value_if_named("Uri")?;
        if let Some((attributes, value)) = reader.next_value_with_attributes_if_named("MessageDigest")? {
            let algorithm = attributes
                .iter()
                .find(|(k, _)| k == "algorithm")
                .map(|(_, v)| v.clone())
                .ok_or_else(|| Error::MalformedDocument("MessageDigest without algorithm".to_string()))?;
            self.message_digest = Some(MessageDigest {
                value: value.trim().to_string(),
                algorithm,
            });
        }
        if let Some(size) = reader.next_value_if_named("Size")? {
            let size = size
                .trim()
                .parse()
                .map_err(|_| Error::MalformedDocument(format!("Invalid Size \"{}\"", size)))?;
            self.size = Some(size);
        }
        self.format_identification = read_complex_if_named(reader, "FormatIdentification")?;
        self.file_info = read_complex_if_named(reader, "FileInfo")?;
        self.metadata_xml = reader.next_block_as_string_if_named("Metadata")?;
        self.other_metadata_xml = reader.next_block_as_string_if_named("OtherMetadata")?;
        Ok(())
    }

    /// Read a `BinaryDataObject` element.
    pub fn from_seda_xml<R: BufRead>(reader: &mut SedaXmlEventReader<R>) -> Result<Self> {
        let start = reader.start_block_named("BinaryDataObject")?;
        let id = start
            .attribute("id")
            .ok_or_else(|| Error::MalformedDocument("BinaryDataObject without id".to_string()))?
            .to_string();
        let mut bdo = BinaryDataObject::new(&id);
        bdo.read_body(reader)
            .map_err(|e| e.context(&format!("Error reading BinaryDataObject [{}]", id)))?;
        Ok(bdo)
    }

    fn read_body<R: BufRead>(&mut self, reader: &mut SedaXmlEventReader<R>) -> Result<()> {
        self.data_object_group_reference_id = reader.next_value_if_named("DataObjectGroupReferenceId")?;
        self.data_object_group_id = reader.next_value_if_named("DataObjectGroupId")?;
        self.read_fields(reader)?;
        reader.end_block_named("BinaryDataObject")
    }
}

impl SedaXmlFragments for BinaryDataObject {
    fn to_seda_xml_fragments(&self) -> Result<String> {
        write_to_string(Some(STANDARD_INDENT), |w| self.write_fields(w))
    }

    fn from_seda_xml_fragments(&mut self, fragments: &str) -> Result<()> {
        let mut reader = SedaXmlEventReader::from_str(fragments);
        let mut parsed = BinaryDataObject::new(&self.id);
        parsed.read_fields(&mut reader)?;
        expect_end_of_fragments(&mut reader, "BinaryDataObject")?;
        parsed.group_id = self.group_id.take();
        parsed.data_object_group_reference_id = self.data_object_group_reference_id.take();
        parsed.data_object_group_id = self.data_object_group_id.take();
        parsed.on_disk_path = self.on_disk_path.take();
        *self = parsed;
        Ok(())
    }
}

/// A physical item of the transfer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhysicalDataObject {
    id: String,
    group_id: Option<String>,
    pub data_object_group_reference_id: Option<String>,
    pub data_object_group_id: Option<String>,
    pub data_object_version: Option<String>,
    pub physical_id: Option<String>,
    pub physical_dimensions_xml: Option<String>,
    /// Remaining extension blocks, verbatim
    pub extra_xml: Vec<String>,
}

impl PhysicalDataObject {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    pub(crate) fn set_group_id(&mut self, group_id: Option<&str>) {
        self.group_id = group_id.map(str::to_string);
    }

    pub fn has_legacy_linkage(&self) -> bool {
        self.data_object_group_reference_id.is_some() || self.data_object_group_id.is_some()
    }

    pub(crate) fn clear_legacy_linkage(&mut self) {
        self.data_object_group_reference_id = None;
        self.data_object_group_id = None;
    }

    pub fn to_seda_xml<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        writer.write_start_element("PhysicalDataObject")?;
        writer.write_attribute("id", &self.id)?;
        writer.write_element_value_if_not_empty(
            "DataObjectGroupReferenceId",
            self.data_object_group_reference_id.as_deref(),
        )?;
        writer.write_element_value_if_not_empty("DataObjectGroupId", self.data_object_group_id.as_deref())?;
        self.write_fields(writer)?;
        writer.write_end_element()
    }

    fn write_fields<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        writer.write_element_value_if_not_empty("DataObjectVersion", self.data_object_version.as_deref())?;
        writer.write_element_value_if_not_empty("PhysicalId", self.physical_id.as_deref())?;
        writer.write_raw_xml_block_if_not_empty(self.physical_dimensions_xml.as_deref())?;
        for extra in &self.extra_xml {
            writer.write_raw_xml_block_if_not_empty(Some(extra))?;
        }
        Ok(())
    }

    fn read_fields<R: BufRead>(&mut self, reader: &mut SedaXmlEventReader<R>) -> Result<()> {
        self.data_object_version = reader.next_value_if_named("DataObjectVersion")?;
        self.physical_id = reader.next_value_if_named("PhysicalId")?;
        self.physical_dimensions_xml = reader.next_block_as_string_if_named("PhysicalDimensions")?;
        while reader.peek_name()?.is_some() {
            self.extra_xml.push(reader.next_block_as_string()?);
        }
        Ok(())
    }

    /// Read a `PhysicalDataObject` element.
    pub fn from_seda_xml<R: BufRead>(reader: &mut SedaXmlEventReader<R>) -> Result<Self> {
        let start = reader.start_block_named("PhysicalDataObject")?;
        let id = start
            .attribute("id")
            .ok_or_else(|| Error::MalformedDocument("PhysicalDataObject without id".to_string()))?
            .to_string();
        let mut pdo = PhysicalDataObject::new(&id);
        pdo.read_body(reader)
            .map_err(|e| e.context(&format!("Error reading PhysicalDataObject [{}]", id)))?;
        Ok(pdo)
    }

    fn read_body<R: BufRead>(&mut self, reader: &mut SedaXmlEventReader<R>) -> Result<()> {
        self.data_object_group_reference_id = reader.next_value_if_named("DataObjectGroupReferenceId")?;
        self.data_object_group_id = reader.next_value_if_named("DataObjectGroupId")?;
        self.read_fields(reader)?;
        reader.end_block_named("PhysicalDataObject")
    }
}

impl SedaXmlFragments for PhysicalDataObject {
    fn to_seda_xml_fragments(&self) -> Result<String> {
        write_to_string(Some(STANDARD_INDENT), |w| self.write_fields(w))
    }

    fn from_seda_xml_fragments(&mut self, fragments: &str) -> Result<()> {
        let mut reader = SedaXmlEventReader::from_str(fragments);
        let mut parsed = PhysicalDataObject::new(&self.id);
        parsed.read_fields(&mut reader)?;
        expect_end_of_fragments(&mut reader, "PhysicalDataObject")?;
        parsed.group_id = self.group_id.take();
        parsed.data_object_group_reference_id = self.data_object_group_reference_id.take();
        parsed.data_object_group_id = self.data_object_group_id.take();
        *self = parsed;
        Ok(())
    }
}

/// Borrowed view on either kind of data object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataObjectRef<'a> {
    Binary(&'a BinaryDataObject),
    Physical(&'a PhysicalDataObject),
}

impl<'a> DataObjectRef<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            DataObjectRef::Binary(bdo) => bdo.id(),
            DataObjectRef::Physical(pdo) => pdo.id(),
        }
    }
}

/// Owned data object detached from a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataObject {
    Binary(BinaryDataObject),
    Physical(PhysicalDataObject),
}

/// The representations of one content item plus its provenance LogBook.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataObjectGroup {
    id: String,
    binary_data_objects: Vec<BinaryDataObject>,
    physical_data_objects: Vec<PhysicalDataObject>,
    log_book_xml_data: Option<String>,
    /// Directory the group was imported from, if any
    pub on_disk_path: Option<PathBuf>,
}

impl DataObjectGroup {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn binary_data_objects(&self) -> &[BinaryDataObject] {
        &self.binary_data_objects
    }

    pub fn binary_data_objects_mut(&mut self) -> &mut [BinaryDataObject] {
        &mut self.binary_data_objects
    }

    pub fn physical_data_objects(&self) -> &[PhysicalDataObject] {
        &self.physical_data_objects
    }

    pub fn physical_data_objects_mut(&mut self) -> &mut [PhysicalDataObject] {
        &mut self.physical_data_objects
    }

    pub fn log_book_xml_data(&self) -> Option<&str> {
        self.log_book_xml_data.as_deref()
    }

    pub fn set_log_book_xml_data(&mut self, log_book: Option<String>) {
        self.log_book_xml_data = log_book;
    }

    /// Identifiers of all objects, binary ones first.
    pub fn data_object_ids(&self) -> impl Iterator<Item = &str> {
        self.binary_data_objects
            .iter()
            .map(BinaryDataObject::id)
            .chain(self.physical_data_objects.iter().map(PhysicalDataObject::id))
    }

    /// Attach a binary object, pointing its owner handle at this group.
    pub fn add_binary_data_object(&mut self, mut bdo: BinaryDataObject) {
        self.warn_duplicate_version(bdo.data_object_version.as_deref(), bdo.id());
        bdo.set_group_id(Some(&self.id));
        self.binary_data_objects.push(bdo);
    }

    /// Attach a physical object, pointing its owner handle at this group.
    pub fn add_physical_data_object(&mut self, mut pdo: PhysicalDataObject) {
        self.warn_duplicate_version(pdo.data_object_version.as_deref(), pdo.id());
        pdo.set_group_id(Some(&self.id));
        self.physical_data_objects.push(pdo);
    }

    fn warn_duplicate_version(&self, version: Option<&str>, object_id: &str) {
        if let Some(version) = version
            && self.find_data_object_by_data_object_version(version).is_some()
        {
            tracing::warn!(
                group = %self.id,
                object = %object_id,
                version,
                "DataObjectVersion already present in group, lookups return the first one"
            );
        }
    }

    /// Detach the object with identifier `id`.
    pub fn remove_data_object(&mut self, id: &str) -> Option<DataObject> {
        if let Some(pos) = self.binary_data_objects.iter().position(|b| b.id() == id) {
            let mut bdo = self.binary_data_objects.remove(pos);
            bdo.set_group_id(None);
            return Some(DataObject::Binary(bdo));
        }
        let pos = self.physical_data_objects.iter().position(|p| p.id() == id)?;
        let mut pdo = self.physical_data_objects.remove(pos);
        pdo.set_group_id(None);
        Some(DataObject::Physical(pdo))
    }

    /// First binary object with this version, else first physical one.
    pub fn find_data_object_by_data_object_version(&self, version: &str) -> Option<DataObjectRef<'_>> {
        if let Some(bdo) = self
            .binary_data_objects
            .iter()
            .find(|b| b.data_object_version.as_deref() == Some(version))
        {
            return Some(DataObjectRef::Binary(bdo));
        }
        self.physical_data_objects
            .iter()
            .find(|p| p.data_object_version.as_deref() == Some(version))
            .map(DataObjectRef::Physical)
    }

    /// Whether the LogBook, when present, is not a `<LogBook>...</LogBook>` block.
    pub fn is_badly_formed_log_book_xml_data(&self) -> bool {
        is_badly_formed_log_book(self.log_book_xml_data.as_deref())
    }

    /// Move every object of `source` into this group and splice the LogBooks.
    ///
    /// Both LogBooks are checked before anything changes, so on error
    /// neither group is modified. On success `source` is left empty.
    pub fn merge(&mut self, source: &mut DataObjectGroup) -> Result<()> {
        if self.is_badly_formed_log_book_xml_data() {
            return Err(Error::MalformedDocument(format!(
                "Badly formed LogBook in DataObjectGroup [{}]",
                self.id
            )));
        }
        if source.is_badly_formed_log_book_xml_data() {
            return Err(Error::MalformedDocument(format!(
                "Badly formed LogBook in DataObjectGroup [{}]",
                source.id
            )));
        }
        let log_book = splice_log_books(self.log_book_xml_data.take(), source.log_book_xml_data.take());
        self.log_book_xml_data = log_book;
        for bdo in std::mem::take(&mut source.binary_data_objects) {
            self.add_binary_data_object(bdo);
        }
        for pdo in std::mem::take(&mut source.physical_data_objects) {
            self.add_physical_data_object(pdo);
        }
        Ok(())
    }

    pub fn to_seda_xml<W: Write>(&self, writer: &mut SedaXmlStreamWriter<W>) -> Result<()> {
        let write = |writer: &mut SedaXmlStreamWriter<W>| -> Result<()> {
            writer.write_start_element("DataObjectGroup")?;
            writer.write_attribute("id", &self.id)?;
            for bdo in &self.binary_data_objects {
                bdo.to_seda_xml(writer)?;
            }
            for pdo in &self.physical_data_objects {
                pdo.to_seda_xml(writer)?;
            }
            writer.write_raw_xml_block_if_not_empty(self.log_book_xml_data.as_deref())?;
            writer.write_end_element()
        };
        write(writer).map_err(|e| e.context(&format!("Error writing DataObjectGroup [{}]", self.id)))
    }

    /// Read a `DataObjectGroup` at the reader position into `package`.
    ///
    /// Returns [`ParseOutcome::NotPresent`] without consuming anything when
    /// the next element is not a `DataObjectGroup` with an `id`, so that the
    /// caller can try other element kinds. Each binary object gets its
    /// payload path from `root_dir` and its URI. An object nested in the
    /// group that also carries SEDA 2.0 group linkage is a
    /// [`Error::SchemaVersionConflict`].
    pub fn id_from_seda_xml<R: BufRead>(
        reader: &mut SedaXmlEventReader<R>,
        package: &mut DataObjectPackage,
        root_dir: &Path,
    ) -> Result<ParseOutcome<String>> {
        let Some(id) = reader.peek_attribute_block_if_named("DataObjectGroup", "id")? else {
            return Ok(ParseOutcome::NotPresent);
        };
        let group = Self::read_body(reader, &id, root_dir)
            .map_err(|e| e.context(&format!("Error reading DataObjectGroup [{}]", id)))?;
        package
            .add_data_object_group(group)
            .map_err(|e| e.context(&format!("Error reading DataObjectGroup [{}]", id)))?;
        Ok(ParseOutcome::Ok(id))
    }

    fn read_body<R: BufRead>(reader: &mut SedaXmlEventReader<R>, id: &str, root_dir: &Path) -> Result<Self> {
        reader.next_event()?;
        let mut group = DataObjectGroup::new(id);
        loop {
            match reader.peek_name()?.as_deref() {
                Some("BinaryDataObject") => {
                    let mut bdo = BinaryDataObject::from_seda_xml(reader)?;
                    if bdo.has_legacy_linkage() {
                        return Err(Error::SchemaVersionConflict(format!(
                            "BinaryDataObject [{}] uses SEDA 2.0 DataObjectGroup linkage inside a SEDA 2.1 DataObjectGroup",
                            bdo.id()
                        )));
                    }
                    bdo.set_on_disk_path_from_root(root_dir)?;
                    group.add_binary_data_object(bdo);
                },
                Some("PhysicalDataObject") => {
                    let pdo = PhysicalDataObject::from_seda_xml(reader)?;
                    if pdo.has_legacy_linkage() {
                        return Err(Error::SchemaVersionConflict(format!(
                            "PhysicalDataObject [{}] uses SEDA 2.0 DataObjectGroup linkage inside a SEDA 2.1 DataObjectGroup",
                            pdo.id()
                        )));
                    }
                    group.add_physical_data_object(pdo);
                },
                _ => break,
            }
        }
        group.log_book_xml_data = reader.next_block_as_string_if_named("LogBook")?;
        reader.end_block_named("DataObjectGroup")?;
        Ok(group)
    }
}

impl SedaXmlFragments for DataObjectGroup {
    /// Only the LogBook of a group is edited as XML.
    fn to_seda_xml_fragments(&self) -> Result<String> {
        match &self.log_book_xml_data {
            Some(log_book) => indent_xml(log_book, STANDARD_INDENT),
            None => Ok(String::new()),
        }
    }

    fn from_seda_xml_fragments(&mut self, fragments: &str) -> Result<()> {
        let mut reader = SedaXmlEventReader::from_str(fragments);
        let log_book = reader
            .next_block_as_string_if_named("LogBook")
            .map_err(|e| e.context("Error reading DataObjectGroup"))?;
        expect_end_of_fragments(&mut reader, "DataObjectGroup")?;
        self.log_book_xml_data = log_book;
        Ok(())
    }
}

/// Whether a LogBook fragment, when present, is badly formed.
pub fn is_badly_formed_log_book(log_book: Option<&str>) -> bool {
    match log_book {
        None => false,
        Some(xml) => {
            let xml = xml.trim();
            xml != LOG_BOOK_EMPTY && !(xml.starts_with(LOG_BOOK_START) && xml.ends_with(LOG_BOOK_END))
        },
    }
}

/// Splice two well-formed LogBooks into one wrapper, target events first.
fn splice_log_books(target: Option<String>, source: Option<String>) -> Option<String> {
    match (target, source) {
        (None, source) => source,
        (target, None) => target,
        (Some(target), source) if target.trim() == LOG_BOOK_EMPTY => source,
        (target, Some(source)) if source.trim() == LOG_BOOK_EMPTY => target,
        (Some(target), Some(source)) => {
            let target = target.trim();
            let source = source.trim();
            let mut spliced = String::with_capacity(target.len() + source.len());
            spliced.push_str(&target[..target.len() - LOG_BOOK_END.len()]);
            spliced.push_str(&source[LOG_BOOK_START.len()..]);
            Some(spliced)
        },
    }
}

/// Join a manifest URI to `root_dir` without leaving it.
fn path_under_root(root_dir: &Path, uri: &str) -> Result<PathBuf> {
    let mut path = root_dir.to_path_buf();
    for component in Path::new(uri).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {},
            Component::ParentDir => {
                return Err(Error::MalformedDocument(format!(
                    "Uri [{}] goes outside of the package directory",
                    uri
                )));
            },
        }
    }
    Ok(path)
}

fn read_complex_if_named<R: BufRead>(
    reader: &mut SedaXmlEventReader<R>,
    name: &str,
) -> Result<Option<ComplexListType>> {
    if !reader.peek_block_if_named(name)? {
        return Ok(None);
    }
    match SedaMetadata::from_seda_xml(reader, name)? {
        SedaMetadata::Complex(complex) => Ok(Some(complex)),
        _ => Err(Error::MalformedDocument(format!("<{}> is not a composite", name))),
    }
}

fn expect_end_of_fragments<R: BufRead>(reader: &mut SedaXmlEventReader<R>, owner: &str) -> Result<()> {
    match reader.peek_event()? {
        XmlEvent::EndDocument => Ok(()),
        XmlEvent::StartElement { name, .. } => Err(Error::MalformedDocument(format!(
            "Unexpected <{}> in {} fragments",
            name, owner
        ))),
        other => Err(Error::MalformedDocument(format!(
            "Unexpected {:?} in {} fragments",
            other, owner
        ))),
    }
}
