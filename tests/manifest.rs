//! Manifest reading, writing and normalization through the public API.

use resip::Error;
use resip::common::ProgressLogger;
use resip::core::{
    ArchiveTransfer, DataObjectGroup, DataObjectPackage, ParseOutcome, vitam_normalize,
};
use resip::xml::SedaXmlEventReader;
use std::path::Path;

#[test]
fn test_group_scenario_with_root_dir() {
    let xml = "<DataObjectGroup id=\"ID1\">\
        <BinaryDataObject id=\"ID2\"><DataObjectVersion>BinaryMaster_1</DataObjectVersion><Uri>file.txt</Uri></BinaryDataObject>\
        <LogBook><Event><EventIdentifier>E1</EventIdentifier></Event></LogBook>\
        </DataObjectGroup>";
    let mut package = DataObjectPackage::new();
    let mut reader = SedaXmlEventReader::from_str(xml);
    let outcome = DataObjectGroup::id_from_seda_xml(&mut reader, &mut package, Path::new("/tmp/x")).unwrap();
    assert_eq!(outcome, ParseOutcome::Ok("ID1".to_string()));

    let group = package.data_object_group("ID1").unwrap();
    assert_eq!(group.binary_data_objects().len(), 1);
    let bdo = &group.binary_data_objects()[0];
    assert_eq!(bdo.id(), "ID2");
    assert_eq!(bdo.group_id(), Some("ID1"));
    assert_eq!(bdo.on_disk_path.as_deref(), Some(Path::new("/tmp/x/file.txt")));
    assert!(group.log_book_xml_data().unwrap().contains("E1"));
}

#[test]
fn test_group_not_present_leaves_cursor() {
    let mut package = DataObjectPackage::new();
    let mut reader = SedaXmlEventReader::from_str("<BinaryDataObject id=\"x\"><Uri>a</Uri></BinaryDataObject>");
    let outcome = DataObjectGroup::id_from_seda_xml(&mut reader, &mut package, Path::new(".")).unwrap();
    assert_eq!(outcome, ParseOutcome::NotPresent);
    assert_eq!(reader.peek_name().unwrap().as_deref(), Some("BinaryDataObject"));
}

#[test]
fn test_nested_legacy_linkage_conflicts() {
    let xml = "<DataObjectGroup id=\"ID1\">\
        <BinaryDataObject id=\"ID2\"><DataObjectGroupReferenceId>ID9</DataObjectGroupReferenceId><Uri>a.txt</Uri></BinaryDataObject>\
        </DataObjectGroup>";
    let mut package = DataObjectPackage::new();
    let mut reader = SedaXmlEventReader::from_str(xml);
    let err = DataObjectGroup::id_from_seda_xml(&mut reader, &mut package, Path::new(".")).unwrap_err();
    assert!(matches!(err, Error::SchemaVersionConflict(_)), "{err}");
    assert!(err.to_string().contains("ID1"));
    assert!(package.data_object_group("ID1").is_none());
}

const LEGACY_TRANSFER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ArchiveTransfer xmlns="fr:gouv:culture:archivesdefrance:seda:v2.1">
  <Date>2020-01-01T00:00:00</Date>
  <MessageIdentifier>LEGACY-1</MessageIdentifier>
  <CodeListVersions/>
  <DataObjectPackage>
    <BinaryDataObject id="ID10">
      <DataObjectGroupId>ID20</DataObjectGroupId>
      <DataObjectVersion>BinaryMaster_1</DataObjectVersion>
      <Uri>content/a.pdf</Uri>
    </BinaryDataObject>
    <BinaryDataObject id="ID11">
      <DataObjectGroupReferenceId>ID20</DataObjectGroupReferenceId>
      <DataObjectVersion>Dissemination_1</DataObjectVersion>
      <Uri>content/a.html</Uri>
    </BinaryDataObject>
    <DescriptiveMetadata>
      <ArchiveUnit id="ID30">
        <Content><DescriptionLevel>Item</DescriptionLevel><Title>Report</Title></Content>
        <DataObjectReference><DataObjectReferenceId>ID11</DataObjectReferenceId></DataObjectReference>
      </ArchiveUnit>
    </DescriptiveMetadata>
    <ManagementMetadata/>
  </DataObjectPackage>
  <ArchivalAgency><Identifier>AA</Identifier></ArchivalAgency>
  <TransferringAgency><Identifier>TA</Identifier></TransferringAgency>
</ArchiveTransfer>"#;

#[test]
fn test_legacy_transfer_is_normalized() {
    let progress = ProgressLogger::silent();
    let mut transfer = ArchiveTransfer::from_xml_str(LEGACY_TRANSFER, Path::new("/data/sip"), &progress).unwrap();
    assert_eq!(transfer.package.pending_binary_data_objects().len(), 2);

    let summary = vitam_normalize(&mut transfer.package, &progress).unwrap();
    assert!(summary.contains("1 DataObjectGroup(s), 2 BinaryDataObject(s)"), "{summary}");
    let package = &transfer.package;
    assert!(package.pending_binary_data_objects().is_empty());
    let group = package.data_object_group("ID20").unwrap();
    let ids: Vec<_> = group.data_object_ids().collect();
    assert_eq!(ids, ["ID10", "ID11"]);
    let unit = package.archive_unit("ID30").unwrap();
    assert_eq!(unit.data_object_group_reference_id(), Some("ID20"));
    assert_eq!(unit.data_object_reference_id(), None);

    // Written back in SEDA 2.1 form, the package reads without normalization work
    let xml = transfer.to_xml_string(&progress).unwrap();
    assert!(!xml.contains("<DataObjectGroupId>"));
    assert!(!xml.contains("<DataObjectReferenceId>"));
    let reread = ArchiveTransfer::from_xml_str(&xml, Path::new("/data/sip"), &progress).unwrap();
    assert!(reread.package.pending_binary_data_objects().is_empty());
    assert_eq!(
        reread.package.data_object_group("ID20").unwrap().binary_data_objects()[1].on_disk_path.as_deref(),
        Some(Path::new("/data/sip/content/a.html"))
    );
}

#[test]
fn test_manifest_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let progress = ProgressLogger::silent();
    let mut transfer = ArchiveTransfer::from_xml_str(LEGACY_TRANSFER, dir.path(), &progress).unwrap();
    vitam_normalize(&mut transfer.package, &progress).unwrap();

    let path = dir.path().join("manifest.xml");
    transfer.to_file(&path, &progress).unwrap();
    let reread = ArchiveTransfer::from_file(&path, &progress).unwrap();
    assert_eq!(reread.global_metadata, transfer.global_metadata);
    assert_eq!(reread.package.description(), transfer.package.description());
    assert_eq!(
        reread.package.archive_unit("ID30").unwrap().title().as_deref(),
        Some("Report")
    );
}
