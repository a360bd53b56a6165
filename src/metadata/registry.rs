//! Static registry of SEDA metadata elements.
//!
//! Maps each known element name to the kind of node that represents it.
//! Composite elements carry their schema: the ordered list of allowed
//! children with their cardinality. Names missing from the registry are read
//! as opaque XML blocks.

use phf::phf_map;

/// How an element is represented.
#[derive(Debug)]
pub enum MetadataKind {
    /// Plain string
    String,
    /// String with an optional `xml:lang` attribute
    Text,
    /// `xsd:date`
    Date,
    /// `xsd:dateTime`, date-only values accepted
    DateTime,
    /// Integer
    Integer,
    /// String restricted to a closed list of values
    Enum(&'static [&'static str]),
    /// Ordered list of child elements
    Complex(&'static ComplexSchema),
    /// Verbatim XML block
    AnyXml,
}

/// Allowed child of a composite element.
#[derive(Debug, PartialEq, Eq)]
pub struct ChildDef {
    pub name: &'static str,
    pub many: bool,
}

/// Schema of a composite element.
#[derive(Debug, PartialEq, Eq)]
pub struct ComplexSchema {
    /// Allowed children in canonical order
    pub children: &'static [ChildDef],
    /// Whether unknown children are kept as opaque XML
    pub expandable: bool,
    /// Whether children may be reordered to canonical order
    pub reorderable: bool,
}

impl ComplexSchema {
    /// Definition of an allowed child.
    pub fn child(&self, name: &str) -> Option<&'static ChildDef> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Canonical rank of a child, unknown children rank last.
    pub fn rank(&self, name: &str) -> usize {
        self.children
            .iter()
            .position(|c| c.name == name)
            .unwrap_or(self.children.len())
    }
}

macro_rules! one {
    ($name:expr) => {
        ChildDef { name: $name, many: false }
    };
}

macro_rules! many {
    ($name:expr) => {
        ChildDef { name: $name, many: true }
    };
}

const DESCRIPTION_LEVELS: &[&str] = &[
    "Fonds",
    "Subfonds",
    "Class",
    "Collection",
    "Series",
    "Subseries",
    "RecordGrp",
    "SubGrp",
    "File",
    "Item",
    "OtherLevel",
];

const KEYWORD_TYPES: &[&str] = &[
    "corpname",
    "famname",
    "geogname",
    "name",
    "occupation",
    "persname",
    "subject",
    "genreform",
    "function",
];

const CONTENT: ComplexSchema = ComplexSchema {
    children: &[
        one!("DescriptionLevel"),
        many!("Title"),
        many!("FilePlanPosition"),
        many!("SystemId"),
        many!("OriginatingSystemId"),
        many!("ArchivalAgencyArchiveUnitIdentifier"),
        many!("OriginatingAgencyArchiveUnitIdentifier"),
        many!("TransferringAgencyArchiveUnitIdentifier"),
        many!("Description"),
        one!("CustodialHistory"),
        one!("Type"),
        one!("DocumentType"),
        many!("Language"),
        one!("DescriptionLanguage"),
        one!("Status"),
        one!("Version"),
        many!("Tag"),
        many!("Keyword"),
        one!("Coverage"),
        one!("OriginatingAgency"),
        one!("SubmissionAgency"),
        many!("AuthorizedAgent"),
        many!("Writer"),
        many!("Addressee"),
        many!("Recipient"),
        many!("Transmitter"),
        many!("Sender"),
        one!("Source"),
        one!("RelatedObjectReference"),
        one!("CreatedDate"),
        one!("TransactedDate"),
        one!("AcquiredDate"),
        one!("SentDate"),
        one!("ReceivedDate"),
        one!("RegisteredDate"),
        one!("StartDate"),
        one!("EndDate"),
        many!("Event"),
        many!("Signature"),
        one!("Gps"),
    ],
    expandable: true,
    reorderable: true,
};

const AGENT: ComplexSchema = ComplexSchema {
    children: &[
        one!("FirstName"),
        one!("BirthName"),
        one!("FullName"),
        one!("GivenName"),
        one!("Gender"),
        one!("BirthDate"),
        one!("BirthPlace"),
        one!("DeathDate"),
        one!("DeathPlace"),
        many!("Nationality"),
        one!("Corpname"),
        many!("Identifier"),
        many!("Function"),
        many!("Activity"),
        many!("Position"),
        many!("Role"),
        many!("Mandate"),
    ],
    expandable: false,
    reorderable: true,
};

const ORGANIZATION: ComplexSchema = ComplexSchema {
    children: &[one!("Identifier"), one!("OrganizationDescriptiveMetadata")],
    expandable: false,
    reorderable: true,
};

const CUSTODIAL_HISTORY: ComplexSchema = ComplexSchema {
    children: &[many!("CustodialHistoryItem"), one!("CustodialHistoryFile")],
    expandable: false,
    reorderable: true,
};

const KEYWORD: ComplexSchema = ComplexSchema {
    children: &[
        one!("KeywordContent"),
        one!("KeywordReference"),
        one!("KeywordType"),
    ],
    expandable: false,
    reorderable: true,
};

const COVERAGE: ComplexSchema = ComplexSchema {
    children: &[many!("Spatial"), many!("Temporal"), many!("Juridictional")],
    expandable: false,
    reorderable: true,
};

const EVENT: ComplexSchema = ComplexSchema {
    children: &[
        one!("EventIdentifier"),
        one!("EventTypeCode"),
        one!("EventType"),
        one!("EventDateTime"),
        one!("EventDetail"),
        one!("Outcome"),
        one!("OutcomeDetail"),
        one!("OutcomeDetailMessage"),
        one!("EventDetailData"),
    ],
    expandable: true,
    reorderable: true,
};

const GPS: ComplexSchema = ComplexSchema {
    children: &[
        one!("GpsVersionID"),
        one!("GpsAltitude"),
        one!("GpsAltitudeRef"),
        one!("GpsLatitude"),
        one!("GpsLatitudeRef"),
        one!("GpsLongitude"),
        one!("GpsLongitudeRef"),
        one!("GpsDateStamp"),
    ],
    expandable: false,
    reorderable: true,
};

const MANAGEMENT: ComplexSchema = ComplexSchema {
    children: &[
        one!("StorageRule"),
        one!("AppraisalRule"),
        one!("AccessRule"),
        one!("DisseminationRule"),
        one!("ReuseRule"),
        one!("ClassificationRule"),
        one!("LogBook"),
        one!("NeedAuthorization"),
        one!("UpdateOperation"),
    ],
    expandable: true,
    reorderable: true,
};

// Rule and StartDate come in pairs, their relative order is significant.
const RULE: ComplexSchema = ComplexSchema {
    children: &[
        many!("Rule"),
        many!("StartDate"),
        one!("PreventInheritance"),
        many!("RefNonRuleId"),
        one!("FinalAction"),
        one!("ClassificationLevel"),
        one!("ClassificationOwner"),
        one!("ClassificationAudience"),
        one!("ClassificationReassessingDate"),
        one!("NeedReassessingAuthorization"),
    ],
    expandable: false,
    reorderable: false,
};

const FORMAT_IDENTIFICATION: ComplexSchema = ComplexSchema {
    children: &[
        one!("FormatLitteral"),
        one!("MimeType"),
        one!("FormatId"),
        one!("Encoding"),
    ],
    expandable: false,
    reorderable: true,
};

const FILE_INFO: ComplexSchema = ComplexSchema {
    children: &[
        one!("Filename"),
        one!("CreatingApplicationName"),
        one!("CreatingApplicationVersion"),
        one!("DateCreatedByApplication"),
        one!("CreatingOs"),
        one!("CreatingOsVersion"),
        one!("LastModified"),
    ],
    expandable: false,
    reorderable: true,
};

/// Schema of `Content`.
pub static CONTENT_SCHEMA: &ComplexSchema = &CONTENT;

/// Schema of ArchiveUnit `Management`.
pub static MANAGEMENT_SCHEMA: &ComplexSchema = &MANAGEMENT;

static REGISTRY: phf::Map<&'static str, MetadataKind> = phf_map! {
    // Composites
    "Content" => MetadataKind::Complex(&CONTENT),
    "Management" => MetadataKind::Complex(&MANAGEMENT),
    "AuthorizedAgent" => MetadataKind::Complex(&AGENT),
    "Writer" => MetadataKind::Complex(&AGENT),
    "Addressee" => MetadataKind::Complex(&AGENT),
    "Recipient" => MetadataKind::Complex(&AGENT),
    "Transmitter" => MetadataKind::Complex(&AGENT),
    "Sender" => MetadataKind::Complex(&AGENT),
    "AgentType" => MetadataKind::Complex(&AGENT),
    "OriginatingAgency" => MetadataKind::Complex(&ORGANIZATION),
    "SubmissionAgency" => MetadataKind::Complex(&ORGANIZATION),
    "CustodialHistory" => MetadataKind::Complex(&CUSTODIAL_HISTORY),
    "Keyword" => MetadataKind::Complex(&KEYWORD),
    "Coverage" => MetadataKind::Complex(&COVERAGE),
    "Event" => MetadataKind::Complex(&EVENT),
    "Gps" => MetadataKind::Complex(&GPS),
    "StorageRule" => MetadataKind::Complex(&RULE),
    "AppraisalRule" => MetadataKind::Complex(&RULE),
    "AccessRule" => MetadataKind::Complex(&RULE),
    "DisseminationRule" => MetadataKind::Complex(&RULE),
    "ReuseRule" => MetadataKind::Complex(&RULE),
    "ClassificationRule" => MetadataKind::Complex(&RULE),
    "FormatIdentification" => MetadataKind::Complex(&FORMAT_IDENTIFICATION),
    "FileInfo" => MetadataKind::Complex(&FILE_INFO),
    // Enumerations
    "DescriptionLevel" => MetadataKind::Enum(DESCRIPTION_LEVELS),
    "KeywordType" => MetadataKind::Enum(KEYWORD_TYPES),
    // Texts
    "Title" => MetadataKind::Text,
    "Description" => MetadataKind::Text,
    "CustodialHistoryItem" => MetadataKind::Text,
    "Type" => MetadataKind::Text,
    "DocumentType" => MetadataKind::Text,
    "Function" => MetadataKind::Text,
    "Activity" => MetadataKind::Text,
    "Position" => MetadataKind::Text,
    "Role" => MetadataKind::Text,
    // Dates
    "BirthDate" => MetadataKind::Date,
    "DeathDate" => MetadataKind::Date,
    "ClassificationReassessingDate" => MetadataKind::Date,
    "CreatedDate" => MetadataKind::DateTime,
    "TransactedDate" => MetadataKind::DateTime,
    "AcquiredDate" => MetadataKind::DateTime,
    "SentDate" => MetadataKind::DateTime,
    "ReceivedDate" => MetadataKind::DateTime,
    "RegisteredDate" => MetadataKind::DateTime,
    "StartDate" => MetadataKind::DateTime,
    "EndDate" => MetadataKind::DateTime,
    "EventDateTime" => MetadataKind::DateTime,
    "DateCreatedByApplication" => MetadataKind::DateTime,
    "LastModified" => MetadataKind::DateTime,
    // Integers
    "GpsAltitude" => MetadataKind::Integer,
    // Strings
    "ArchiveUnitProfile" => MetadataKind::String,
    "FilePlanPosition" => MetadataKind::String,
    "SystemId" => MetadataKind::String,
    "OriginatingSystemId" => MetadataKind::String,
    "ArchivalAgencyArchiveUnitIdentifier" => MetadataKind::String,
    "OriginatingAgencyArchiveUnitIdentifier" => MetadataKind::String,
    "TransferringAgencyArchiveUnitIdentifier" => MetadataKind::String,
    "Language" => MetadataKind::String,
    "DescriptionLanguage" => MetadataKind::String,
    "Status" => MetadataKind::String,
    "Version" => MetadataKind::String,
    "Tag" => MetadataKind::String,
    "Source" => MetadataKind::String,
    "KeywordContent" => MetadataKind::String,
    "KeywordReference" => MetadataKind::String,
    "Spatial" => MetadataKind::String,
    "Temporal" => MetadataKind::String,
    "Juridictional" => MetadataKind::String,
    "FirstName" => MetadataKind::String,
    "BirthName" => MetadataKind::String,
    "FullName" => MetadataKind::String,
    "GivenName" => MetadataKind::String,
    "Gender" => MetadataKind::String,
    "Nationality" => MetadataKind::String,
    "Corpname" => MetadataKind::String,
    "Identifier" => MetadataKind::String,
    "Mandate" => MetadataKind::String,
    "EventIdentifier" => MetadataKind::String,
    "EventTypeCode" => MetadataKind::String,
    "EventType" => MetadataKind::String,
    "EventDetail" => MetadataKind::String,
    "Outcome" => MetadataKind::String,
    "OutcomeDetail" => MetadataKind::String,
    "OutcomeDetailMessage" => MetadataKind::String,
    "EventDetailData" => MetadataKind::String,
    "GpsVersionID" => MetadataKind::String,
    "GpsAltitudeRef" => MetadataKind::String,
    "GpsLatitude" => MetadataKind::String,
    "GpsLatitudeRef" => MetadataKind::String,
    "GpsLongitude" => MetadataKind::String,
    "GpsLongitudeRef" => MetadataKind::String,
    "GpsDateStamp" => MetadataKind::String,
    "Rule" => MetadataKind::String,
    "PreventInheritance" => MetadataKind::String,
    "RefNonRuleId" => MetadataKind::String,
    "FinalAction" => MetadataKind::String,
    "ClassificationLevel" => MetadataKind::String,
    "ClassificationOwner" => MetadataKind::String,
    "ClassificationAudience" => MetadataKind::String,
    "NeedReassessingAuthorization" => MetadataKind::String,
    "NeedAuthorization" => MetadataKind::String,
    "FormatLitteral" => MetadataKind::String,
    "MimeType" => MetadataKind::String,
    "FormatId" => MetadataKind::String,
    "Encoding" => MetadataKind::String,
    "Filename" => MetadataKind::String,
    "CreatingApplicationName" => MetadataKind::String,
    "CreatingApplicationVersion" => MetadataKind::String,
    "CreatingOs" => MetadataKind::String,
    "CreatingOsVersion" => MetadataKind::String,
};

/// Kind of a registered element name.
pub fn kind_of(name: &str) -> Option<&'static MetadataKind> {
    REGISTRY.get(name)
}

/// Schema of a registered composite element.
pub fn complex_schema(name: &str) -> Option<&'static ComplexSchema> {
    match kind_of(name) {
        Some(MetadataKind::Complex(schema)) => Some(*schema),
        _ => None,
    }
}

/// Values used when generating samples, removed when cleaning an edited
/// fragment.
pub const DEFAULT_SAMPLE_VALUES: &[&str] = &[
    "Text",
    "1970-01-01",
    "1970-01-01T01:00:00",
    "Rule1",
    "Rule2",
    "Rule3",
    "Rule4",
    "Level1",
    "Owner1",
    "Text1",
    "Text2",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert!(matches!(kind_of("ArchiveUnitProfile"), Some(MetadataKind::String)));
        assert!(matches!(kind_of("Title"), Some(MetadataKind::Text)));
        assert!(kind_of("NotASedaElement").is_none());
        let content = complex_schema("Content").unwrap();
        assert!(content.expandable);
        assert_eq!(content.rank("DescriptionLevel"), 0);
        assert!(content.rank("Title") < content.rank("Writer"));
        assert_eq!(content.rank("Unknown"), content.children.len());
    }

    #[test]
    fn test_every_schema_child_is_registered() {
        for name in ["Content", "Management", "Writer", "Keyword", "Event", "FileInfo", "AccessRule"] {
            let schema = complex_schema(name).unwrap();
            for child in schema.children {
                let registered = kind_of(child.name).is_some();
                // Opaque children are read as AnyXml without registration
                let opaque = matches!(
                    child.name,
                    "BirthPlace"
                        | "DeathPlace"
                        | "RelatedObjectReference"
                        | "Signature"
                        | "LogBook"
                        | "UpdateOperation"
                        | "OrganizationDescriptiveMetadata"
                        | "CustodialHistoryFile"
                );
                assert!(registered || opaque, "{} child {} not registered", name, child.name);
            }
        }
    }
}
