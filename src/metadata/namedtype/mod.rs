//! Named SEDA metadata types.
//!
//! Each type knows its element name and reads or writes itself as one XML
//! element.

pub mod any_xml_type;
pub mod complex_list_type;
pub mod date_type;
pub mod enum_type;
pub mod integer_type;
pub mod string_type;

pub use any_xml_type::AnyXmlType;
pub use complex_list_type::ComplexListType;
pub use date_type::{DateTimeType, DateTimeValue, DateType};
pub use enum_type::EnumType;
pub use integer_type::IntegerType;
pub use string_type::{StringType, TextType};
