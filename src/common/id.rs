//! Package-local identifiers.
//!
//! Identifiers generated by Resip have the form `ID<n>`. Identifiers read
//! from a manifest may have any form; the generator skips values already in
//! use.

use std::cmp::Ordering;

/// Prefix of generated identifiers.
pub const ID_PREFIX: &str = "ID";

/// Format a generated identifier.
pub fn format_id(n: u64) -> String {
    let mut buffer = itoa::Buffer::new();
    let digits = buffer.format(n);
    let mut out = String::with_capacity(ID_PREFIX.len() + digits.len());
    out.push_str(ID_PREFIX);
    out.push_str(digits);
    out
}

/// Numeric part of a generated-looking identifier.
pub fn id_number(id: &str) -> Option<u64> {
    id.strip_prefix(ID_PREFIX)?.parse().ok()
}

/// Natural ordering of identifiers: `ID2` sorts before `ID10`.
///
/// Identifiers without a numeric suffix sort after generated ones,
/// lexicographically.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (id_number(a), id_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
