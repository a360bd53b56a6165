//! Escaping of manifest text and attribute values.
//!
//! Text keeps quotes and apostrophes as typed, so titles and descriptions
//! read as in hand-written manifests. Attribute values also escape the double
//! quote and the whitespace that attribute normalization would turn into
//! spaces.

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

const TEXT_SPECIALS: [&str; 3] = ["&", "<", ">"];
const TEXT_REPLACEMENTS: [&str; 3] = ["&amp;", "&lt;", "&gt;"];

const ATTRIBUTE_SPECIALS: [&str; 7] = ["&", "<", ">", "\"", "\t", "\n", "\r"];
const ATTRIBUTE_REPLACEMENTS: [&str; 7] = ["&amp;", "&lt;", "&gt;", "&quot;", "&#9;", "&#10;", "&#13;"];

static TEXT_ESCAPER: Lazy<AhoCorasick> =
    Lazy::new(|| AhoCorasick::new(TEXT_SPECIALS).expect("Failed to build XML text escaper"));

static ATTRIBUTE_ESCAPER: Lazy<AhoCorasick> =
    Lazy::new(|| AhoCorasick::new(ATTRIBUTE_SPECIALS).expect("Failed to build XML attribute escaper"));

/// Escape element text.
///
/// ```
/// use resip::common::xml::escape_text;
/// assert_eq!(escape_text("Dupont & fils <l'atelier>"), "Dupont &amp; fils &lt;l'atelier&gt;");
/// ```
#[inline]
pub fn escape_text(s: &str) -> String {
    TEXT_ESCAPER.replace_all(s, &TEXT_REPLACEMENTS)
}

/// Escape an attribute value written between double quotes.
#[inline]
pub fn escape_attribute(s: &str) -> String {
    ATTRIBUTE_ESCAPER.replace_all(s, &ATTRIBUTE_REPLACEMENTS)
}

/// Character of a predefined entity or character reference name, given
/// without `&` and `;`.
pub fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        },
    }
}

/// Replace predefined entities and character references.
///
/// Unknown or malformed references are left unchanged.
///
/// ```
/// use resip::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;Title&gt; &#233;t&#xE9;"), "<Title> été");
/// assert_eq!(unescape_xml("&amp;lt;"), "&lt;");
/// assert_eq!(unescape_xml("&nbsp;"), "&nbsp;");
/// ```
pub fn unescape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = memchr::memchr(b'&', rest.as_bytes()) {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let resolved = memchr::memchr(b';', tail.as_bytes())
            .and_then(|end| resolve_entity(&tail[..end]).map(|ch| (ch, end)));
        match resolved {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            },
            None => {
                out.push('&');
                rest = tail;
            },
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_text_keeps_quotes() {
        assert_eq!(escape_text("\"l'archive\""), "\"l'archive\"");
        assert_eq!(escape_text("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
    }

    #[test]
    fn test_attribute_escapes_quote_and_whitespace() {
        assert_eq!(escape_attribute("say \"hi\"\tnow\r\n"), "say &quot;hi&quot;&#9;now&#13;&#10;");
        assert_eq!(escape_attribute("l'acte"), "l'acte");
    }

    #[test]
    fn test_unescape_references() {
        assert_eq!(unescape_xml("line&#10;next&#x9;tab"), "line\nnext\ttab");
        assert_eq!(unescape_xml("&quot;&apos;"), "\"'");
        assert_eq!(unescape_xml("R&D; &#xZZ; & &"), "R&D; &#xZZ; & &");
        assert_eq!(resolve_entity("#0"), Some('\0'));
        assert_eq!(resolve_entity("#xD800"), None);
    }

    proptest! {
        #[test]
        fn prop_unescape_reverses_escape(s in ".*") {
            prop_assert_eq!(unescape_xml(&escape_text(&s)), s.clone());
            prop_assert_eq!(unescape_xml(&escape_attribute(&s)), s);
        }
    }
}
