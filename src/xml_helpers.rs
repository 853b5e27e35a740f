//! Attribute extraction shared by the workbook, styles and worksheet parsers.
//! Invalid UTF-8 is treated as a missing attribute.

use quick_xml::events::BytesStart;
use std::str::FromStr;

use crate::types::ColorSpec;

/// Raw value of the attribute named `key`, if present and UTF-8.
pub fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| String::from_utf8(attr.value.into_owned()).ok())
}

/// Attribute parsed with [`FromStr`]; unparseable values read as missing.
pub fn attr_parse<T: FromStr>(e: &BytesStart, key: &[u8]) -> Option<T> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

pub fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_parse(e, key)
}

pub fn attr_f64(e: &BytesStart, key: &[u8]) -> Option<f64> {
    attr_parse(e, key)
}

/// SpreadsheetML boolean: `1` and `true` are true, any other value is false.
pub fn attr_bool(e: &BytesStart, key: &[u8]) -> Option<bool> {
    attr_string(e, key).map(|s| matches!(s.as_str(), "1" | "true"))
}

pub fn attr_bool_default(e: &BytesStart, key: &[u8], default: bool) -> bool {
    attr_bool(e, key).unwrap_or(default)
}

/// The `val` attribute carried by most style leaf elements (`<sz val="11"/>`).
pub fn attr_val(e: &BytesStart) -> Option<String> {
    attr_string(e, b"val")
}

/// Colour reference of a `fgColor`, `color` or similar element.
pub fn parse_color_attrs(e: &BytesStart) -> ColorSpec {
    ColorSpec {
        rgb: attr_string(e, b"rgb"),
        theme: attr_u32(e, b"theme"),
        tint: attr_f64(e, b"tint"),
        indexed: attr_u32(e, b"indexed"),
        auto: attr_bool_default(e, b"auto", false),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn element(content: &str) -> BytesStart<'_> {
        BytesStart::from_content(content, content.find(' ').unwrap_or(content.len()))
    }

    #[test]
    fn numeric_attributes() {
        let e = element(r#"col min="3" width=" 12.5 " bad="wide""#);
        assert_eq!(attr_u32(&e, b"min"), Some(3));
        assert_eq!(attr_f64(&e, b"width"), Some(12.5));
        assert_eq!(attr_f64(&e, b"bad"), None);
        assert_eq!(attr_u32(&e, b"max"), None);
        assert_eq!(attr_string(&e, b"bad").as_deref(), Some("wide"));
    }

    #[test_case("1", Some(true) ; "one")]
    #[test_case("true", Some(true) ; "word true")]
    #[test_case("0", Some(false) ; "zero")]
    #[test_case("yes", Some(false) ; "anything else")]
    fn booleans(value: &str, expected: Option<bool>) {
        let content = format!(r#"workbookPr date1904="{value}""#);
        let e = element(&content);
        assert_eq!(attr_bool(&e, b"date1904"), expected);
        assert_eq!(attr_bool(&e, b"missing"), None);
        assert!(attr_bool_default(&e, b"missing", true));
    }

    #[test]
    fn colour_references() {
        let e = element(r#"fgColor theme="4" tint="-0.25""#);
        let color = parse_color_attrs(&e);
        assert_eq!(color.rgb, None);
        assert_eq!(color.theme, Some(4));
        assert_eq!(color.tint, Some(-0.25));
        assert!(!color.auto);

        let e = element(r#"sz val="11""#);
        assert_eq!(attr_val(&e).as_deref(), Some("11"));
    }
}
