//! Package parts around the worksheets - workbook relationships, shared
//! strings, theme colours and the stylesheet.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Seek};
use tracing::warn;
use zip::ZipArchive;

use crate::color::DEFAULT_THEME_COLORS;
use crate::styles::parse_styles;
use crate::types::StyleSheet;
use crate::xml_helpers::attr_string;

/// Paths of the parts referenced from xl/_rels/workbook.xml.rels, resolved
/// to full archive paths.
#[derive(Default, Debug)]
pub(super) struct WorkbookRelationships {
    /// rId -> part path, e.g. "rId1" -> "xl/worksheets/sheet1.xml"
    pub worksheets: HashMap<String, String>,
    pub shared_strings: Option<String>,
    pub styles: Option<String>,
    pub theme: Option<String>,
}

/// Resolve a relationship target to a path within the archive
fn resolve_relationship_path(target: &str) -> String {
    if let Some(stripped) = target.strip_prefix('/') {
        stripped.to_string()
    } else if target.starts_with("../") {
        let mut path = target;
        while let Some(stripped) = path.strip_prefix("../") {
            path = stripped;
        }
        path.to_string()
    } else {
        format!("xl/{target}")
    }
}

pub(super) fn parse_relationships_xml<B: BufRead>(reader: B) -> WorkbookRelationships {
    let mut rels = WorkbookRelationships::default();
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let id = attr_string(e, b"Id").unwrap_or_default();
                let target = attr_string(e, b"Target").unwrap_or_default();
                let rel_type = attr_string(e, b"Type").unwrap_or_default();
                if target.is_empty() {
                    buf.clear();
                    continue;
                }
                let full_path = resolve_relationship_path(&target);

                if rel_type.ends_with("/worksheet") && !id.is_empty() {
                    rels.worksheets.insert(id, full_path);
                } else if rel_type.ends_with("/sharedStrings") {
                    rels.shared_strings = Some(full_path);
                } else if rel_type.ends_with("/styles") {
                    rels.styles = Some(full_path);
                } else if rel_type.ends_with("/theme") {
                    rels.theme = Some(full_path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(error = %e, "malformed workbook relationships, using default part paths");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    rels
}

/// Parse xl/_rels/workbook.xml.rels. The part is optional.
pub(super) fn parse_workbook_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> WorkbookRelationships {
    match archive.by_name("xl/_rels/workbook.xml.rels") {
        Ok(file) => parse_relationships_xml(BufReader::new(file)),
        Err(_) => WorkbookRelationships::default(),
    }
}

/// Concatenate the `<t>` runs of every `<si>` entry.
pub(super) fn parse_shared_strings_xml<B: BufRead>(reader: B) -> Vec<String> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    // phonetic runs (<rPh>) hold a reading guide, not display text
    let mut in_phonetic = false;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::Text(ref e)) if in_t => {
                if let Ok(text) = e.unescape() {
                    current.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(std::mem::take(&mut current));
                    in_si = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(error = %e, parsed = strings.len(), "shared strings truncated");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    strings
}

pub(super) fn parse_shared_strings<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Vec<String> {
    let sst_path = path.unwrap_or("xl/sharedStrings.xml");
    match archive.by_name(sst_path) {
        Ok(file) => parse_shared_strings_xml(BufReader::new(file)),
        Err(_) => Vec::new(),
    }
}

/// Theme colour slots in SpreadsheetML index order.
const THEME_COLOR_ELEMENTS: [&[u8]; 12] = [
    b"lt1", b"dk1", b"lt2", b"dk2", b"accent1", b"accent2", b"accent3", b"accent4",
    b"accent5", b"accent6", b"hlink", b"folHlink",
];

/// Read the colour scheme of a theme part. Missing slots keep the Office
/// defaults.
pub(super) fn parse_theme_colors_xml<B: BufRead>(reader: B) -> Vec<String> {
    let mut colors: Vec<String> = DEFAULT_THEME_COLORS.iter().map(ToString::to_string).collect();
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut buf = Vec::new();
    let mut in_clr_scheme = false;
    let mut slot: Option<usize> = None;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => {
                let local_name = e.local_name();
                let name = local_name.as_ref();
                if name == b"clrScheme" {
                    in_clr_scheme = true;
                } else if in_clr_scheme {
                    if let Some(idx) = THEME_COLOR_ELEMENTS.iter().position(|n| *n == name) {
                        slot = Some(idx);
                    } else if let Some(idx) = slot {
                        let value = match name {
                            b"srgbClr" => attr_string(e, b"val"),
                            b"sysClr" => attr_string(e, b"lastClr"),
                            _ => None,
                        };
                        if let (Some(val), Some(color)) = (value, colors.get_mut(idx)) {
                            if val.len() == 6 {
                                *color = format!("#{}", val.to_ascii_uppercase());
                            }
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let local_name = e.local_name();
                if local_name.as_ref() == b"clrScheme" {
                    in_clr_scheme = false;
                } else if THEME_COLOR_ELEMENTS.contains(&local_name.as_ref()) {
                    slot = None;
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    colors
}

pub(super) fn parse_theme_colors<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> Vec<String> {
    let theme_path = path.unwrap_or("xl/theme/theme1.xml");
    match archive.by_name(theme_path) {
        Ok(file) => parse_theme_colors_xml(BufReader::new(file)),
        Err(_) => DEFAULT_THEME_COLORS.iter().map(ToString::to_string).collect(),
    }
}

/// Parse the stylesheet. A missing part yields the empty stylesheet; a
/// malformed one is logged and degrades to the same, so the sheet still
/// renders with default styling.
pub(super) fn parse_stylesheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: Option<&str>,
) -> StyleSheet {
    let styles_path = path.unwrap_or("xl/styles.xml");
    let Ok(file) = archive.by_name(styles_path) else {
        return StyleSheet::default();
    };
    match parse_styles(BufReader::new(file)) {
        Ok(stylesheet) => stylesheet,
        Err(e) => {
            warn!(path = styles_path, error = %e, "unreadable stylesheet, using default styles");
            StyleSheet::default()
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn relationship_targets_resolve_to_archive_paths() {
        let xml = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/other.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="../strings.xml"/>
  <Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/>
</Relationships>"#;
        let rels = parse_relationships_xml(xml.as_bytes());
        assert_eq!(rels.worksheets["rId1"], "xl/worksheets/sheet1.xml");
        assert_eq!(rels.worksheets["rId2"], "xl/worksheets/other.xml");
        assert_eq!(rels.styles.as_deref(), Some("xl/styles.xml"));
        assert_eq!(rels.shared_strings.as_deref(), Some("strings.xml"));
        assert_eq!(rels.theme.as_deref(), Some("xl/theme/theme1.xml"));
    }

    #[test]
    fn shared_strings_join_rich_runs() {
        let xml = r#"<sst>
  <si><t>plain</t></si>
  <si><r><t>bo</t></r><r><rPr><b/></rPr><t xml:space="preserve">ld </t></r></si>
  <si><t/></si>
  <si><t>漢字</t><rPh sb="0" eb="2"><t>かんじ</t></rPh></si>
  <si><t>a &amp; b</t></si>
</sst>"#;
        let strings = parse_shared_strings_xml(xml.as_bytes());
        assert_eq!(strings, vec!["plain", "bold ", "", "漢字", "a & b"]);
    }

    #[test]
    fn theme_colors_override_defaults() {
        let xml = r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
  <a:themeElements><a:clrScheme name="Custom">
    <a:dk1><a:sysClr val="windowText" lastClr="111111"/></a:dk1>
    <a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>
    <a:accent1><a:srgbClr val="ab0000"/></a:accent1>
  </a:clrScheme></a:themeElements>
</a:theme>"#;
        let colors = parse_theme_colors_xml(xml.as_bytes());
        assert_eq!(colors[0], "#FFFFFF");
        assert_eq!(colors[1], "#111111");
        assert_eq!(colors[4], "#AB0000");
        assert_eq!(colors[5], DEFAULT_THEME_COLORS[5]);
    }
}
