//! Workbook metadata - sheet list, active tab, date system and per-sheet
//! print areas from xl/workbook.xml.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::BufRead;
use tracing::warn;

use crate::cell_ref::parse_area_list;
use crate::types::CellRange;
use crate::xml_helpers::{attr_string, attr_u32};

use super::worksheet::SheetInfo;

const PRINT_AREA: &str = "_xlnm.Print_Area";

#[derive(Debug, Default)]
pub(super) struct WorkbookMeta {
    pub sheets: Vec<SheetInfo>,
    /// Zero-based index of the tab selected when the workbook was saved.
    pub active_tab: usize,
    pub date1904: bool,
    /// Print areas keyed by zero-based sheet index.
    pub print_areas: HashMap<usize, CellRange>,
}

struct DefinedNameBuilder {
    name: String,
    local_sheet_id: Option<u32>,
    value: String,
}

impl DefinedNameBuilder {
    fn from_element(e: &BytesStart<'_>) -> Self {
        Self {
            name: attr_string(e, b"name").unwrap_or_default(),
            local_sheet_id: attr_u32(e, b"localSheetId"),
            value: String::new(),
        }
    }
}

fn parse_sheet_element(
    e: &BytesStart<'_>,
    relationships: &HashMap<String, String>,
    sheet_index: usize,
) -> Option<SheetInfo> {
    let mut name = String::new();
    let mut r_id = String::new();

    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"name" => {
                name = attr
                    .unescape_value()
                    .map(|v| v.to_string())
                    .unwrap_or_default();
            }
            // r:id attribute (namespace prefixed)
            key if key.ends_with(b":id") || key == b"id" => {
                r_id = std::str::from_utf8(&attr.value).unwrap_or("").to_string();
            }
            _ => {}
        }
    }

    if name.is_empty() {
        return None;
    }

    let path = relationships.get(&r_id).cloned().unwrap_or_else(|| {
        let idx = sheet_index + 1;
        format!("xl/worksheets/sheet{idx}.xml")
    });

    Some(SheetInfo { name, path })
}

fn is_true(value: Option<String>) -> bool {
    value.is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Parse workbook.xml.
///
/// `relationships` maps relationship ids to worksheet part paths.
pub(super) fn parse_workbook_xml<B: BufRead>(
    reader: B,
    relationships: &HashMap<String, String>,
) -> crate::error::Result<WorkbookMeta> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut meta = WorkbookMeta::default();
    let mut current_defined_name: Option<DefinedNameBuilder> = None;
    let mut defined_names = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"sheet" => {
                    if let Some(info) = parse_sheet_element(e, relationships, meta.sheets.len()) {
                        meta.sheets.push(info);
                    }
                }
                b"workbookPr" => meta.date1904 = is_true(attr_string(e, b"date1904")),
                b"workbookView" => {
                    // only the first view counts
                    if let Some(tab) = attr_u32(e, b"activeTab") {
                        if meta.active_tab == 0 {
                            meta.active_tab = tab as usize;
                        }
                    }
                }
                b"definedName" => {
                    current_defined_name = Some(DefinedNameBuilder::from_element(e));
                }
                _ => {}
            },
            Event::Text(ref e) => {
                if let Some(builder) = current_defined_name.as_mut() {
                    builder.value.push_str(&e.unescape()?);
                }
            }
            Event::End(ref e) if e.local_name().as_ref() == b"definedName" => {
                if let Some(builder) = current_defined_name.take() {
                    defined_names.push(builder);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    for dn in defined_names {
        if dn.name != PRINT_AREA {
            continue;
        }
        let Some(sheet_id) = dn.local_sheet_id else {
            continue;
        };
        match parse_area_list(&dn.value) {
            Some(area) => {
                meta.print_areas.insert(sheet_id as usize, area);
            }
            None => warn!(formula = %dn.value, "ignoring unparseable print area"),
        }
    }

    if meta.active_tab >= meta.sheets.len() {
        meta.active_tab = 0;
    }

    Ok(meta)
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

    const WORKBOOK: &str = r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
  xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <workbookPr date1904="1"/>
  <bookViews><workbookView activeTab="1"/></bookViews>
  <sheets>
    <sheet name="First" sheetId="1" r:id="rId1"/>
    <sheet name="R&amp;D" sheetId="2" r:id="rId7"/>
  </sheets>
  <definedNames>
    <definedName name="_xlnm.Print_Area" localSheetId="1">'R&amp;D'!$B$2:$D$9,'R&amp;D'!$F$1:$F$3</definedName>
    <definedName name="Totals">First!$A$1</definedName>
    <definedName name="_xlnm.Print_Area" localSheetId="0">garbage</definedName>
  </definedNames>
</workbook>"#;

    #[test]
    fn reads_sheets_and_flags() {
        let rels = HashMap::from([("rId7".to_string(), "xl/worksheets/data.xml".to_string())]);
        let meta = parse_workbook_xml(WORKBOOK.as_bytes(), &rels).unwrap();
        assert_eq!(meta.sheets.len(), 2);
        assert_eq!(meta.sheets[0].path, "xl/worksheets/sheet1.xml");
        assert_eq!(meta.sheets[1].name, "R&D");
        assert_eq!(meta.sheets[1].path, "xl/worksheets/data.xml");
        assert_eq!(meta.active_tab, 1);
        assert!(meta.date1904);
    }

    #[test]
    fn print_area_is_union_of_areas() {
        let meta = parse_workbook_xml(WORKBOOK.as_bytes(), &HashMap::new()).unwrap();
        assert_eq!(meta.print_areas.get(&1), Some(&CellRange::new(1, 2, 9, 6)));
        assert_eq!(meta.print_areas.get(&0), None);
    }

    #[test]
    fn out_of_range_active_tab_falls_back_to_first() {
        let xml = r#"<workbook><bookViews><workbookView activeTab="5"/></bookViews>
<sheets><sheet name="Only" sheetId="1"/></sheets></workbook>"#;
        let meta = parse_workbook_xml(xml.as_bytes(), &HashMap::new()).unwrap();
        assert_eq!(meta.active_tab, 0);
        assert!(!meta.date1904);
    }
}
