//! Worksheet parsing - reads one sheet part into a [`Worksheet`].

use quick_xml::events::{BytesText, Event};
use quick_xml::Reader;
use std::io::{BufRead, BufReader, Read};
use tracing::debug;
use zip::ZipArchive;

use crate::cell_ref::{parse_cell_range, parse_cell_ref_bytes};
use crate::error::Result;
use crate::types::{Cell, MergedRegion, Worksheet};
use crate::xml_helpers::{attr_f64, attr_string, attr_u32};

use super::styles::{resolve_cell_value, ResolvedStyles};

/// Sheet entry from workbook.xml, with its part path already resolved.
#[derive(Debug, Clone)]
pub(super) struct SheetInfo {
    pub name: String,
    pub path: String,
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Date,
    Default,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        b"d" => CellTypeTag::Date,
        _ => CellTypeTag::Default,
    }
}

pub(super) fn parse_u32_bytes(value: &[u8]) -> Option<u32> {
    let mut num: u32 = 0;
    let mut seen = false;
    for &b in value {
        if !b.is_ascii_digit() {
            return None;
        }
        seen = true;
        num = num.saturating_mul(10).saturating_add(u32::from(b - b'0'));
    }
    seen.then_some(num)
}

/// Shared state for building one sheet
pub(super) struct SheetContext<'a> {
    pub shared_strings: &'a [String],
    pub styles: &'a ResolvedStyles,
    pub date1904: bool,
}

/// Read the worksheet part named by `info` from the archive.
pub(super) fn parse_sheet<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    ctx: &SheetContext<'_>,
) -> Result<Worksheet> {
    let file = archive.by_name(&info.path)?;
    parse_sheet_xml(BufReader::new(file), &info.name, ctx)
}

fn text_of(text: &BytesText<'_>) -> Option<String> {
    let raw = text.as_ref();
    if raw.contains(&b'&') {
        text.unescape().ok().map(|s| s.to_string())
    } else {
        std::str::from_utf8(raw).ok().map(ToString::to_string)
    }
}

/// Parse worksheet XML. Column and row dimensions are kept in their
/// declared units; cells carry their resolved style.
#[allow(clippy::too_many_lines)]
pub(super) fn parse_sheet_xml<B: BufRead>(
    reader: B,
    name: &str,
    ctx: &SheetContext<'_>,
) -> Result<Worksheet> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let mut sheet = Worksheet::new(name);
    let mut buf = Vec::new();
    let mut cell_buf = Vec::new();
    let mut text_buf = Vec::new();

    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            ref event @ (Event::Start(_) | Event::Empty(_)) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let is_start_event = matches!(event, Event::Start(_));

                match e.local_name().as_ref() {
                    b"row" => {
                        let row = attr_u32(e, b"r");
                        if let (Some(row), Some(ht)) = (row, attr_f64(e, b"ht")) {
                            sheet.set_row_height(row, ht);
                        }
                    }

                    b"col" => {
                        let (Some(min), Some(max)) = (attr_u32(e, b"min"), attr_u32(e, b"max"))
                        else {
                            continue;
                        };
                        if let Some(width) = attr_f64(e, b"width") {
                            for col in min.max(1)..=max {
                                sheet.set_column_width(col, width);
                            }
                        }
                    }

                    b"c" => {
                        let mut position: Option<(u32, u32)> = None;
                        let mut cell_type = CellTypeTag::Default;
                        let mut style_idx: Option<u32> = None;

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"r" => position = parse_cell_ref_bytes(&attr.value),
                                b"t" => cell_type = parse_cell_type_tag(&attr.value),
                                b"s" => style_idx = parse_u32_bytes(&attr.value),
                                _ => {}
                            }
                        }

                        // <c r="A1"/> has no children
                        let mut value: Option<String> = None;
                        if is_start_event {
                            loop {
                                cell_buf.clear();
                                match xml.read_event_into(&mut cell_buf)? {
                                    Event::Start(ref inner) => {
                                        let inner_name = inner.local_name();
                                        let inner_name = inner_name.as_ref();
                                        if inner_name == b"v" || inner_name == b"t" {
                                            text_buf.clear();
                                            if let Event::Text(text) =
                                                xml.read_event_into(&mut text_buf)?
                                            {
                                                value = text_of(&text);
                                            }
                                        } else if inner_name == b"is" {
                                            value = Some(read_inline_string(&mut xml)?);
                                        }
                                    }
                                    Event::End(ref inner)
                                        if inner.local_name().as_ref() == b"c" =>
                                    {
                                        break;
                                    }
                                    Event::Eof => break,
                                    _ => {}
                                }
                            }
                        }

                        let Some((col, row)) = position else {
                            debug!(sheet = name, "skipping cell without a valid reference");
                            continue;
                        };

                        let value = resolve_cell_value(
                            value.as_deref(),
                            cell_type,
                            ctx.shared_strings,
                            ctx.styles.is_date(style_idx),
                            ctx.date1904,
                        );
                        // Bare placeholders carry nothing worth rendering
                        if value.is_none() && style_idx.is_none() {
                            continue;
                        }
                        sheet.set_cell(
                            row,
                            col,
                            Cell {
                                value,
                                style: ctx.styles.style(style_idx),
                            },
                        );
                    }

                    b"mergeCell" => {
                        let Some(range_ref) = attr_string(e, b"ref") else {
                            continue;
                        };
                        match parse_cell_range(&range_ref) {
                            Some(range) => {
                                if sheet
                                    .merges
                                    .iter()
                                    .any(|m| m.range().intersect(&range).is_some())
                                {
                                    debug!(
                                        sheet = name,
                                        range = %range_ref,
                                        "ignoring overlapping merge"
                                    );
                                } else {
                                    sheet.merges.push(MergedRegion::from_range(range));
                                }
                            }
                            None => {
                                debug!(
                                    sheet = name,
                                    range = %range_ref,
                                    "ignoring unparseable merge"
                                );
                            }
                        }
                    }

                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheet)
}

/// Concatenate every `<t>` run inside an `<is>` element.
fn read_inline_string<B: BufRead>(xml: &mut Reader<B>) -> Result<String> {
    let mut out = String::new();
    let mut buf = Vec::new();
    let mut in_t = false;
    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) if e.local_name().as_ref() == b"t" => in_t = true,
            Event::Text(ref text) if in_t => {
                if let Some(s) = text_of(text) {
                    out.push_str(&s);
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"t" => in_t = false,
                b"is" => break,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
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
    use crate::styles::parse_styles;
    use crate::types::{CellRange, CellValue};

    const STYLES: &str = r#"<styleSheet>
  <numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy-mm-dd"/></numFmts>
  <fonts><font><sz val="11"/></font><font><b/><sz val="14"/></font></fonts>
  <fills><fill><patternFill patternType="none"/></fill></fills>
  <borders><border/></borders>
  <cellXfs>
    <xf fontId="0" fillId="0" borderId="0"/>
    <xf fontId="1" fillId="0" borderId="0"/>
    <xf numFmtId="164" fontId="0" fillId="0" borderId="0"/>
  </cellXfs>
</styleSheet>"#;

    const SHEET: &str = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <cols>
    <col min="1" max="1" width="20"/>
    <col min="2" max="3" width="4.5" customWidth="1"/>
    <col min="4" max="4" style="1"/>
  </cols>
  <sheetData>
    <row r="1" ht="30" customHeight="1">
      <c r="A1" t="s"><v>0</v></c>
      <c r="B1" s="1"><v>42.5</v></c>
      <c r="C1" t="inlineStr"><is><t>in</t><t>line</t></is></c>
    </row>
    <row r="2">
      <c r="A2" t="b"><v>1</v></c>
      <c r="B2" s="2"><v>45292</v></c>
      <c r="C2"/>
      <c r="D2" s="1"/>
      <c r="E2" t="str"><f>A1</f><v>R&amp;D</v></c>
    </row>
  </sheetData>
  <mergeCells count="2"><mergeCell ref="A3:B4"/><mergeCell ref="B4:C5"/></mergeCells>
</worksheet>"#;

    fn parse() -> Worksheet {
        let ss = parse_styles(STYLES.as_bytes()).unwrap();
        let styles = ResolvedStyles::new(&ss, &[]);
        let sst = vec!["Header".to_string()];
        let ctx = SheetContext {
            shared_strings: &sst,
            styles: &styles,
            date1904: false,
        };
        parse_sheet_xml(SHEET.as_bytes(), "Data", &ctx).unwrap()
    }

    #[test]
    fn reads_dimensions() {
        let ws = parse();
        assert_eq!(ws.col_widths.get(&1), Some(&20.0));
        assert_eq!(ws.col_widths.get(&3), Some(&4.5));
        assert_eq!(ws.col_widths.get(&4), None);
        assert_eq!(ws.row_heights.get(&1), Some(&30.0));
        assert_eq!(ws.row_heights.get(&2), None);
    }

    #[test]
    fn reads_cell_values() {
        let ws = parse();
        let value = |r, c| ws.cells.get(&(r, c)).and_then(|cell| cell.value.clone());
        assert_eq!(value(1, 1), Some(CellValue::Text("Header".into())));
        assert_eq!(value(1, 2), Some(CellValue::Number(42.5)));
        assert_eq!(value(1, 3), Some(CellValue::Text("inline".into())));
        assert_eq!(value(2, 1), Some(CellValue::Boolean(true)));
        assert_eq!(
            value(2, 2),
            Some(CellValue::DateTime {
                serial: 45292.0,
                date1904: false
            })
        );
        assert_eq!(value(2, 5), Some(CellValue::Text("R&D".into())));
        // bare placeholder dropped, styled empty cell kept
        assert!(!ws.cells.contains_key(&(2, 3)));
        assert!(ws.cells.contains_key(&(2, 4)));
    }

    #[test]
    fn unstyled_cells_use_the_normal_style() {
        let ws = parse();
        let plain = ws.cells.get(&(1, 1)).unwrap().style.as_ref().unwrap();
        assert_eq!(plain.font.as_ref().unwrap().size, Some(11.0));
        let bold = ws.cells.get(&(1, 2)).unwrap().style.as_ref().unwrap();
        assert!(bold.font.as_ref().unwrap().bold);
    }

    #[test]
    fn overlapping_merges_keep_the_first() {
        let ws = parse();
        assert_eq!(ws.merges.len(), 1);
        assert_eq!(ws.merges[0].range(), CellRange::new(3, 1, 4, 2));
        assert_eq!(ws.used_range(), Some(CellRange::new(1, 1, 4, 5)));
    }

    #[test]
    fn cell_type_tags() {
        assert_eq!(parse_cell_type_tag(b"s"), CellTypeTag::Shared);
        assert_eq!(parse_cell_type_tag(b"n"), CellTypeTag::Default);
        assert_eq!(parse_u32_bytes(b"17"), Some(17));
        assert_eq!(parse_u32_bytes(b""), None);
        assert_eq!(parse_u32_bytes(b"1a"), None);
    }
}
