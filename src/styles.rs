//! Parsing of xl/styles.xml
//!
//! Only the parts that reach the page are kept: fonts (face and size), pattern
//! fills, border line styles, cell formats (xf) and their alignment, custom
//! number formats and the custom indexed palette.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::BufRead;

use crate::error::Result;
use crate::types::{CellXf, RawAlignment, RawBorder, RawBorderSide, RawFill, RawFont, StyleSheet};
use crate::xml_helpers::{
    attr_bool, attr_bool_default, attr_string, attr_u32, attr_val, parse_color_attrs,
};

/// Parse styles.xml content
#[allow(clippy::too_many_lines)]
#[allow(clippy::cognitive_complexity)]
pub fn parse_styles<R: BufRead>(reader: R) -> Result<StyleSheet> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut stylesheet = StyleSheet::default();
    let mut buf = Vec::new();

    // State tracking
    let mut in_fonts = false;
    let mut in_fills = false;
    let mut in_borders = false;
    let mut in_cell_xfs = false;
    let mut in_cell_style_xfs = false;
    let mut in_num_fmts = false;
    let mut in_indexed_colors = false;
    // dxfs reuse font/fill/border element names; they never apply to plain cells
    let mut in_dxfs = false;

    let mut current_font: Option<RawFont> = None;
    let mut current_fill: Option<RawFill> = None;
    let mut current_border: Option<RawBorder> = None;
    let mut current_xf: Option<CellXf> = None;
    let mut indexed_colors: Vec<String> = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(ref e) | Event::Empty(ref e))) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = e.local_name();
                let name_str = std::str::from_utf8(name.as_ref()).unwrap_or("");

                match name_str {
                    "dxfs" => in_dxfs = !is_empty,
                    _ if in_dxfs => {}

                    "numFmts" => in_num_fmts = true,
                    "fonts" => in_fonts = true,
                    "fills" => in_fills = true,
                    "borders" => in_borders = true,
                    "cellXfs" => in_cell_xfs = true,
                    "cellStyleXfs" => in_cell_style_xfs = true,
                    "indexedColors" => in_indexed_colors = true,

                    "rgbColor" if in_indexed_colors => {
                        if let Some(rgb) = attr_string(e, b"rgb") {
                            let rgb = if rgb.len() == 8 {
                                rgb.get(2..).unwrap_or(&rgb).to_string()
                            } else {
                                rgb
                            };
                            indexed_colors.push(format!("#{rgb}"));
                        }
                    }

                    "numFmt" if in_num_fmts => {
                        let id = attr_u32(e, b"numFmtId").unwrap_or(0);
                        let code = attr_string(e, b"formatCode").unwrap_or_default();
                        stylesheet.num_fmts.push((id, code));
                    }

                    "font" if in_fonts => {
                        if is_empty {
                            stylesheet.fonts.push(RawFont::default());
                        } else {
                            current_font = Some(RawFont::default());
                        }
                    }

                    "sz" => {
                        if let Some(ref mut font) = current_font {
                            font.size = attr_val(e).and_then(|s| s.parse().ok());
                        }
                    }

                    // <b/> means bold; <b val="0"/> switches it off
                    "b" => {
                        if let Some(ref mut font) = current_font {
                            font.bold = attr_bool_default(e, b"val", true);
                        }
                    }

                    "i" => {
                        if let Some(ref mut font) = current_font {
                            font.italic = attr_bool_default(e, b"val", true);
                        }
                    }

                    "fill" if in_fills => {
                        if is_empty {
                            stylesheet.fills.push(RawFill::default());
                        } else {
                            current_fill = Some(RawFill::default());
                        }
                    }

                    "patternFill" => {
                        if let Some(ref mut fill) = current_fill {
                            fill.pattern_type = attr_string(e, b"patternType");
                        }
                    }

                    "fgColor" => {
                        if let Some(ref mut fill) = current_fill {
                            fill.fg_color = Some(parse_color_attrs(e));
                        }
                    }

                    "bgColor" => {
                        if let Some(ref mut fill) = current_fill {
                            fill.bg_color = Some(parse_color_attrs(e));
                        }
                    }

                    "border" if in_borders => {
                        if is_empty {
                            stylesheet.borders.push(RawBorder::default());
                        } else {
                            current_border = Some(RawBorder::default());
                        }
                    }

                    "left" | "right" | "top" | "bottom" | "start" | "end" => {
                        if let Some(ref mut border) = current_border {
                            // A side without a style attribute draws nothing
                            if let Some(style) =
                                attr_string(e, b"style").filter(|s| !s.is_empty())
                            {
                                let side = Some(RawBorderSide { style });
                                match name_str {
                                    "left" | "start" => border.left = side,
                                    "right" | "end" => border.right = side,
                                    "top" => border.top = side,
                                    _ => border.bottom = side,
                                }
                            }
                        }
                    }

                    "xf" if in_cell_xfs || in_cell_style_xfs => {
                        let xf = CellXf {
                            font_id: attr_u32(e, b"fontId"),
                            fill_id: attr_u32(e, b"fillId"),
                            border_id: attr_u32(e, b"borderId"),
                            num_fmt_id: attr_u32(e, b"numFmtId"),
                            xf_id: attr_u32(e, b"xfId"),
                            apply_font: attr_bool(e, b"applyFont").unwrap_or(true),
                            apply_fill: attr_bool(e, b"applyFill").unwrap_or(true),
                            apply_border: attr_bool(e, b"applyBorder").unwrap_or(true),
                            apply_alignment: attr_bool(e, b"applyAlignment").unwrap_or(true),
                            alignment: None,
                        };

                        // Self-closing <xf .../> has no End event
                        if is_empty {
                            if in_cell_xfs {
                                stylesheet.cell_xfs.push(xf);
                            } else {
                                stylesheet.cell_style_xfs.push(xf);
                            }
                        } else {
                            current_xf = Some(xf);
                        }
                    }

                    "alignment" => {
                        if let Some(ref mut xf) = current_xf {
                            xf.alignment = Some(RawAlignment {
                                horizontal: attr_string(e, b"horizontal"),
                                vertical: attr_string(e, b"vertical"),
                            });
                        }
                    }

                    _ => {}
                }
            }

            Ok(Event::End(ref e)) => {
                let name = e.local_name();
                let name_str = std::str::from_utf8(name.as_ref()).unwrap_or("");

                match name_str {
                    "dxfs" => in_dxfs = false,
                    _ if in_dxfs => {}

                    "numFmts" => in_num_fmts = false,
                    "fonts" => in_fonts = false,
                    "fills" => in_fills = false,
                    "borders" => in_borders = false,
                    "cellXfs" => in_cell_xfs = false,
                    "cellStyleXfs" => in_cell_style_xfs = false,
                    "indexedColors" => in_indexed_colors = false,

                    "font" => {
                        if let Some(font) = current_font.take() {
                            stylesheet.fonts.push(font);
                        }
                    }

                    "fill" => {
                        if let Some(fill) = current_fill.take() {
                            stylesheet.fills.push(fill);
                        }
                    }

                    "border" => {
                        if let Some(border) = current_border.take() {
                            stylesheet.borders.push(border);
                        }
                    }

                    "xf" if in_cell_xfs => {
                        if let Some(xf) = current_xf.take() {
                            stylesheet.cell_xfs.push(xf);
                        }
                    }

                    "xf" if in_cell_style_xfs => {
                        if let Some(xf) = current_xf.take() {
                            stylesheet.cell_style_xfs.push(xf);
                        }
                    }

                    _ => {}
                }
            }

            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }

        buf.clear();
    }

    if !indexed_colors.is_empty() {
        stylesheet.indexed_colors = Some(indexed_colors);
    }

    // The "Normal" style (cellStyleXfs[0]) carries the workbook's default font
    stylesheet.default_font = stylesheet
        .cell_style_xfs
        .first()
        .and_then(|xf| xf.font_id)
        .and_then(|id| stylesheet.fonts.get(id as usize))
        .cloned();

    Ok(stylesheet)
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

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy/mm/dd"/></numFmts>
  <fonts count="2">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><b/><i val="0"/><sz val="14"/><name val="Arial"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border><left style="thin"><color auto="1"/></left><right/><top style="double"/><bottom/></border>
  </borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="2">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="164" fontId="1" fillId="2" borderId="1" xfId="0" applyAlignment="1">
      <alignment horizontal="center" vertical="top"/>
    </xf>
  </cellXfs>
  <dxfs count="1"><dxf><font><b/></font><fill><patternFill><bgColor rgb="FFFF0000"/></patternFill></fill></dxf></dxfs>
  <colors><indexedColors><rgbColor rgb="FF010203"/></indexedColors></colors>
</styleSheet>"#;

    #[test]
    fn parses_components() {
        let ss = parse_styles(STYLES.as_bytes()).unwrap();
        assert_eq!(ss.num_fmts, vec![(164, "yyyy/mm/dd".to_string())]);

        assert_eq!(ss.fonts.len(), 2);
        assert_eq!(ss.fonts[1].size, Some(14.0));
        assert!(ss.fonts[1].bold);
        assert!(!ss.fonts[1].italic);

        // dxf fill must not leak into the cell fills
        assert_eq!(ss.fills.len(), 3);
        assert_eq!(ss.fills[2].pattern_type.as_deref(), Some("solid"));
        assert_eq!(
            ss.fills[2].fg_color.as_ref().unwrap().rgb.as_deref(),
            Some("FFFFFF00")
        );

        assert_eq!(ss.borders.len(), 2);
        assert!(ss.borders[0].left.is_none());
        assert_eq!(ss.borders[1].left.as_ref().unwrap().style, "thin");
        assert_eq!(ss.borders[1].top.as_ref().unwrap().style, "double");
        assert!(ss.borders[1].bottom.is_none());

        assert_eq!(ss.cell_xfs.len(), 2);
        let xf = &ss.cell_xfs[1];
        assert_eq!(xf.num_fmt_id, Some(164));
        let align = xf.alignment.as_ref().unwrap();
        assert_eq!(align.horizontal.as_deref(), Some("center"));
        assert_eq!(align.vertical.as_deref(), Some("top"));

        assert_eq!(ss.indexed_colors, Some(vec!["#010203".to_string()]));
        assert_eq!(ss.default_font.unwrap().size, Some(11.0));
    }

    #[test]
    fn empty_stylesheet() {
        let ss = parse_styles(&b"<styleSheet/>"[..]).unwrap();
        assert!(ss.cell_xfs.is_empty());
        assert!(ss.default_font.is_none());
    }
}
