//! Test fixtures for generating valid XLSX files in memory.
//!
//! This module provides builders for creating XLSX files programmatically,
//! useful for testing the reader and renderers with known inputs.
//!
//! # Example
//!
//! ```rust
//! use fixtures::{XlsxBuilder, StyleBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .add_sheet("Sheet1")
//!     .add_cell("A1", "Hello", Some(StyleBuilder::new().bold().build()))
//!     .add_cell("B1", 42.0, None)
//!     .add_merge("A2:B2")
//!     .build();
//!
//! let sheet = xlpage::parser::parse_active_sheet(&xlsx).unwrap();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation,
    clippy::cast_lossless
)]

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

// ============================================================================
// Style Builder
// ============================================================================

/// Builder for creating cell styles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleBuilder {
    // Font properties
    pub font_size: Option<f64>,
    pub bold: bool,
    pub italic: bool,

    // Fill properties
    pub bg_color: Option<String>,
    pub pattern_type: Option<String>,
    pub theme_fill: Option<(u32, Option<f64>)>,

    // Border properties
    pub border_top: Option<String>,
    pub border_right: Option<String>,
    pub border_bottom: Option<String>,
    pub border_left: Option<String>,

    // Alignment properties
    pub align_horizontal: Option<String>,
    pub align_vertical: Option<String>,

    // Number format
    pub number_format: Option<String>,
}

impl StyleBuilder {
    /// Create a new empty style builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the font size in points.
    #[must_use]
    pub fn font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Set a solid background colour (`#RRGGBB` or `AARRGGBB`).
    #[must_use]
    pub fn bg_color(mut self, color: &str) -> Self {
        self.bg_color = Some(normalize_color(color));
        self
    }

    /// Set a solid background from a theme slot with an optional tint.
    #[must_use]
    pub fn theme_fill(mut self, theme: u32, tint: Option<f64>) -> Self {
        self.theme_fill = Some((theme, tint));
        self
    }

    /// Set the fill pattern type (e.g. "solid", "none", "gray125").
    #[must_use]
    pub fn pattern(mut self, pattern_type: &str) -> Self {
        self.pattern_type = Some(pattern_type.to_string());
        self
    }

    /// Apply the same border style to all four sides.
    #[must_use]
    pub fn border_all(mut self, style: &str) -> Self {
        self.border_top = Some(style.to_string());
        self.border_right = Some(style.to_string());
        self.border_bottom = Some(style.to_string());
        self.border_left = Some(style.to_string());
        self
    }

    #[must_use]
    pub fn border_top(mut self, style: &str) -> Self {
        self.border_top = Some(style.to_string());
        self
    }

    #[must_use]
    pub fn border_left(mut self, style: &str) -> Self {
        self.border_left = Some(style.to_string());
        self
    }

    /// Set horizontal alignment (left, center, right, justify, ...).
    #[must_use]
    pub fn align_horizontal(mut self, align: &str) -> Self {
        self.align_horizontal = Some(align.to_string());
        self
    }

    /// Set vertical alignment (top, center, bottom, ...).
    #[must_use]
    pub fn align_vertical(mut self, align: &str) -> Self {
        self.align_vertical = Some(align.to_string());
        self
    }

    /// Set the number format code.
    #[must_use]
    pub fn number_format(mut self, format: &str) -> Self {
        self.number_format = Some(format.to_string());
        self
    }

    /// Finalize the style (for API consistency).
    #[must_use]
    pub fn build(self) -> Self {
        self
    }
}

// ============================================================================
// Cell Value
// ============================================================================

/// Cell value types as they are written to the sheet XML.
#[derive(Debug, Clone)]
pub enum CellValue {
    /// A shared string.
    String(String),
    Number(f64),
    Boolean(bool),
    /// An error value (e.g., "#DIV/0!").
    Error(String),
    /// An inline string (not shared).
    InlineString(String),
    /// An empty cell (style only).
    Empty,
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: CellValue,
    pub style: Option<StyleBuilder>,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    pub merges: Vec<String>,
    pub col_widths: Vec<(u32, u32, f64)>,
    pub row_heights: BTreeMap<u32, f64>,
    pub print_area: Option<String>,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Add a cell with a value and optional style.
    #[must_use]
    pub fn cell<V: Into<CellValue>>(
        mut self,
        cell_ref: &str,
        value: V,
        style: Option<StyleBuilder>,
    ) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style,
        });
        self
    }

    /// Add an empty cell with only a style.
    #[must_use]
    pub fn styled_cell(mut self, cell_ref: &str, style: StyleBuilder) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: CellValue::Empty,
            style: Some(style),
        });
        self
    }

    /// Add a merge range (e.g., "A1:B2").
    #[must_use]
    pub fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_string());
        self
    }

    /// Set column width (character units) for columns `min..=max`.
    #[must_use]
    pub fn col_width(mut self, min: u32, max: u32, width: f64) -> Self {
        self.col_widths.push((min, max, width));
        self
    }

    /// Set a row height in points.
    #[must_use]
    pub fn row_height(mut self, row: u32, height: f64) -> Self {
        self.row_heights.insert(row, height);
        self
    }

    /// Declare a print area, written as a sheet-scoped `_xlnm.Print_Area`.
    /// Pass the defined-name text without the sheet prefix, e.g. `"$A$1:$C$4"`.
    #[must_use]
    pub fn print_area(mut self, area: &str) -> Self {
        self.print_area = Some(area.to_string());
        self
    }
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for creating complete XLSX files.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
    theme_colors: Option<Vec<String>>,
    active_tab: Option<usize>,
    date1904: bool,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Add a simple sheet by name (returns a builder for chaining).
    #[must_use]
    pub fn add_sheet(self, name: &str) -> XlsxSheetAdder {
        XlsxSheetAdder {
            builder: self,
            sheet: SheetBuilder::new(name),
        }
    }

    /// Set custom theme colors.
    #[must_use]
    pub fn theme_colors(mut self, colors: Vec<String>) -> Self {
        self.theme_colors = Some(colors);
        self
    }

    /// Mark a sheet as the selected tab.
    #[must_use]
    pub fn active_tab(mut self, index: usize) -> Self {
        self.active_tab = Some(index);
        self
    }

    #[must_use]
    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let cursor = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(cursor);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut styles_collector = StylesCollector::new();
        let mut shared_strings: Vec<String> = Vec::new();

        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let Some(ref style) = cell.style {
                    styles_collector.add_style(style);
                }
                if let CellValue::String(ref s) = cell.value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        let mut part = |name: &str, body: String| {
            zip.start_file(name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        };

        part(
            "[Content_Types].xml",
            generate_content_types(self.sheets.len()),
        );
        part("_rels/.rels", generate_rels());
        part(
            "xl/_rels/workbook.xml.rels",
            generate_workbook_rels(self.sheets.len()),
        );
        part("xl/workbook.xml", self.generate_workbook());
        part("xl/styles.xml", styles_collector.generate_styles_xml());
        if !shared_strings.is_empty() {
            part(
                "xl/sharedStrings.xml",
                generate_shared_strings(&shared_strings),
            );
        }
        part(
            "xl/theme/theme1.xml",
            generate_theme(self.theme_colors.as_deref()),
        );
        for (i, sheet) in self.sheets.iter().enumerate() {
            part(
                &format!("xl/worksheets/sheet{}.xml", i + 1),
                generate_sheet_xml(sheet, &shared_strings, &styles_collector),
            );
        }

        zip.finish().expect("Failed to finish ZIP").into_inner()
    }

    fn generate_workbook(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
        if self.date1904 {
            xml.push_str(r#"<workbookPr date1904="1"/>"#);
        }
        if let Some(tab) = self.active_tab {
            xml.push_str(&format!(
                r#"<bookViews><workbookView activeTab="{tab}"/></bookViews>"#
            ));
        }

        xml.push_str("<sheets>");
        for (i, sheet) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(&sheet.name),
                i + 1,
                i + 1
            ));
        }
        xml.push_str("</sheets>");

        let print_areas: Vec<_> = self
            .sheets
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.print_area.as_ref().map(|area| (i, &s.name, area)))
            .collect();
        if !print_areas.is_empty() {
            xml.push_str("<definedNames>");
            for (i, name, area) in print_areas {
                let quoted = format!("'{}'", name.replace('\'', "''"));
                let value = area
                    .split(',')
                    .map(|a| format!("{quoted}!{a}"))
                    .collect::<Vec<_>>()
                    .join(",");
                xml.push_str(&format!(
                    r#"<definedName name="_xlnm.Print_Area" localSheetId="{i}">{}</definedName>"#,
                    escape_xml(&value)
                ));
            }
            xml.push_str("</definedNames>");
        }

        xml.push_str("</workbook>");
        xml
    }
}

/// Helper for fluent sheet building within `XlsxBuilder`.
pub struct XlsxSheetAdder {
    builder: XlsxBuilder,
    sheet: SheetBuilder,
}

impl XlsxSheetAdder {
    #[must_use]
    pub fn add_cell<V: Into<CellValue>>(
        mut self,
        cell_ref: &str,
        value: V,
        style: Option<StyleBuilder>,
    ) -> Self {
        self.sheet = self.sheet.cell(cell_ref, value, style);
        self
    }

    #[must_use]
    pub fn add_merge(mut self, range: &str) -> Self {
        self.sheet = self.sheet.merge(range);
        self
    }

    /// Finish the current sheet and return the builder.
    #[must_use]
    pub fn done(mut self) -> XlsxBuilder {
        self.builder.sheets.push(self.sheet);
        self.builder
    }

    /// Build the XLSX directly (finishes the current sheet automatically).
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.done().build()
    }
}

// ============================================================================
// Styles Collector
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct FontDef {
    size: f64,
    bold: bool,
    italic: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum FillColor {
    Rgb(String),
    Theme(u32, Option<f64>),
}

#[derive(Debug, Clone, PartialEq)]
struct FillDef {
    pattern_type: String,
    fg_color: Option<FillColor>,
}

type BorderDef = [Option<String>; 4];

#[derive(Debug, Clone)]
struct CellXfDef {
    font_id: usize,
    fill_id: usize,
    border_id: usize,
    num_fmt_id: Option<u32>,
    alignment: Option<(Option<String>, Option<String>)>,
}

/// Collects and deduplicates styles for the XLSX file.
#[derive(Debug)]
struct StylesCollector {
    fonts: Vec<FontDef>,
    fills: Vec<FillDef>,
    borders: Vec<BorderDef>,
    num_fmts: Vec<(u32, String)>,
    cell_xfs: Vec<CellXfDef>,
    style_map: Vec<(StyleBuilder, usize)>,
}

fn intern<T: PartialEq>(items: &mut Vec<T>, item: T) -> usize {
    if let Some(i) = items.iter().position(|x| *x == item) {
        return i;
    }
    items.push(item);
    items.len() - 1
}

impl StylesCollector {
    fn new() -> Self {
        Self {
            // Calibri 11 is the workbook default font
            fonts: vec![FontDef {
                size: 11.0,
                bold: false,
                italic: false,
            }],
            // none and gray125 are required
            fills: vec![
                FillDef {
                    pattern_type: "none".to_string(),
                    fg_color: None,
                },
                FillDef {
                    pattern_type: "gray125".to_string(),
                    fg_color: None,
                },
            ],
            borders: vec![Default::default()],
            num_fmts: Vec::new(),
            cell_xfs: vec![CellXfDef {
                font_id: 0,
                fill_id: 0,
                border_id: 0,
                num_fmt_id: None,
                alignment: None,
            }],
            style_map: Vec::new(),
        }
    }

    fn add_style(&mut self, style: &StyleBuilder) -> usize {
        if let Some(idx) = self.style_index(style) {
            return idx;
        }

        let font_id = intern(
            &mut self.fonts,
            FontDef {
                size: style.font_size.unwrap_or(11.0),
                bold: style.bold,
                italic: style.italic,
            },
        );

        let fg_color = match (&style.bg_color, style.theme_fill) {
            (Some(rgb), _) => Some(FillColor::Rgb(rgb.clone())),
            (None, Some((theme, tint))) => Some(FillColor::Theme(theme, tint)),
            (None, None) => None,
        };
        let fill_id = if fg_color.is_none() && style.pattern_type.is_none() {
            0
        } else {
            intern(
                &mut self.fills,
                FillDef {
                    pattern_type: style
                        .pattern_type
                        .clone()
                        .unwrap_or_else(|| "solid".to_string()),
                    fg_color,
                },
            )
        };

        let border: BorderDef = [
            style.border_left.clone(),
            style.border_right.clone(),
            style.border_top.clone(),
            style.border_bottom.clone(),
        ];
        let border_id = intern(&mut self.borders, border);

        let num_fmt_id = style.number_format.as_ref().map(|format| {
            get_builtin_format_id(format).unwrap_or_else(|| {
                if let Some((id, _)) = self.num_fmts.iter().find(|(_, code)| code == format) {
                    return *id;
                }
                let id = 164 + self.num_fmts.len() as u32;
                self.num_fmts.push((id, format.clone()));
                id
            })
        });

        let alignment = (style.align_horizontal.is_some() || style.align_vertical.is_some())
            .then(|| (style.align_horizontal.clone(), style.align_vertical.clone()));

        self.cell_xfs.push(CellXfDef {
            font_id,
            fill_id,
            border_id,
            num_fmt_id,
            alignment,
        });
        let idx = self.cell_xfs.len() - 1;
        self.style_map.push((style.clone(), idx));
        idx
    }

    fn style_index(&self, style: &StyleBuilder) -> Option<usize> {
        self.style_map
            .iter()
            .find(|(existing, _)| existing == style)
            .map(|(_, idx)| *idx)
    }

    fn generate_styles_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !self.num_fmts.is_empty() {
            xml.push_str(&format!(r#"<numFmts count="{}">"#, self.num_fmts.len()));
            for (id, code) in &self.num_fmts {
                xml.push_str(&format!(
                    r#"<numFmt numFmtId="{}" formatCode="{}"/>"#,
                    id,
                    escape_xml(code)
                ));
            }
            xml.push_str("</numFmts>");
        }

        xml.push_str(&format!(r#"<fonts count="{}">"#, self.fonts.len()));
        for font in &self.fonts {
            xml.push_str("<font>");
            if font.bold {
                xml.push_str("<b/>");
            }
            if font.italic {
                xml.push_str("<i/>");
            }
            xml.push_str(&format!(r#"<sz val="{}"/><name val="Calibri"/>"#, font.size));
            xml.push_str("</font>");
        }
        xml.push_str("</fonts>");

        xml.push_str(&format!(r#"<fills count="{}">"#, self.fills.len()));
        for fill in &self.fills {
            xml.push_str(&format!(
                r#"<fill><patternFill patternType="{}">"#,
                fill.pattern_type
            ));
            match &fill.fg_color {
                Some(FillColor::Rgb(rgb)) => xml.push_str(&format!(r#"<fgColor rgb="{rgb}"/>"#)),
                Some(FillColor::Theme(theme, Some(tint))) => {
                    xml.push_str(&format!(r#"<fgColor theme="{theme}" tint="{tint}"/>"#));
                }
                Some(FillColor::Theme(theme, None)) => {
                    xml.push_str(&format!(r#"<fgColor theme="{theme}"/>"#));
                }
                None => {}
            }
            xml.push_str("</patternFill></fill>");
        }
        xml.push_str("</fills>");

        xml.push_str(&format!(r#"<borders count="{}">"#, self.borders.len()));
        for border in &self.borders {
            xml.push_str("<border>");
            for (name, side) in ["left", "right", "top", "bottom"].iter().zip(border) {
                xml.push_str(&format_border_side(name, side.as_deref()));
            }
            xml.push_str("<diagonal/></border>");
        }
        xml.push_str("</borders>");

        xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);

        xml.push_str(&format!(r#"<cellXfs count="{}">"#, self.cell_xfs.len()));
        for xf in &self.cell_xfs {
            let mut attrs = format!(
                r#"numFmtId="{}" fontId="{}" fillId="{}" borderId="{}" xfId="0""#,
                xf.num_fmt_id.unwrap_or(0),
                xf.font_id,
                xf.fill_id,
                xf.border_id
            );
            if xf.num_fmt_id.is_some() {
                attrs.push_str(r#" applyNumberFormat="1""#);
            }
            if xf.font_id > 0 {
                attrs.push_str(r#" applyFont="1""#);
            }
            if xf.fill_id > 0 {
                attrs.push_str(r#" applyFill="1""#);
            }
            if xf.border_id > 0 {
                attrs.push_str(r#" applyBorder="1""#);
            }

            match &xf.alignment {
                Some((horizontal, vertical)) => {
                    xml.push_str(&format!(r#"<xf {attrs} applyAlignment="1"><alignment"#));
                    if let Some(h) = horizontal {
                        xml.push_str(&format!(r#" horizontal="{h}""#));
                    }
                    if let Some(v) = vertical {
                        xml.push_str(&format!(r#" vertical="{v}""#));
                    }
                    xml.push_str("/></xf>");
                }
                None => xml.push_str(&format!("<xf {attrs}/>")),
            }
        }
        xml.push_str("</cellXfs>");

        xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
        xml.push_str("</styleSheet>");
        xml
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Normalize color to ARGB format (without #).
fn normalize_color(color: &str) -> String {
    let color = color.trim_start_matches('#');
    if color.len() == 8 {
        color.to_uppercase()
    } else {
        format!("FF{}", color.to_uppercase())
    }
}

/// Get built-in number format ID.
fn get_builtin_format_id(format: &str) -> Option<u32> {
    match format {
        "General" => Some(0),
        "0" => Some(1),
        "0.00" => Some(2),
        "#,##0" => Some(3),
        "#,##0.00" => Some(4),
        "0%" => Some(9),
        "0.00%" => Some(10),
        "mm-dd-yy" | "m/d/yy" => Some(14),
        "d-mmm-yy" => Some(15),
        "h:mm" => Some(20),
        "h:mm:ss" => Some(21),
        "m/d/yy h:mm" => Some(22),
        "@" => Some(49),
        _ => None,
    }
}

/// Escape XML special characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn format_border_side(name: &str, style: Option<&str>) -> String {
    match style {
        Some(style) => format!(r#"<{name} style="{style}"><color auto="1"/></{name}>"#),
        None => format!("<{name}/>"),
    }
}

fn generate_content_types(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#);
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn generate_rels() -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    xml.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#);
    xml.push_str("</Relationships>");
    xml
}

/// Sheets take rId1..rIdN, then styles, shared strings and theme.
fn generate_workbook_rels(sheet_count: usize) -> String {
    const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="{REL}/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    let parts = [
        ("styles", "styles.xml"),
        ("sharedStrings", "sharedStrings.xml"),
        ("theme", "theme/theme1.xml"),
    ];
    for (offset, (kind, target)) in parts.iter().enumerate() {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{REL}/{kind}" Target="{target}"/>"#,
            sheet_count + offset + 1
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
        strings.len(),
        strings.len()
    ));
    for s in strings {
        xml.push_str(&format!(
            r#"<si><t xml:space="preserve">{}</t></si>"#,
            escape_xml(s)
        ));
    }
    xml.push_str("</sst>");
    xml
}

fn generate_theme(colors: Option<&[String]>) -> String {
    let default_colors = [
        "000000", "FFFFFF", "44546A", "E7E6E6", "4472C4", "ED7D31", "A5A5A5", "FFC000", "5B9BD5",
        "70AD47", "0563C1", "954F72",
    ];
    let color_names = [
        "dk1", "lt1", "dk2", "lt2", "accent1", "accent2", "accent3", "accent4", "accent5",
        "accent6", "hlink", "folHlink",
    ];
    let colors = colors.unwrap_or(&[]);

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme">"#);
    xml.push_str(r#"<a:themeElements><a:clrScheme name="Office">"#);
    for (i, name) in color_names.iter().enumerate() {
        let color = colors
            .get(i)
            .map_or(default_colors[i], |c| c.trim_start_matches('#'));
        xml.push_str(&format!(r#"<a:{name}><a:srgbClr val="{color}"/></a:{name}>"#));
    }
    xml.push_str("</a:clrScheme></a:themeElements></a:theme>");
    xml
}

/// Parse a cell reference like "A1" into (col, row) as 1-indexed.
fn parse_cell_ref(cell_ref: &str) -> (u32, u32) {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    for c in cell_ref.chars() {
        if c.is_ascii_alphabetic() {
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        } else if let Some(d) = c.to_digit(10) {
            row = row * 10 + d;
        }
    }
    (col, row)
}

fn generate_sheet_xml(
    sheet: &SheetBuilder,
    shared_strings: &[String],
    styles: &StylesCollector,
) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );

    if !sheet.col_widths.is_empty() {
        xml.push_str("<cols>");
        for (min, max, width) in &sheet.col_widths {
            xml.push_str(&format!(
                r#"<col min="{min}" max="{max}" width="{width}" customWidth="1"/>"#
            ));
        }
        xml.push_str("</cols>");
    }

    xml.push_str("<sheetData>");

    let mut rows: BTreeMap<u32, Vec<&CellEntry>> = BTreeMap::new();
    for cell in &sheet.cells {
        let (_, row) = parse_cell_ref(&cell.cell_ref);
        rows.entry(row).or_default().push(cell);
    }
    let row_numbers: BTreeSet<u32> = rows
        .keys()
        .chain(sheet.row_heights.keys())
        .copied()
        .collect();

    for row_num in row_numbers {
        let mut row_attrs = format!(r#"r="{row_num}""#);
        if let Some(height) = sheet.row_heights.get(&row_num) {
            row_attrs.push_str(&format!(r#" ht="{height}" customHeight="1""#));
        }
        xml.push_str(&format!("<row {row_attrs}>"));

        for cell in rows.get(&row_num).into_iter().flatten() {
            let mut cell_attrs = format!(r#"r="{}""#, cell.cell_ref);
            if let Some(idx) = cell.style.as_ref().and_then(|s| styles.style_index(s)) {
                if idx > 0 {
                    cell_attrs.push_str(&format!(r#" s="{idx}""#));
                }
            }

            match &cell.value {
                CellValue::String(s) => {
                    let idx = shared_strings.iter().position(|x| x == s).unwrap_or(0);
                    xml.push_str(&format!(r#"<c {cell_attrs} t="s"><v>{idx}</v></c>"#));
                }
                CellValue::Number(n) => {
                    xml.push_str(&format!(r#"<c {cell_attrs}><v>{n}</v></c>"#));
                }
                CellValue::Boolean(b) => {
                    let v = u8::from(*b);
                    xml.push_str(&format!(r#"<c {cell_attrs} t="b"><v>{v}</v></c>"#));
                }
                CellValue::Error(e) => {
                    xml.push_str(&format!(
                        r#"<c {cell_attrs} t="e"><v>{}</v></c>"#,
                        escape_xml(e)
                    ));
                }
                CellValue::InlineString(s) => {
                    xml.push_str(&format!(
                        r#"<c {cell_attrs} t="inlineStr"><is><t>{}</t></is></c>"#,
                        escape_xml(s)
                    ));
                }
                CellValue::Empty => {
                    xml.push_str(&format!(r#"<c {cell_attrs}/>"#));
                }
            }
        }

        xml.push_str("</row>");
    }

    xml.push_str("</sheetData>");

    if !sheet.merges.is_empty() {
        xml.push_str(&format!(r#"<mergeCells count="{}">"#, sheet.merges.len()));
        for range in &sheet.merges {
            xml.push_str(&format!(r#"<mergeCell ref="{range}"/>"#));
        }
        xml.push_str("</mergeCells>");
    }

    xml.push_str("</worksheet>");
    xml
}

// ============================================================================
// Convenience Functions
// ============================================================================

/// Create a minimal valid XLSX with a single empty sheet.
#[must_use]
pub fn minimal_xlsx() -> Vec<u8> {
    XlsxBuilder::new().add_sheet("Sheet1").build()
}

/// Create an XLSX with a single text cell in A1.
#[must_use]
pub fn xlsx_with_text(text: &str) -> Vec<u8> {
    XlsxBuilder::new()
        .add_sheet("Sheet1")
        .add_cell("A1", text, None)
        .build()
}

/// Create an XLSX with a single styled cell in A1.
#[must_use]
pub fn xlsx_with_styled_cell<V: Into<CellValue>>(value: V, style: StyleBuilder) -> Vec<u8> {
    XlsxBuilder::new()
        .add_sheet("Sheet1")
        .add_cell("A1", value, Some(style))
        .build()
}

/// The layout from the classic fit check: three columns (10, 20 and the
/// default width), two rows (15pt and 30pt) and A1:B1 merged.
#[must_use]
pub fn merged_header_xlsx() -> Vec<u8> {
    XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Report")
                .col_width(1, 1, 10.0)
                .col_width(2, 2, 20.0)
                .row_height(1, 15.0)
                .row_height(2, 30.0)
                .cell(
                    "A1",
                    "Quarterly report",
                    Some(
                        StyleBuilder::new()
                            .bold()
                            .font_size(12.0)
                            .bg_color("#FFFF00")
                            .border_all("thin")
                            .align_horizontal("center")
                            .align_vertical("top"),
                    ),
                )
                .cell("B1", "covered", None)
                .cell("A2", "Total", None)
                .cell("B2", 1250.5, None)
                .cell("C2", true, None)
                .merge("A1:B1"),
        )
        .build()
}
