//! Grid extraction: the rectangular extent to print, its dimension tables in
//! points, and one flat, fully resolved style record per cell.
//!
//! All style anomalies are absorbed here. A malformed colour, font size or
//! dimension is replaced by its documented default and reported as a
//! [`StyleWarning`], so the paint stage never has to second-guess its input.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::cell_ref::format_cell_ref;
use crate::color::Rgb;
use crate::error::{Result, XlpageError};
use crate::page_setup::{
    chars_to_points, DEFAULT_COL_WIDTH_CHARS, DEFAULT_FONT_SIZE, DEFAULT_ROW_HEIGHT_PT,
};
use crate::source::SheetSource;
use crate::types::{CellRange, HAlign, MergedRegion, Style, VAlign, KNOWN_BORDER_STYLES};

/// Upper bound on cells in one extent; a stray cell at the far corner of a
/// sheet would otherwise ask for billions of slots.
pub const MAX_GRID_CELLS: u64 = 4_000_000;

/// The four standard Helvetica faces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum FontFace {
    #[default]
    #[serde(rename = "Helvetica")]
    Helvetica,
    #[serde(rename = "Helvetica-Bold")]
    HelveticaBold,
    #[serde(rename = "Helvetica-Oblique")]
    HelveticaOblique,
    #[serde(rename = "Helvetica-BoldOblique")]
    HelveticaBoldOblique,
}

impl FontFace {
    pub const ALL: [Self; 4] = [
        Self::Helvetica,
        Self::HelveticaBold,
        Self::HelveticaOblique,
        Self::HelveticaBoldOblique,
    ];

    pub const fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => Self::Helvetica,
            (true, false) => Self::HelveticaBold,
            (false, true) => Self::HelveticaOblique,
            (true, true) => Self::HelveticaBoldOblique,
        }
    }

    /// PostScript name of the standard font.
    pub const fn base_name(self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
        }
    }

    pub const fn is_bold(self) -> bool {
        matches!(self, Self::HelveticaBold | Self::HelveticaBoldOblique)
    }
}

/// Horizontal text anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HAnchor {
    #[default]
    Left,
    Center,
    Right,
}

impl HAnchor {
    pub fn from_alignment(align: Option<HAlign>) -> Self {
        match align {
            Some(
                HAlign::Center | HAlign::CenterContinuous | HAlign::Distributed | HAlign::Justify,
            ) => Self::Center,
            Some(HAlign::Right) => Self::Right,
            _ => Self::Left,
        }
    }
}

/// Vertical text anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VAnchor {
    Top,
    #[default]
    Middle,
    Bottom,
}

impl VAnchor {
    pub fn from_alignment(align: Option<VAlign>) -> Self {
        match align {
            Some(VAlign::Top | VAlign::Distributed | VAlign::Justify) => Self::Top,
            Some(VAlign::Bottom) => Self::Bottom,
            _ => Self::Middle,
        }
    }
}

/// Flat style record, resolved once per cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellStyle {
    /// Background colour; `None` also for black, which is never painted.
    pub fill: Option<Rgb>,
    /// Any border side present.
    pub bordered: bool,
    pub face: FontFace,
    pub font_size: f64,
    pub h_anchor: HAnchor,
    pub v_anchor: VAnchor,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            fill: None,
            bordered: false,
            face: FontFace::Helvetica,
            font_size: DEFAULT_FONT_SIZE,
            h_anchor: HAnchor::Left,
            v_anchor: VAnchor::Middle,
        }
    }
}

/// A style attribute that could not be used as authored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StyleWarning {
    MalformedColor { cell: String, value: String },
    MalformedFontSize { cell: String, value: f64 },
    UnknownBorderStyle { cell: String, style: String },
    MalformedColumnWidth { col: u32, value: f64 },
    MalformedRowHeight { row: u32, value: f64 },
}

impl std::fmt::Display for StyleWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedColor { cell, value } => {
                write!(f, "{cell}: unreadable fill colour '{value}', fill skipped")
            }
            Self::MalformedFontSize { cell, value } => write!(
                f,
                "{cell}: unusable font size {value}, using {DEFAULT_FONT_SIZE}"
            ),
            Self::UnknownBorderStyle { cell, style } => {
                write!(f, "{cell}: unknown border style '{style}', drawn as present")
            }
            Self::MalformedColumnWidth { col, value } => write!(
                f,
                "column {col}: unusable width {value}, using {DEFAULT_COL_WIDTH_CHARS}"
            ),
            Self::MalformedRowHeight { row, value } => write!(
                f,
                "row {row}: unusable height {value}, using {DEFAULT_ROW_HEIGHT_PT}"
            ),
        }
    }
}

/// How a position takes part in merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "camelCase")]
pub enum CellRole {
    Single,
    /// Top-left cell of a merged region, with its span clipped to the extent.
    Anchor { row_span: u32, col_span: u32 },
    /// Covered by a merged region; never drawn on its own.
    Member,
}

impl CellRole {
    /// `(row_span, col_span)` to draw with, or `None` for a suppressed member.
    pub const fn span(self) -> Option<(u32, u32)> {
        match self {
            Self::Single => Some((1, 1)),
            Self::Anchor { row_span, col_span } => Some((row_span, col_span)),
            Self::Member => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    /// Absolute 1-based row.
    pub row: u32,
    /// Absolute 1-based column.
    pub col: u32,
    pub text: String,
    pub style: CellStyle,
    pub role: CellRole,
}

/// Everything the later stages need from a worksheet.
#[derive(Debug, Clone, Serialize)]
pub struct Grid {
    pub extent: CellRange,
    /// Column widths in points, one per extent column.
    pub column_widths: Vec<f64>,
    /// Row heights in points, one per extent row.
    pub row_heights: Vec<f64>,
    /// Merged regions anchored inside the extent, clipped to it.
    pub merges: Vec<MergedRegion>,
    /// Row-major, `extent.row_count() * extent.col_count()` entries.
    pub cells: Vec<GridCell>,
    pub warnings: Vec<StyleWarning>,
}

impl Grid {
    /// Extract the printable grid of a worksheet.
    ///
    /// # Errors
    /// [`XlpageError::EmptyExtent`] when the sheet has neither a print area
    /// nor a used cell, [`XlpageError::Render`] when the extent is too large
    /// to lay out.
    pub fn extract<S: SheetSource + ?Sized>(source: &S) -> Result<Self> {
        let extent = source
            .print_area()
            .or_else(|| source.used_range())
            .ok_or_else(|| XlpageError::EmptyExtent {
                sheet: source.name().to_string(),
            })?;

        let area = u64::from(extent.row_count()) * u64::from(extent.col_count());
        if area > MAX_GRID_CELLS {
            return Err(XlpageError::Render(format!(
                "extent {extent} of '{}' spans {area} cells",
                source.name()
            )));
        }

        let mut warnings = Vec::new();

        let column_widths = (extent.first_col..=extent.last_col)
            .map(|col| {
                let chars = match source.column_width(col) {
                    Some(w) if w.is_finite() && w >= 0.0 => w,
                    Some(value) => {
                        warnings.push(StyleWarning::MalformedColumnWidth { col, value });
                        DEFAULT_COL_WIDTH_CHARS
                    }
                    None => DEFAULT_COL_WIDTH_CHARS,
                };
                chars_to_points(chars)
            })
            .collect();

        let row_heights = (extent.first_row..=extent.last_row)
            .map(|row| match source.row_height(row) {
                Some(h) if h.is_finite() && h >= 0.0 => h,
                Some(value) => {
                    warnings.push(StyleWarning::MalformedRowHeight { row, value });
                    DEFAULT_ROW_HEIGHT_PT
                }
                None => DEFAULT_ROW_HEIGHT_PT,
            })
            .collect();

        let (merges, roles) = merge_roles(source.merged_regions(), &extent);

        let mut cells = Vec::with_capacity(usize::try_from(area).unwrap_or(0));
        for row in extent.first_row..=extent.last_row {
            for col in extent.first_col..=extent.last_col {
                let role = roles.get(&(row, col)).copied().unwrap_or(CellRole::Single);
                let (text, style) = match (role, source.cell(row, col)) {
                    (CellRole::Member, _) | (_, None) => (String::new(), CellStyle::default()),
                    (_, Some(cell)) => {
                        let style = cell
                            .style
                            .as_deref()
                            .map(|s| normalize_style(s, row, col, &mut warnings))
                            .unwrap_or_default();
                        (cell.display(), style)
                    }
                };
                cells.push(GridCell {
                    row,
                    col,
                    text,
                    style,
                    role,
                });
            }
        }

        for warning in &warnings {
            warn!(sheet = source.name(), "{warning}");
        }
        debug!(
            sheet = source.name(),
            %extent,
            merges = merges.len(),
            warnings = warnings.len(),
            "grid extracted"
        );

        Ok(Self {
            extent,
            column_widths,
            row_heights,
            merges,
            cells,
            warnings,
        })
    }

    /// Cell at an absolute position inside the extent.
    pub fn cell(&self, row: u32, col: u32) -> Option<&GridCell> {
        if !self.extent.contains(row, col) {
            return None;
        }
        let r = (row - self.extent.first_row) as usize;
        let c = (col - self.extent.first_col) as usize;
        self.cells.get(r * self.extent.col_count() as usize + c)
    }
}

/// Clip merges to the extent and assign a role to every covered position.
///
/// A region whose anchor lies outside the extent keeps its members inside
/// suppressed: nothing is drawn for them.
fn merge_roles(
    regions: &[MergedRegion],
    extent: &CellRange,
) -> (Vec<MergedRegion>, HashMap<(u32, u32), CellRole>) {
    let mut clipped = Vec::new();
    let mut roles = HashMap::new();

    for region in regions {
        let Some(visible) = region.range().intersect(extent) else {
            continue;
        };
        let anchor_visible = extent.contains(region.row, region.col);
        if anchor_visible {
            let merge = MergedRegion::from_range(visible);
            roles.insert(
                (merge.row, merge.col),
                CellRole::Anchor {
                    row_span: merge.row_span,
                    col_span: merge.col_span,
                },
            );
            clipped.push(merge);
        }
        for r in visible.first_row..=visible.last_row {
            for c in visible.first_col..=visible.last_col {
                if !(anchor_visible && region.is_anchor(r, c)) {
                    roles.insert((r, c), CellRole::Member);
                }
            }
        }
    }

    (clipped, roles)
}

/// Flatten an authored style into the record the painter uses.
fn normalize_style(
    style: &Style,
    row: u32,
    col: u32,
    warnings: &mut Vec<StyleWarning>,
) -> CellStyle {
    let cell_name = || format_cell_ref(row, col);

    let fill = style.fill.as_ref().and_then(|fill| {
        if matches!(fill.pattern.as_deref(), None | Some("none")) {
            return None;
        }
        let value = fill.color.as_deref()?;
        match Rgb::parse_hex(value) {
            Some(rgb) if rgb.is_black() => None,
            Some(rgb) => Some(rgb),
            None => {
                warnings.push(StyleWarning::MalformedColor {
                    cell: cell_name(),
                    value: value.to_string(),
                });
                None
            }
        }
    });

    let mut bordered = false;
    if let Some(border) = &style.border {
        for side in border.sides().into_iter().flatten() {
            if side == "none" || side.is_empty() {
                continue;
            }
            bordered = true;
            if !KNOWN_BORDER_STYLES.contains(&side) {
                warnings.push(StyleWarning::UnknownBorderStyle {
                    cell: cell_name(),
                    style: side.to_string(),
                });
            }
        }
    }

    let (face, font_size) = match &style.font {
        Some(font) => {
            let size = match font.size {
                Some(size) if size.is_finite() && size > 0.0 => size,
                Some(value) => {
                    warnings.push(StyleWarning::MalformedFontSize {
                        cell: cell_name(),
                        value,
                    });
                    DEFAULT_FONT_SIZE
                }
                None => DEFAULT_FONT_SIZE,
            };
            (FontFace::from_flags(font.bold, font.italic), size)
        }
        None => (FontFace::Helvetica, DEFAULT_FONT_SIZE),
    };

    let alignment = style.alignment.unwrap_or_default();

    CellStyle {
        fill,
        bordered,
        face,
        font_size,
        h_anchor: HAnchor::from_alignment(alignment.horizontal),
        v_anchor: VAnchor::from_alignment(alignment.vertical),
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
    use crate::types::{Alignment, BorderSides, FillStyle, FontStyle, Worksheet};
    use test_case::test_case;

    fn solid(color: &str) -> Style {
        Style {
            fill: Some(FillStyle {
                pattern: Some("solid".into()),
                color: Some(color.into()),
            }),
            ..Style::default()
        }
    }

    #[test_case(Some(HAlign::Center), HAnchor::Center)]
    #[test_case(Some(HAlign::CenterContinuous), HAnchor::Center)]
    #[test_case(Some(HAlign::Distributed), HAnchor::Center)]
    #[test_case(Some(HAlign::Justify), HAnchor::Center)]
    #[test_case(Some(HAlign::Right), HAnchor::Right)]
    #[test_case(Some(HAlign::Left), HAnchor::Left)]
    #[test_case(Some(HAlign::General), HAnchor::Left)]
    #[test_case(Some(HAlign::Fill), HAnchor::Left)]
    #[test_case(None, HAnchor::Left)]
    fn horizontal_anchor(align: Option<HAlign>, expected: HAnchor) {
        assert_eq!(HAnchor::from_alignment(align), expected);
    }

    #[test_case(Some(VAlign::Top), VAnchor::Top)]
    #[test_case(Some(VAlign::Distributed), VAnchor::Top)]
    #[test_case(Some(VAlign::Justify), VAnchor::Top)]
    #[test_case(Some(VAlign::Bottom), VAnchor::Bottom)]
    #[test_case(Some(VAlign::Center), VAnchor::Middle)]
    #[test_case(None, VAnchor::Middle)]
    fn vertical_anchor(align: Option<VAlign>, expected: VAnchor) {
        assert_eq!(VAnchor::from_alignment(align), expected);
    }

    #[test]
    fn font_faces() {
        assert_eq!(FontFace::from_flags(false, false).base_name(), "Helvetica");
        assert_eq!(FontFace::from_flags(true, false).base_name(), "Helvetica-Bold");
        assert_eq!(FontFace::from_flags(false, true).base_name(), "Helvetica-Oblique");
        assert_eq!(
            FontFace::from_flags(true, true).base_name(),
            "Helvetica-BoldOblique"
        );
    }

    #[test]
    fn empty_sheet_has_no_extent() {
        let ws = Worksheet::new("Blank");
        match Grid::extract(&ws) {
            Err(XlpageError::EmptyExtent { sheet }) => assert_eq!(sheet, "Blank"),
            other => panic!("expected EmptyExtent, got {other:?}"),
        }
    }

    #[test]
    fn print_area_wins_over_used_range() {
        let mut ws = Worksheet::new("S");
        ws.set_value(1, 1, "a").set_value(10, 10, "far");
        ws.set_print_area("B2:C4").unwrap();
        let grid = Grid::extract(&ws).unwrap();
        assert_eq!(grid.extent, CellRange::new(2, 2, 4, 3));
        assert_eq!(grid.column_widths.len(), 2);
        assert_eq!(grid.row_heights.len(), 3);
        assert_eq!(grid.cells.len(), 6);
    }

    #[test]
    fn dimensions_default_and_convert() {
        let mut ws = Worksheet::new("S");
        ws.set_value(2, 3, 1.0)
            .set_column_width(1, 10.0)
            .set_column_width(2, 20.0)
            .set_row_height(2, 30.0);
        ws.set_value(1, 1, "x");
        let grid = Grid::extract(&ws).unwrap();
        assert_eq!(grid.column_widths, vec![52.5, 105.0, chars_to_points(DEFAULT_COL_WIDTH_CHARS)]);
        assert_eq!(grid.row_heights, vec![15.0, 30.0]);
    }

    #[test]
    fn malformed_dimensions_fall_back() {
        let mut ws = Worksheet::new("S");
        ws.set_value(1, 1, "x")
            .set_column_width(1, f64::NAN)
            .set_row_height(1, -4.0);
        let grid = Grid::extract(&ws).unwrap();
        assert_eq!(
            grid.column_widths,
            vec![chars_to_points(DEFAULT_COL_WIDTH_CHARS)]
        );
        assert_eq!(grid.row_heights, vec![15.0]);
        assert_eq!(grid.warnings.len(), 2);
    }

    #[test]
    fn merge_roles_and_suppressed_text() {
        let mut ws = Worksheet::new("S");
        ws.set_value(1, 1, "anchor").set_value(1, 2, "hidden");
        ws.merge("A1:B1").unwrap();
        ws.set_value(2, 3, "z");
        let grid = Grid::extract(&ws).unwrap();
        assert_eq!(
            grid.cell(1, 1).unwrap().role,
            CellRole::Anchor {
                row_span: 1,
                col_span: 2
            }
        );
        let member = grid.cell(1, 2).unwrap();
        assert_eq!(member.role, CellRole::Member);
        assert_eq!(member.text, "");
        assert_eq!(grid.cell(2, 3).unwrap().role, CellRole::Single);
        assert_eq!(grid.merges.len(), 1);
    }

    #[test]
    fn merges_are_clipped_to_the_print_area() {
        let mut ws = Worksheet::new("S");
        ws.set_value(1, 1, "x");
        ws.merge("B2:D5").unwrap();
        ws.merge("A1:A3").unwrap();
        ws.set_print_area("A2:C3").unwrap();
        let grid = Grid::extract(&ws).unwrap();
        assert_eq!(
            grid.cell(2, 2).unwrap().role,
            CellRole::Anchor {
                row_span: 2,
                col_span: 2
            }
        );
        // A1:A3 is anchored above the area, so A2 and A3 stay blank
        assert_eq!(grid.cell(2, 1).unwrap().role, CellRole::Member);
        assert_eq!(grid.cell(3, 1).unwrap().role, CellRole::Member);
        assert_eq!(grid.merges, vec![MergedRegion::from_range(CellRange::new(2, 2, 3, 3))]);
    }

    #[test]
    fn fills_follow_the_black_and_pattern_rules() {
        let mut ws = Worksheet::new("S");
        ws.set_style(1, 1, solid("FFFFFF00"))
            .set_style(1, 2, solid("FF000000"))
            .set_style(1, 3, solid("not-a-colour"))
            .set_style(
                1,
                4,
                Style {
                    fill: Some(FillStyle {
                        pattern: Some("none".into()),
                        color: Some("FFFF0000".into()),
                    }),
                    ..Style::default()
                },
            )
            .set_style(1, 5, solid("#00ff00"));
        let grid = Grid::extract(&ws).unwrap();
        let fill = |c| grid.cell(1, c).unwrap().style.fill;
        assert_eq!(fill(1), Some(Rgb::new(255, 255, 0)));
        assert_eq!(fill(2), None);
        assert_eq!(fill(3), None);
        assert_eq!(fill(4), None);
        assert_eq!(fill(5), Some(Rgb::new(0, 255, 0)));
        assert_eq!(
            grid.warnings,
            vec![StyleWarning::MalformedColor {
                cell: "C1".into(),
                value: "not-a-colour".into()
            }]
        );
    }

    #[test]
    fn borders_collapse_to_presence() {
        let mut ws = Worksheet::new("S");
        ws.set_style(
            1,
            1,
            Style {
                border: Some(BorderSides {
                    left: Some("dashDot".into()),
                    ..BorderSides::default()
                }),
                ..Style::default()
            },
        )
        .set_style(
            1,
            2,
            Style {
                border: Some(BorderSides::all("none")),
                ..Style::default()
            },
        )
        .set_style(
            1,
            3,
            Style {
                border: Some(BorderSides {
                    top: Some("wavy".into()),
                    ..BorderSides::default()
                }),
                ..Style::default()
            },
        );
        let grid = Grid::extract(&ws).unwrap();
        assert!(grid.cell(1, 1).unwrap().style.bordered);
        assert!(!grid.cell(1, 2).unwrap().style.bordered);
        assert!(grid.cell(1, 3).unwrap().style.bordered);
        assert_eq!(grid.warnings.len(), 1);
    }

    #[test]
    fn fonts_and_alignment() {
        let mut ws = Worksheet::new("S");
        ws.set_style(
            1,
            1,
            Style {
                font: Some(FontStyle {
                    bold: true,
                    italic: true,
                    size: Some(12.0),
                    ..FontStyle::default()
                }),
                alignment: Some(Alignment {
                    horizontal: Some(HAlign::Center),
                    vertical: Some(VAlign::Top),
                }),
                ..Style::default()
            },
        )
        .set_style(
            1,
            2,
            Style {
                font: Some(FontStyle {
                    size: Some(0.0),
                    ..FontStyle::default()
                }),
                ..Style::default()
            },
        );
        ws.set_value(1, 3, "plain");
        let grid = Grid::extract(&ws).unwrap();

        let styled = grid.cell(1, 1).unwrap().style;
        assert_eq!(styled.face, FontFace::HelveticaBoldOblique);
        assert_eq!(styled.font_size, 12.0);
        assert_eq!(styled.h_anchor, HAnchor::Center);
        assert_eq!(styled.v_anchor, VAnchor::Top);

        assert_eq!(grid.cell(1, 2).unwrap().style.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(grid.cell(1, 3).unwrap().style, CellStyle::default());
        assert!(matches!(
            grid.warnings.as_slice(),
            [StyleWarning::MalformedFontSize { .. }]
        ));
    }

    #[test]
    fn huge_extents_are_rejected() {
        let mut ws = Worksheet::new("S");
        ws.set_value(1, 1, "a").set_value(1_000_000, 16_000, "z");
        assert!(matches!(Grid::extract(&ws), Err(XlpageError::Render(_))));
    }
}
