//! Grid extraction from real workbooks: extents, unit conversion, merge
//! roles and the flat per-cell style record.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod fixtures;

use fixtures::{SheetBuilder, StyleBuilder, XlsxBuilder};
use test_case::test_case;
use xlpage::color::Rgb;
use xlpage::grid::{CellRole, FontFace, HAnchor, VAnchor};
use xlpage::page_setup::{DEFAULT_FONT_SIZE, DEFAULT_ROW_HEIGHT_PT};
use xlpage::parser::parse_active_sheet;
use xlpage::{CellRange, Grid, StyleWarning, XlpageError};

const EPS: f64 = 1e-9;

fn grid_of(data: &[u8]) -> Grid {
    Grid::extract(&parse_active_sheet(data).unwrap()).unwrap()
}

#[test]
fn column_widths_convert_to_points() {
    let grid = grid_of(&fixtures::merged_header_xlsx());
    assert_eq!(grid.extent, CellRange::new(1, 1, 2, 3));
    let expected = [52.5, 105.0, 44.2575];
    for (width, want) in grid.column_widths.iter().zip(expected) {
        assert!((width - want).abs() < EPS, "{width} != {want}");
    }
    assert_eq!(grid.row_heights, vec![15.0, 30.0]);
}

#[test]
fn merged_header_roles() {
    let grid = grid_of(&fixtures::merged_header_xlsx());
    let anchor = grid.cell(1, 1).unwrap();
    assert_eq!(
        anchor.role,
        CellRole::Anchor {
            row_span: 1,
            col_span: 2
        }
    );
    assert_eq!(anchor.text, "Quarterly report");

    let member = grid.cell(1, 2).unwrap();
    assert_eq!(member.role, CellRole::Member);
    // the covered value is never shown
    assert!(member.text.is_empty());

    assert_eq!(grid.cell(2, 3).unwrap().role, CellRole::Single);
    assert_eq!(grid.cell(2, 3).unwrap().text, "TRUE");
}

#[test]
fn anchor_style_is_fully_resolved() {
    let grid = grid_of(&fixtures::merged_header_xlsx());
    let style = &grid.cell(1, 1).unwrap().style;
    assert_eq!(style.fill, Some(Rgb::new(255, 255, 0)));
    assert!(style.bordered);
    assert_eq!(style.face, FontFace::HelveticaBold);
    assert_eq!(style.font_size, 12.0);
    assert_eq!(style.h_anchor, HAnchor::Center);
    assert_eq!(style.v_anchor, VAnchor::Top);
    assert!(grid.warnings.is_empty());
}

#[test]
fn unstyled_cells_use_the_workbook_default_font() {
    let grid = grid_of(&fixtures::xlsx_with_text("plain"));
    let style = &grid.cell(1, 1).unwrap().style;
    assert_eq!(style.fill, None);
    assert!(!style.bordered);
    assert_eq!(style.face, FontFace::Helvetica);
    // cellXfs[0] points at the Calibri 11 default font
    assert_eq!(style.font_size, 11.0);
    assert_eq!(style.h_anchor, HAnchor::Left);
    assert_eq!(style.v_anchor, VAnchor::Middle);
}

#[test_case(false, false, FontFace::Helvetica ; "regular")]
#[test_case(true, false, FontFace::HelveticaBold ; "bold")]
#[test_case(false, true, FontFace::HelveticaOblique ; "italic")]
#[test_case(true, true, FontFace::HelveticaBoldOblique ; "bold italic")]
fn font_flags_pick_the_face(bold: bool, italic: bool, face: FontFace) {
    let mut style = StyleBuilder::new().font_size(10.0);
    if bold {
        style = style.bold();
    }
    if italic {
        style = style.italic();
    }
    let grid = grid_of(&fixtures::xlsx_with_styled_cell("x", style));
    assert_eq!(grid.cell(1, 1).unwrap().style.face, face);
}

#[test_case("center", "center", HAnchor::Center, VAnchor::Middle ; "centred")]
#[test_case("right", "bottom", HAnchor::Right, VAnchor::Bottom ; "right bottom")]
#[test_case("justify", "top", HAnchor::Center, VAnchor::Top ; "justify reads as centred")]
fn alignment_maps_to_anchors(h: &str, v: &str, want_h: HAnchor, want_v: VAnchor) {
    let style = StyleBuilder::new().align_horizontal(h).align_vertical(v);
    let grid = grid_of(&fixtures::xlsx_with_styled_cell("x", style));
    let cell = grid.cell(1, 1).unwrap();
    assert_eq!(cell.style.h_anchor, want_h);
    assert_eq!(cell.style.v_anchor, want_v);
}

#[test]
fn theme_fills_resolve_through_the_theme() {
    let style = StyleBuilder::new().theme_fill(4, None);
    let grid = grid_of(&fixtures::xlsx_with_styled_cell("x", style));
    // accent1 of the default Office theme
    assert_eq!(
        grid.cell(1, 1).unwrap().style.fill,
        Some(Rgb::new(0x44, 0x72, 0xC4))
    );
}

#[test]
fn non_solid_or_black_fills_are_skipped() {
    let data = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Sheet1")
                .cell(
                    "A1",
                    "none",
                    Some(StyleBuilder::new().bg_color("#FF0000").pattern("none")),
                )
                .cell("B1", "black", Some(StyleBuilder::new().bg_color("#000000"))),
        )
        .build();
    let grid = grid_of(&data);
    assert_eq!(grid.cell(1, 1).unwrap().style.fill, None);
    assert_eq!(grid.cell(1, 2).unwrap().style.fill, None);
}

#[test]
fn any_border_side_marks_the_cell_bordered() {
    let data = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Sheet1")
                .cell("A1", "top", Some(StyleBuilder::new().border_top("dashed")))
                .cell("B1", "left", Some(StyleBuilder::new().border_left("double")))
                .cell("C1", "none", None),
        )
        .build();
    let grid = grid_of(&data);
    assert!(grid.cell(1, 1).unwrap().style.bordered);
    assert!(grid.cell(1, 2).unwrap().style.bordered);
    assert!(!grid.cell(1, 3).unwrap().style.bordered);
}

#[test]
fn unknown_border_styles_warn_but_draw() {
    let style = StyleBuilder::new().border_all("wobbly");
    let grid = grid_of(&fixtures::xlsx_with_styled_cell("x", style));
    assert!(grid.cell(1, 1).unwrap().style.bordered);
    assert!(grid
        .warnings
        .iter()
        .any(|w| matches!(w, StyleWarning::UnknownBorderStyle { style, .. } if style == "wobbly")));
}

#[test]
fn zero_font_size_falls_back_with_a_warning() {
    let style = StyleBuilder::new().font_size(0.0);
    let grid = grid_of(&fixtures::xlsx_with_styled_cell("x", style));
    assert_eq!(grid.cell(1, 1).unwrap().style.font_size, DEFAULT_FONT_SIZE);
    assert!(matches!(
        grid.warnings.as_slice(),
        [StyleWarning::MalformedFontSize { .. }]
    ));
}

#[test]
fn print_area_overrides_the_used_range() {
    let data = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Sheet1")
                .cell("A1", "outside", None)
                .cell("C3", "inside", None)
                .cell("H20", "far away", None)
                .print_area("$B$2:$D$4"),
        )
        .build();
    let grid = grid_of(&data);
    assert_eq!(grid.extent, CellRange::new(2, 2, 4, 4));
    assert_eq!(grid.cells.len(), 9);
    assert_eq!(grid.cell(3, 3).unwrap().text, "inside");
    assert!(grid.cell(1, 1).is_none());
    assert_eq!(grid.row_heights, vec![DEFAULT_ROW_HEIGHT_PT; 3]);
}

#[test]
fn merges_are_clipped_to_the_print_area() {
    let data = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Sheet1")
                .cell("B2", "anchor", None)
                .cell("A5", "hidden anchor", None)
                .merge("B2:E3")
                .merge("A5:C5")
                .print_area("$B$2:$C$5"),
        )
        .build();
    let grid = grid_of(&data);
    assert_eq!(
        grid.cell(2, 2).unwrap().role,
        CellRole::Anchor {
            row_span: 2,
            col_span: 2
        }
    );
    // A5 lies outside the extent, so its members inside stay blank
    assert_eq!(grid.cell(5, 2).unwrap().role, CellRole::Member);
    assert_eq!(grid.cell(5, 3).unwrap().role, CellRole::Member);
    assert_eq!(grid.merges.len(), 1);
}

#[test]
fn row_heights_without_cells_still_apply() {
    let data = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Sheet1")
                .cell("A1", "a", None)
                .cell("A3", "c", None)
                .row_height(2, 40.0),
        )
        .build();
    let grid = grid_of(&data);
    assert_eq!(grid.row_heights, vec![DEFAULT_ROW_HEIGHT_PT, 40.0, DEFAULT_ROW_HEIGHT_PT]);
}

#[test]
fn empty_sheet_has_no_extent() {
    let sheet = parse_active_sheet(&fixtures::minimal_xlsx()).unwrap();
    assert!(matches!(
        Grid::extract(&sheet),
        Err(XlpageError::EmptyExtent { sheet }) if sheet == "Sheet1"
    ));
}
