//! Paint emitter: turns an extracted grid and its solved layout into an
//! ordered list of draw ops.
//!
//! Two passes walk the extent in row-major order. The first paints fills and
//! borders, the second paints text, so no background ever covers a
//! neighbour's text. Merged-region members are skipped in both passes; their
//! anchor paints the whole region.

use tracing::debug;

use super::{DrawOp, PagePlan};
use crate::error::{Result, XlpageError};
use crate::grid::{Grid, GridCell, HAnchor, VAnchor};
use crate::layout::{PageLayout, Rect};
use crate::page_setup::{PageConfig, BORDER_LINE_WIDTH, TEXT_INSET_X, TEXT_INSET_Y};

/// Anchor point and baseline for text inside `rect`.
///
/// The x coordinate is the left edge, centre or right edge of the string
/// depending on `h`; the surface places the string around it.
pub fn text_origin(rect: &Rect, h: HAnchor, v: VAnchor, font_size: f64) -> (f64, f64) {
    let x = match h {
        HAnchor::Left => rect.x + TEXT_INSET_X,
        HAnchor::Center => rect.x + rect.width / 2.0,
        HAnchor::Right => rect.x + rect.width - TEXT_INSET_X,
    };
    let y = match v {
        VAnchor::Top => rect.y + rect.height - TEXT_INSET_Y - font_size,
        VAnchor::Bottom => rect.y + TEXT_INSET_Y,
        VAnchor::Middle => rect.y + (rect.height - font_size) / 2.0,
    };
    (x, y)
}

/// Rectangle a cell paints into, or `None` for a merged-region member.
fn visible_rect(grid: &Grid, layout: &PageLayout, cell: &GridCell) -> Result<Option<Rect>> {
    let Some((row_span, col_span)) = cell.role.span() else {
        return Ok(None);
    };
    let offset = |v: u32, first: u32| {
        v.checked_sub(first).map(|d| d as usize).ok_or_else(|| {
            XlpageError::Render(format!(
                "cell ({}, {}) lies outside the extent",
                cell.row, cell.col
            ))
        })
    };
    let r0 = offset(cell.row, grid.extent.first_row)?;
    let c0 = offset(cell.col, grid.extent.first_col)?;
    layout
        .cell_rect(r0, c0, row_span as usize, col_span as usize)
        .map(Some)
}

/// Emit draw ops for every visible cell of `grid`.
///
/// # Errors
/// Returns [`XlpageError::Render`] when the layout does not match the grid.
pub fn emit(grid: &Grid, layout: &PageLayout) -> Result<Vec<DrawOp>> {
    let mut ops = Vec::new();

    for cell in &grid.cells {
        let Some(rect) = visible_rect(grid, layout, cell)? else {
            continue;
        };
        if let Some(color) = cell.style.fill {
            ops.push(DrawOp::FillRect { rect, color });
        }
        if cell.style.bordered {
            ops.push(DrawOp::StrokeRect {
                rect,
                line_width: BORDER_LINE_WIDTH,
            });
        }
    }

    for cell in &grid.cells {
        if cell.text.is_empty() {
            continue;
        }
        let Some(rect) = visible_rect(grid, layout, cell)? else {
            continue;
        };
        let style = &cell.style;
        let (x, y) = text_origin(&rect, style.h_anchor, style.v_anchor, style.font_size);
        ops.push(DrawOp::Text {
            x,
            y,
            text: cell.text.clone(),
            face: style.face,
            size: style.font_size,
            anchor: style.h_anchor,
        });
    }

    Ok(ops)
}

/// Solve the layout for `grid` on `page` and paint it.
///
/// # Errors
/// See [`emit`].
pub fn paint_page(grid: &Grid, page: &PageConfig) -> Result<PagePlan> {
    let layout = PageLayout::solve(&grid.column_widths, &grid.row_heights, page);
    let ops = emit(grid, &layout)?;
    debug!(
        extent = %grid.extent,
        scale = layout.scale,
        origin_x = layout.origin_x,
        origin_y = layout.origin_y,
        ops = ops.len(),
        "page painted"
    );
    Ok(PagePlan {
        width: page.width,
        height: page.height,
        ops,
    })
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
    use crate::color::Rgb;
    use crate::types::{BorderSides, FillStyle, Style, Worksheet};
    use test_case::test_case;

    const EPS: f64 = 1e-9;

    fn filled(color: &str, bordered: bool) -> Style {
        Style {
            fill: Some(FillStyle {
                pattern: Some("solid".into()),
                color: Some(color.into()),
            }),
            border: bordered.then(|| BorderSides::all("thin")),
            ..Style::default()
        }
    }

    #[test_case(HAnchor::Left, VAnchor::Bottom, 12.0, 11.0 ; "left bottom")]
    #[test_case(HAnchor::Center, VAnchor::Top, 60.0, 47.0 ; "center top")]
    #[test_case(HAnchor::Right, VAnchor::Middle, 108.0, 29.0 ; "right middle")]
    fn anchored_origins(h: HAnchor, v: VAnchor, x: f64, y: f64) {
        let rect = Rect::new(10.0, 10.0, 100.0, 50.0);
        let (ax, ay) = text_origin(&rect, h, v, 12.0);
        assert!((ax - x).abs() < EPS, "x {ax} != {x}");
        assert!((ay - y).abs() < EPS, "y {ay} != {y}");
    }

    #[test]
    fn members_draw_nothing_and_anchors_span_the_region() {
        let mut ws = Worksheet::new("S");
        ws.set_value(1, 1, "merged")
            .set_value(1, 2, "hidden")
            .set_value(2, 3, "x")
            .set_style(1, 1, filled("FFFFFF00", true))
            .set_style(1, 2, filled("FFFF0000", true))
            .set_column_width(1, 10.0)
            .set_column_width(2, 20.0)
            .set_row_height(1, 15.0)
            .set_row_height(2, 30.0);
        ws.merge("A1:B1").unwrap();

        let grid = Grid::extract(&ws).unwrap();
        let page = PageConfig::default();
        let layout = PageLayout::solve(&grid.column_widths, &grid.row_heights, &page);
        let ops = emit(&grid, &layout).unwrap();

        let fills: Vec<_> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillRect { rect, color } => Some((rect, *color)),
                _ => None,
            })
            .collect();
        assert_eq!(fills.len(), 1);
        let (rect, color) = fills[0];
        assert_eq!(color, Rgb::new(255, 255, 0));
        assert!((rect.width - (layout.col_edges[2] - layout.col_edges[0])).abs() < EPS);
        assert!((rect.width - 157.5).abs() < EPS);

        let texts: Vec<_> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["merged", "x"]);
        assert_eq!(
            ops.iter()
                .filter(|op| matches!(op, DrawOp::StrokeRect { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn backgrounds_come_before_text() {
        let mut ws = Worksheet::new("S");
        ws.set_value(1, 1, "a")
            .set_value(1, 2, "b")
            .set_style(1, 2, filled("FF00FF00", false));
        let plan = paint_page(&Grid::extract(&ws).unwrap(), &PageConfig::default()).unwrap();
        let first_text = plan
            .ops
            .iter()
            .position(|op| matches!(op, DrawOp::Text { .. }))
            .unwrap();
        assert!(plan.ops[..first_text]
            .iter()
            .all(|op| !matches!(op, DrawOp::Text { .. })));
        assert!(plan.ops[first_text..]
            .iter()
            .all(|op| matches!(op, DrawOp::Text { .. })));
    }

    #[test]
    fn empty_values_emit_no_text() {
        let mut ws = Worksheet::new("S");
        ws.set_value(1, 1, f64::NAN).set_value(1, 2, "");
        ws.set_style(2, 2, filled("FF0000FF", false));
        let plan = paint_page(&Grid::extract(&ws).unwrap(), &PageConfig::default()).unwrap();
        assert_eq!(plan.text_ops().count(), 0);
        assert_eq!(plan.ops.len(), 1);
    }

    #[test]
    fn painting_is_repeatable() {
        let mut ws = Worksheet::new("S");
        ws.set_value(1, 1, "one").set_value(3, 4, 2.5);
        ws.merge("A1:B2").unwrap();
        let grid = Grid::extract(&ws).unwrap();
        let page = PageConfig::default();
        assert_eq!(paint_page(&grid, &page).unwrap(), paint_page(&grid, &page).unwrap());
    }

    #[test]
    fn mismatched_layout_is_a_render_error() {
        let mut ws = Worksheet::new("S");
        ws.set_value(2, 2, "x");
        let grid = Grid::extract(&ws).unwrap();
        let layout = PageLayout::solve(&[], &[], &PageConfig::default());
        assert!(matches!(emit(&grid, &layout), Err(XlpageError::Render(_))));
    }
}
