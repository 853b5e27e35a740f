//! Degraded plain-grid renderer.
//!
//! Used by callers when the styled renderer fails. It ignores print areas,
//! merges and every style attribute, and draws the used range as a ruled
//! table of 8pt text. Column widths follow the longest string in each column.
//! It shares the layout solver with the styled renderer but nothing else.

use tracing::debug;

use crate::error::{Result, XlpageError};
use crate::grid::{FontFace, HAnchor, VAnchor, MAX_GRID_CELLS};
use crate::layout::PageLayout;
use crate::page_setup::{PageConfig, BORDER_LINE_WIDTH, TEXT_INSET_X};
use crate::render::metrics::text_width;
use crate::render::{text_origin, DrawOp, PagePlan};
use crate::source::SheetSource;
use crate::types::Cell;

pub const FALLBACK_FONT_SIZE: f64 = 8.0;
/// Row pitch: 1.2 line spacing, stretched by half again for padding.
pub const FALLBACK_ROW_HEIGHT: f64 = FALLBACK_FONT_SIZE * 1.2 * 1.5;
/// Narrowest column, as wide as this sample string.
const MIN_COLUMN_SAMPLE: &str = "0000";

/// Draw plan for the plain grid of `source`. An empty sheet yields a blank page.
///
/// # Errors
/// Returns [`XlpageError::Render`] if the used range is too large.
pub fn plain_grid_plan<S: SheetSource + ?Sized>(source: &S, page: &PageConfig) -> Result<PagePlan> {
    page.validate()?;
    let mut plan = PagePlan {
        width: page.width,
        height: page.height,
        ops: Vec::new(),
    };
    let Some(extent) = source.used_range() else {
        debug!(sheet = source.name(), "plain grid: empty sheet, blank page");
        return Ok(plan);
    };
    let area = u64::from(extent.row_count()) * u64::from(extent.col_count());
    if area > MAX_GRID_CELLS {
        return Err(XlpageError::Render(format!(
            "used range {extent} of '{}' spans {area} cells",
            source.name()
        )));
    }

    let face = FontFace::Helvetica;
    let min_width = text_width(MIN_COLUMN_SAMPLE, face, FALLBACK_FONT_SIZE);
    let mut column_widths = vec![min_width; extent.col_count() as usize];
    let mut texts = Vec::with_capacity(usize::try_from(area).unwrap_or(0));

    for row in extent.first_row..=extent.last_row {
        for (width, col) in column_widths
            .iter_mut()
            .zip(extent.first_col..=extent.last_col)
        {
            let text = source.cell(row, col).map(Cell::display).unwrap_or_default();
            *width = width.max(text_width(&text, face, FALLBACK_FONT_SIZE));
            texts.push(text);
        }
    }
    for width in &mut column_widths {
        *width += 2.0 * TEXT_INSET_X;
    }
    let row_heights = vec![FALLBACK_ROW_HEIGHT; extent.row_count() as usize];

    let layout = PageLayout::solve(&column_widths, &row_heights, page);
    let cols = column_widths.len();

    for i in 0..texts.len() {
        let rect = layout.cell_rect(i / cols, i % cols, 1, 1)?;
        plan.ops.push(DrawOp::StrokeRect {
            rect,
            line_width: BORDER_LINE_WIDTH,
        });
    }
    for (i, text) in texts.into_iter().enumerate() {
        if text.is_empty() {
            continue;
        }
        let rect = layout.cell_rect(i / cols, i % cols, 1, 1)?;
        let (x, y) = text_origin(&rect, HAnchor::Left, VAnchor::Middle, FALLBACK_FONT_SIZE);
        plan.ops.push(DrawOp::Text {
            x,
            y,
            text,
            face,
            size: FALLBACK_FONT_SIZE,
            anchor: HAnchor::Left,
        });
    }

    debug!(
        sheet = source.name(),
        %extent,
        scale = layout.scale,
        ops = plan.ops.len(),
        "plain grid painted"
    );
    Ok(plan)
}

/// Render the plain grid of `source` as a one-page PDF.
///
/// # Errors
/// See [`plain_grid_plan`].
pub fn render_plain_grid<S: SheetSource + ?Sized>(
    source: &S,
    page: &PageConfig,
) -> Result<Vec<u8>> {
    plain_grid_plan(source, page)?.to_pdf()
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
    use crate::types::{FillStyle, Style, Worksheet};

    fn texts(plan: &PagePlan) -> Vec<&str> {
        plan.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn draws_every_cell_without_styling() {
        let mut ws = Worksheet::new("S");
        ws.set_value(1, 1, "Name").set_value(1, 2, "Qty").set_value(2, 2, 3.0);
        ws.set_style(
            2,
            1,
            Style {
                fill: Some(FillStyle {
                    pattern: Some("solid".into()),
                    color: Some("FFFF0000".into()),
                }),
                ..Style::default()
            },
        );
        ws.merge("A1:B1").unwrap();

        let plan = plain_grid_plan(&ws, &PageConfig::a4_landscape()).unwrap();
        let strokes = plan
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::StrokeRect { .. }))
            .count();
        assert_eq!(strokes, 4);
        assert!(!plan.ops.iter().any(|op| matches!(op, DrawOp::FillRect { .. })));
        // merges are ignored, so the covered value still shows
        assert_eq!(texts(&plan), vec!["Name", "Qty", "3"]);
        for op in &plan.ops {
            if let DrawOp::Text { size, face, .. } = op {
                assert_eq!(*size, FALLBACK_FONT_SIZE);
                assert_eq!(*face, FontFace::Helvetica);
            }
        }
    }

    #[test]
    fn columns_grow_with_their_longest_text() {
        let mut ws = Worksheet::new("S");
        ws.set_value(1, 1, "a").set_value(1, 2, "a much longer heading");
        let plan = plain_grid_plan(&ws, &PageConfig::a4_landscape()).unwrap();
        let widths: Vec<f64> = plan
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::StrokeRect { rect, .. } => Some(rect.width),
                _ => None,
            })
            .collect();
        let min = text_width(MIN_COLUMN_SAMPLE, FontFace::Helvetica, FALLBACK_FONT_SIZE)
            + 2.0 * TEXT_INSET_X;
        assert!((widths[0] - min).abs() < 1e-9);
        assert!(widths[1] > widths[0]);
    }

    #[test]
    fn empty_sheet_gives_a_blank_page() {
        let plan = plain_grid_plan(&Worksheet::new("S"), &PageConfig::a4_landscape()).unwrap();
        assert!(plan.ops.is_empty());
        assert!(render_plain_grid(&Worksheet::new("S"), &PageConfig::a4_landscape())
            .unwrap()
            .starts_with(b"%PDF-"));
    }
}
