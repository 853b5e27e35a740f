//! Scale-to-fit page layout.
//!
//! Column and row sizes are shrunk by one uniform factor so the grid fits the
//! printable area, then centred. Prefix tables of the scaled sizes locate every
//! cell edge; they are built once and never change afterwards.

use serde::Serialize;

use crate::error::{Result, XlpageError};
use crate::page_setup::PageConfig;

/// Axis-aligned rectangle in page coordinates (origin bottom-left, y up).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Solved geometry for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    /// Uniform shrink factor in `(0, 1]`.
    pub scale: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    /// `col_edges[i]` = scaled offset of column `i`'s left edge; one longer
    /// than the column count.
    pub col_edges: Vec<f64>,
    /// `row_edges[i]` = scaled offset of row `i`'s top edge, measured down
    /// from the top of the grid.
    pub row_edges: Vec<f64>,
}

fn prefix_edges(sizes: &[f64], scale: f64) -> Vec<f64> {
    let mut edges = Vec::with_capacity(sizes.len() + 1);
    let mut acc = 0.0;
    edges.push(acc);
    for size in sizes {
        acc += size * scale;
        edges.push(acc);
    }
    edges
}

/// Fit factor along one axis; an empty axis never constrains.
fn axis_scale(printable: f64, total: f64) -> f64 {
    if total > 0.0 {
        printable / total
    } else {
        1.0
    }
}

impl PageLayout {
    /// Solve the layout for column widths and row heights given in points.
    pub fn solve(column_widths: &[f64], row_heights: &[f64], page: &PageConfig) -> Self {
        let printable_w = page.printable_width();
        let printable_h = page.printable_height();
        let total_w: f64 = column_widths.iter().sum();
        let total_h: f64 = row_heights.iter().sum();

        let scale = axis_scale(printable_w, total_w)
            .min(axis_scale(printable_h, total_h))
            .min(1.0);

        Self {
            scale,
            origin_x: page.margin + (printable_w - total_w * scale) / 2.0,
            origin_y: page.margin + (printable_h - total_h * scale) / 2.0,
            col_edges: prefix_edges(column_widths, scale),
            row_edges: prefix_edges(row_heights, scale),
        }
    }

    pub fn column_count(&self) -> usize {
        self.col_edges.len().saturating_sub(1)
    }

    pub fn row_count(&self) -> usize {
        self.row_edges.len().saturating_sub(1)
    }

    /// Scaled width of the whole grid.
    pub fn grid_width(&self) -> f64 {
        self.col_edges.last().copied().unwrap_or(0.0)
    }

    /// Scaled height of the whole grid.
    pub fn grid_height(&self) -> f64 {
        self.row_edges.last().copied().unwrap_or(0.0)
    }

    /// Rectangle covering `row_span` x `col_span` cells whose top-left cell is
    /// at extent-relative `(r0, c0)`. The row axis is flipped: row 0 sits at
    /// the top of the page.
    ///
    /// # Errors
    /// Returns [`XlpageError::Render`] if the span runs past the grid.
    pub fn cell_rect(
        &self,
        r0: usize,
        c0: usize,
        row_span: usize,
        col_span: usize,
    ) -> Result<Rect> {
        let out_of_grid = || {
            XlpageError::Render(format!(
                "span {row_span}x{col_span} at ({r0}, {c0}) exceeds the {}x{} grid",
                self.row_count(),
                self.column_count()
            ))
        };
        let edge = |edges: &[f64], i: usize| edges.get(i).copied();

        let left = edge(&self.col_edges, c0).ok_or_else(out_of_grid)?;
        let right = edge(&self.col_edges, c0 + col_span).ok_or_else(out_of_grid)?;
        let top = edge(&self.row_edges, r0).ok_or_else(out_of_grid)?;
        let bottom = edge(&self.row_edges, r0 + row_span).ok_or_else(out_of_grid)?;

        Ok(Rect {
            x: self.origin_x + left,
            y: self.origin_y + self.grid_height() - bottom,
            width: right - left,
            height: bottom - top,
        })
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

    const EPS: f64 = 1e-6;

    fn page(width: f64, height: f64, margin: f64) -> PageConfig {
        PageConfig {
            width,
            height,
            margin,
        }
    }

    #[test]
    fn fitting_grid_is_centred_unscaled() {
        let layout = PageLayout::solve(&[100.0, 50.0], &[20.0, 20.0], &page(400.0, 300.0, 10.0));
        assert_eq!(layout.scale, 1.0);
        assert!((layout.origin_x - (10.0 + (380.0 - 150.0) / 2.0)).abs() < EPS);
        assert!((layout.origin_y - (10.0 + (280.0 - 40.0) / 2.0)).abs() < EPS);
        assert_eq!(layout.col_edges, vec![0.0, 100.0, 150.0]);
    }

    #[test]
    fn wide_grid_shrinks_to_printable_width() {
        let cfg = page(220.0, 1000.0, 10.0);
        let layout = PageLayout::solve(&[200.0, 200.0], &[10.0], &cfg);
        assert!((layout.scale - 0.5).abs() < EPS);
        assert!((layout.grid_width() - cfg.printable_width()).abs() < EPS);
        assert!((layout.origin_x - cfg.margin).abs() < EPS);
    }

    #[test]
    fn empty_axis_does_not_divide_by_zero() {
        let layout = PageLayout::solve(&[], &[20.0], &page(200.0, 200.0, 0.0));
        assert_eq!(layout.scale, 1.0);
        assert!(layout.origin_x.is_finite());
        assert_eq!(layout.col_edges, vec![0.0]);
    }

    #[test]
    fn rows_flip_upwards() {
        let layout = PageLayout::solve(&[10.0], &[10.0, 20.0, 30.0], &page(100.0, 100.0, 5.0));
        let top = layout.cell_rect(0, 0, 1, 1).unwrap();
        let bottom = layout.cell_rect(2, 0, 1, 1).unwrap();
        assert!(top.y > bottom.y);
        assert!((bottom.y - layout.origin_y).abs() < EPS);
        assert!((top.y + top.height - (layout.origin_y + layout.grid_height())).abs() < EPS);
    }

    #[test]
    fn spans_past_the_grid_fail() {
        let layout = PageLayout::solve(&[10.0, 10.0], &[10.0], &page(100.0, 100.0, 5.0));
        assert!(layout.cell_rect(0, 1, 1, 1).is_ok());
        assert!(matches!(
            layout.cell_rect(0, 1, 1, 2),
            Err(XlpageError::Render(_))
        ));
    }
}
