//! Page rendering.
//!
//! This module provides:
//! - The draw-op plan produced by the paint emitter
//! - The `PageSurface` trait a plan is replayed onto
//! - A PDF surface built on the standard Helvetica faces
//! - Helvetica metrics and WinAnsi encoding

pub mod metrics;
pub mod paint;
pub mod pdf;
pub mod surface;

pub use paint::{emit, paint_page, text_origin};
pub use pdf::PdfSurface;
pub use surface::PageSurface;

use serde::Serialize;

use crate::color::Rgb;
use crate::error::Result;
use crate::grid::{FontFace, HAnchor};
use crate::layout::Rect;

/// One drawing instruction in page coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    /// Filled rectangle without stroke.
    FillRect { rect: Rect, color: Rgb },
    /// Unfilled rectangle outline.
    StrokeRect { rect: Rect, line_width: f64 },
    /// A text run; `x` is the anchor point for `anchor`, `y` the baseline.
    Text {
        x: f64,
        y: f64,
        text: String,
        face: FontFace,
        size: f64,
        anchor: HAnchor,
    },
}

/// Everything that ends up on the single output page, in paint order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagePlan {
    pub width: f64,
    pub height: f64,
    pub ops: Vec<DrawOp>,
}

impl PagePlan {
    /// Replay every op onto a surface and finalize it.
    ///
    /// # Errors
    /// Propagates the surface's own failures.
    pub fn render_to<S: PageSurface>(&self, mut surface: S) -> Result<Vec<u8>> {
        for op in &self.ops {
            match op {
                DrawOp::FillRect { rect, color } => surface.fill_rect(rect, *color),
                DrawOp::StrokeRect { rect, line_width } => surface.stroke_rect(rect, *line_width),
                DrawOp::Text {
                    x,
                    y,
                    text,
                    face,
                    size,
                    anchor,
                } => surface.draw_text(*x, *y, text, *face, *size, *anchor),
            }
        }
        surface.finish()
    }

    /// Render the plan as a one-page PDF.
    ///
    /// # Errors
    /// See [`PdfSurface::finish`].
    pub fn to_pdf(&self) -> Result<Vec<u8>> {
        self.render_to(PdfSurface::new(self.width, self.height))
    }

    pub fn text_ops(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(|op| matches!(op, DrawOp::Text { .. }))
    }
}
