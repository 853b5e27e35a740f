//! Drawing surface abstraction.
//!
//! A surface receives draw calls in page coordinates (points, origin at the
//! bottom-left corner) and produces the finished page bytes. The paint
//! emitter never talks to a surface directly; it builds a [`super::PagePlan`]
//! that is replayed here, so geometry is settled before any drawing happens.

use crate::color::Rgb;
use crate::error::Result;
use crate::grid::{FontFace, HAnchor};
use crate::layout::Rect;

pub trait PageSurface {
    /// Fill a rectangle with a solid colour, no stroke.
    fn fill_rect(&mut self, rect: &Rect, color: Rgb);

    /// Stroke the outline of a rectangle in black.
    fn stroke_rect(&mut self, rect: &Rect, line_width: f64);

    /// Draw a single-line string. `x` is the left edge, centre or right edge
    /// of the string depending on `anchor`; `y` is the baseline.
    fn draw_text(&mut self, x: f64, y: f64, text: &str, face: FontFace, size: f64, anchor: HAnchor);

    /// Finalize the page and return the encoded document.
    ///
    /// # Errors
    /// Implementations fail when the document cannot be assembled.
    fn finish(self) -> Result<Vec<u8>>;
}
