//! Single-page PDF surface on top of `pdf-writer`.
//!
//! Text uses the four standard Helvetica faces with WinAnsiEncoding, so no
//! font program is embedded. The content stream is zlib-compressed. Nothing
//! time-dependent is written, so equal plans produce equal bytes.

use pdf_writer::{Content, Filter, Name, Pdf, Ref, Str};
use tracing::debug;

use super::metrics::{encode_win_ansi, encoded_width};
use super::surface::PageSurface;
use crate::color::Rgb;
use crate::error::{Result, XlpageError};
use crate::grid::{FontFace, HAnchor};
use crate::layout::Rect;

const CATALOG_ID: i32 = 1;
const PAGE_TREE_ID: i32 = 2;
const PAGE_ID: i32 = 3;
const CONTENT_ID: i32 = 4;
/// Font objects follow in [`FontFace::ALL`] order.
const FIRST_FONT_ID: i32 = 5;

const COMPRESSION_LEVEL: u8 = 6;

/// Coordinates and sizes go out as single precision, as PDF readers use.
#[allow(clippy::cast_possible_truncation)]
fn pt(v: f64) -> f32 {
    v as f32
}

/// Resource name of a face: `/F1` .. `/F4`.
const fn font_resource(face: FontFace) -> &'static [u8] {
    match face {
        FontFace::Helvetica => b"F1",
        FontFace::HelveticaBold => b"F2",
        FontFace::HelveticaOblique => b"F3",
        FontFace::HelveticaBoldOblique => b"F4",
    }
}

fn font_ref(index: usize) -> Ref {
    Ref::new(FIRST_FONT_ID + i32::try_from(index).unwrap_or(0))
}

/// A one-page PDF under construction.
pub struct PdfSurface {
    width: f64,
    height: f64,
    content: Content,
    ops: usize,
}

impl PdfSurface {
    /// Start an empty page of `width` x `height` points.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            content: Content::new(),
            ops: 0,
        }
    }

    fn assemble(width: f64, height: f64, raw: &[u8]) -> Vec<u8> {
        let mut pdf = Pdf::new();
        let page_tree_id = Ref::new(PAGE_TREE_ID);
        let page_id = Ref::new(PAGE_ID);
        let content_id = Ref::new(CONTENT_ID);

        pdf.catalog(Ref::new(CATALOG_ID)).pages(page_tree_id);
        pdf.pages(page_tree_id).kids([page_id]).count(1);

        {
            let mut page = pdf.page(page_id);
            page.media_box(pdf_writer::Rect::new(0.0, 0.0, pt(width), pt(height)))
                .parent(page_tree_id)
                .contents(content_id);
            let mut resources = page.resources();
            let mut fonts = resources.fonts();
            for (i, face) in FontFace::ALL.iter().enumerate() {
                fonts.pair(Name(font_resource(*face)), font_ref(i));
            }
        }

        for (i, face) in FontFace::ALL.iter().enumerate() {
            pdf.type1_font(font_ref(i))
                .base_font(Name(face.base_name().as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
        }

        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw, COMPRESSION_LEVEL);
        pdf.stream(content_id, &compressed)
            .filter(Filter::FlateDecode);

        pdf.finish()
    }
}

impl PageSurface for PdfSurface {
    fn fill_rect(&mut self, rect: &Rect, color: Rgb) {
        let (r, g, b) = color.to_unit();
        self.content
            .save_state()
            .set_fill_rgb(r, g, b)
            .rect(pt(rect.x), pt(rect.y), pt(rect.width), pt(rect.height))
            .fill_nonzero()
            .restore_state();
        self.ops += 1;
    }

    fn stroke_rect(&mut self, rect: &Rect, line_width: f64) {
        self.content
            .save_state()
            .set_stroke_rgb(0.0, 0.0, 0.0)
            .set_line_width(pt(line_width))
            .rect(pt(rect.x), pt(rect.y), pt(rect.width), pt(rect.height))
            .stroke()
            .restore_state();
        self.ops += 1;
    }

    fn draw_text(
        &mut self,
        x: f64,
        y: f64,
        text: &str,
        face: FontFace,
        size: f64,
        anchor: HAnchor,
    ) {
        let bytes = encode_win_ansi(text);
        let start_x = match anchor {
            HAnchor::Left => x,
            HAnchor::Center => x - encoded_width(&bytes, face, size) / 2.0,
            HAnchor::Right => x - encoded_width(&bytes, face, size),
        };
        self.content
            .set_fill_rgb(0.0, 0.0, 0.0)
            .begin_text()
            .set_font(Name(font_resource(face)), pt(size))
            .next_line(pt(start_x), pt(y))
            .show(Str(&bytes))
            .end_text();
        self.ops += 1;
    }

    /// # Errors
    /// Returns [`XlpageError::Render`] for a page without a positive, finite size.
    fn finish(self) -> Result<Vec<u8>> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(self.width) || !valid(self.height) {
            return Err(XlpageError::Render(format!(
                "invalid page size {}x{}",
                self.width, self.height
            )));
        }
        let raw = self.content.finish();
        let bytes = Self::assemble(self.width, self.height, &raw);
        debug!(ops = self.ops, content = raw.len(), bytes = bytes.len(), "pdf page finished");
        Ok(bytes)
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

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    fn sample(surface: &mut PdfSurface) {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        surface.fill_rect(&rect, Rgb::new(255, 0, 0));
        surface.stroke_rect(&rect, 0.6);
        surface.draw_text(60.0, 25.0, "Total", FontFace::HelveticaBold, 12.0, HAnchor::Center);
    }

    #[test]
    fn writes_one_page_with_standard_fonts() {
        let mut surface = PdfSurface::new(595.0, 842.0);
        sample(&mut surface);
        let bytes = surface.finish().unwrap();

        assert!(bytes.starts_with(b"%PDF-"));
        assert!(contains(&bytes, "/Count 1"));
        assert!(contains(&bytes, "/FlateDecode"));
        assert!(contains(&bytes, "/WinAnsiEncoding"));
        for face in FontFace::ALL {
            assert!(contains(&bytes, &format!("/{}", face.base_name())));
        }
    }

    #[test]
    fn output_is_deterministic() {
        let render = || {
            let mut surface = PdfSurface::new(595.0, 842.0);
            sample(&mut surface);
            surface.finish().unwrap()
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn content_stream_carries_the_drawing() {
        let mut surface = PdfSurface::new(595.0, 842.0);
        sample(&mut surface);
        let raw = surface.content.finish();
        assert!(contains(&raw, " re"));
        assert!(contains(&raw, "\nf\n"));
        assert!(contains(&raw, "/F2 12 Tf"));
        assert!(contains(&raw, "(Total) Tj"));
    }

    #[test]
    fn centred_text_starts_half_its_width_left() {
        let mut surface = PdfSurface::new(200.0, 200.0);
        // a + W = 556 + 944 units, 12pt wide at 8pt
        surface.draw_text(100.0, 50.0, "aW", FontFace::Helvetica, 8.0, HAnchor::Center);
        surface.draw_text(100.0, 30.0, "aW", FontFace::Helvetica, 8.0, HAnchor::Right);
        let raw = surface.content.finish();
        assert!(contains(&raw, "94 50 Td"));
        assert!(contains(&raw, "88 30 Td"));
    }

    #[test]
    fn zero_sized_page_is_rejected() {
        let surface = PdfSurface::new(0.0, 842.0);
        assert!(matches!(surface.finish(), Err(XlpageError::Render(_))));
    }
}
