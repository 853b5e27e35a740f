//! Page geometry and the named defaults used when a worksheet leaves a
//! dimension or style undeclared.

use serde::Serialize;

use crate::error::{Result, XlpageError};

/// Width of a column that declares none, in character units.
pub const DEFAULT_COL_WIDTH_CHARS: f64 = 8.43;
/// Height of a row that declares none, in points.
pub const DEFAULT_ROW_HEIGHT_PT: f64 = 15.0;
/// Average glyph width in device pixels, used to turn character units into pixels.
pub const CHAR_WIDTH_PX: f64 = 7.0;
/// Device pixels (96 dpi) to points.
pub const PX_TO_PT: f64 = 72.0 / 96.0;
pub const MM_TO_PT: f64 = 72.0 / 25.4;
pub const DEFAULT_MARGIN_MM: f64 = 12.0;
pub const DEFAULT_FONT_SIZE: f64 = 9.0;
/// Horizontal gap between a cell edge and left/right anchored text.
pub const TEXT_INSET_X: f64 = 2.0;
/// Vertical gap between a cell edge and top/bottom anchored text.
pub const TEXT_INSET_Y: f64 = 1.0;
pub const BORDER_LINE_WIDTH: f64 = 0.6;

/// Column width in points for a width in character units.
pub fn chars_to_points(chars: f64) -> f64 {
    chars * CHAR_WIDTH_PX * PX_TO_PT
}

/// Page orientation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Standard paper sizes, portrait dimensions in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageSize {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
}

impl PageSize {
    /// Portrait `(width, height)` in points.
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            Self::A3 => (297.0 * MM_TO_PT, 420.0 * MM_TO_PT),
            Self::A4 => (210.0 * MM_TO_PT, 297.0 * MM_TO_PT),
            Self::A5 => (148.0 * MM_TO_PT, 210.0 * MM_TO_PT),
            Self::Letter => (612.0, 792.0),
            Self::Legal => (612.0, 1008.0),
        }
    }
}

/// Physical page: size in points plus one margin applied on all four sides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageConfig {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl PageConfig {
    pub fn new(size: PageSize, orientation: Orientation, margin_mm: f64) -> Self {
        let (w, h) = size.dimensions();
        let (width, height) = match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        };
        Self {
            width,
            height,
            margin: margin_mm * MM_TO_PT,
        }
    }

    /// A4 landscape, used by the plain-grid renderer.
    pub fn a4_landscape() -> Self {
        Self::new(PageSize::A4, Orientation::Landscape, DEFAULT_MARGIN_MM)
    }

    pub fn printable_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    pub fn printable_height(&self) -> f64 {
        self.height - 2.0 * self.margin
    }

    /// Check that the margins leave a printable area.
    ///
    /// # Errors
    /// Returns [`XlpageError::Render`] if any dimension is non-finite or the
    /// margin swallows the page.
    pub fn validate(&self) -> Result<()> {
        let finite = self.width.is_finite() && self.height.is_finite() && self.margin.is_finite();
        if !finite
            || self.margin < 0.0
            || self.printable_width() <= 0.0
            || self.printable_height() <= 0.0
        {
            return Err(XlpageError::Render(format!(
                "page {}x{} with margin {} has no printable area",
                self.width, self.height, self.margin
            )));
        }
        Ok(())
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self::new(PageSize::A4, Orientation::Portrait, DEFAULT_MARGIN_MM)
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
    use test_case::test_case;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn default_page_is_a4_portrait() {
        let page = PageConfig::default();
        assert!(close(page.width, 595.275_590_551_181_2));
        assert!(close(page.height, 841.889_763_779_527_7));
        assert!(close(page.margin, 12.0 * 72.0 / 25.4));
        assert!(close(page.printable_width(), page.width - 2.0 * page.margin));
    }

    #[test]
    fn landscape_swaps_axes() {
        let page = PageConfig::a4_landscape();
        assert!(page.width > page.height);
        assert!(close(page.height, 595.275_590_551_181_2));
    }

    #[test_case(PageSize::Letter, 612.0, 792.0)]
    #[test_case(PageSize::Legal, 612.0, 1008.0)]
    #[test_case(PageSize::A5, 419.527_559_055_118_1, 595.275_590_551_181_2)]
    fn page_dimensions(size: PageSize, width: f64, height: f64) {
        let (w, h) = size.dimensions();
        assert!(close(w, width));
        assert!(close(h, height));
    }

    #[test]
    fn oversized_margins_are_rejected() {
        assert!(PageConfig::default().validate().is_ok());
        let page = PageConfig::new(PageSize::A5, Orientation::Landscape, 80.0);
        assert!(matches!(page.validate(), Err(XlpageError::Render(_))));
        let negative = PageConfig {
            margin: -1.0,
            ..PageConfig::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test_case(10.0, 52.5)]
    #[test_case(20.0, 105.0)]
    #[test_case(DEFAULT_COL_WIDTH_CHARS, 44.257_5)]
    fn character_widths_in_points(chars: f64, points: f64) {
        assert!(close(chars_to_points(chars), points));
    }
}
