//! Read-only view of a worksheet, as consumed by the renderers.
//!
//! The renderers only ever borrow a source for the duration of one call and
//! never mutate it. [`Worksheet`] is the in-memory implementation; anything
//! else that can answer these questions can be rendered too.

use crate::types::{Cell, CellRange, MergedRegion, Worksheet};

pub trait SheetSource {
    /// Sheet name, used in diagnostics.
    fn name(&self) -> &str;

    /// Declared print region, if any.
    fn print_area(&self) -> Option<CellRange>;

    /// Bounding box of every used cell, `None` for an empty sheet.
    fn used_range(&self) -> Option<CellRange>;

    /// Declared width of a 1-based column, in character units.
    fn column_width(&self, col: u32) -> Option<f64>;

    /// Declared height of a 1-based row, in points.
    fn row_height(&self, row: u32) -> Option<f64>;

    fn cell(&self, row: u32, col: u32) -> Option<&Cell>;

    fn merged_regions(&self) -> &[MergedRegion];
}

impl SheetSource for Worksheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn print_area(&self) -> Option<CellRange> {
        self.print_area
    }

    fn used_range(&self) -> Option<CellRange> {
        Worksheet::used_range(self)
    }

    fn column_width(&self, col: u32) -> Option<f64> {
        self.col_widths.get(&col).copied()
    }

    fn row_height(&self, row: u32) -> Option<f64> {
        self.row_heights.get(&row).copied()
    }

    fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    fn merged_regions(&self) -> &[MergedRegion] {
        &self.merges
    }
}
