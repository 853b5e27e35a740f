use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Cell, CellValue, Style, StyleRef};
use crate::cell_ref::{format_cell_ref, parse_cell_range};
use crate::error::{Result, XlpageError};

/// Inclusive rectangular block of cells, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRange {
    pub first_row: u32,
    pub first_col: u32,
    pub last_row: u32,
    pub last_col: u32,
}

impl CellRange {
    pub const fn new(first_row: u32, first_col: u32, last_row: u32, last_col: u32) -> Self {
        Self {
            first_row,
            first_col,
            last_row,
            last_col,
        }
    }

    /// Single-cell range.
    pub const fn cell(row: u32, col: u32) -> Self {
        Self::new(row, col, row, col)
    }

    pub const fn row_count(&self) -> u32 {
        self.last_row - self.first_row + 1
    }

    pub const fn col_count(&self) -> u32 {
        self.last_col - self.first_col + 1
    }

    pub const fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.first_row
            && row <= self.last_row
            && col >= self.first_col
            && col <= self.last_col
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            self.first_row.min(other.first_row),
            self.first_col.min(other.first_col),
            self.last_row.max(other.last_row),
            self.last_col.max(other.last_col),
        )
    }

    /// Overlap of both ranges, if any.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let first_row = self.first_row.max(other.first_row);
        let first_col = self.first_col.max(other.first_col);
        let last_row = self.last_row.min(other.last_row);
        let last_col = self.last_col.min(other.last_col);
        (first_row <= last_row && first_col <= last_col)
            .then(|| Self::new(first_row, first_col, last_row, last_col))
    }
}

impl std::fmt::Display for CellRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}",
            format_cell_ref(self.first_row, self.first_col),
            format_cell_ref(self.last_row, self.last_col)
        )
    }
}

/// Merged block of cells: an anchor plus its spans (both >= 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedRegion {
    pub row: u32,
    pub col: u32,
    pub row_span: u32,
    pub col_span: u32,
}

impl MergedRegion {
    pub const fn from_range(range: CellRange) -> Self {
        Self {
            row: range.first_row,
            col: range.first_col,
            row_span: range.row_count(),
            col_span: range.col_count(),
        }
    }

    pub const fn range(&self) -> CellRange {
        CellRange::new(
            self.row,
            self.col,
            self.row + self.row_span - 1,
            self.col + self.col_span - 1,
        )
    }

    pub const fn is_anchor(&self, row: u32, col: u32) -> bool {
        self.row == row && self.col == col
    }
}

/// One worksheet held in memory: cells, dimensions, merges and print area.
///
/// Built by the XLSX reader or directly in code.
#[derive(Debug, Default, Clone)]
pub struct Worksheet {
    pub name: String,
    /// Cells keyed by 1-based `(row, col)`.
    pub cells: BTreeMap<(u32, u32), Cell>,
    /// Declared column widths in character units.
    pub col_widths: BTreeMap<u32, f64>,
    /// Declared row heights in points.
    pub row_heights: BTreeMap<u32, f64>,
    pub merges: Vec<MergedRegion>,
    pub print_area: Option<CellRange>,
}

impl Worksheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn set_value<V: Into<CellValue>>(&mut self, row: u32, col: u32, value: V) -> &mut Self {
        self.cells.entry((row, col)).or_default().value = Some(value.into());
        self
    }

    pub fn set_style(&mut self, row: u32, col: u32, style: Style) -> &mut Self {
        self.cells.entry((row, col)).or_default().style = Some(StyleRef::new(style));
        self
    }

    pub fn set_cell(&mut self, row: u32, col: u32, cell: Cell) -> &mut Self {
        self.cells.insert((row, col), cell);
        self
    }

    pub fn set_column_width(&mut self, col: u32, width: f64) -> &mut Self {
        self.col_widths.insert(col, width);
        self
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) -> &mut Self {
        self.row_heights.insert(row, height);
        self
    }

    /// Add a merged region from an A1 range such as `"A1:B2"`.
    ///
    /// # Errors
    /// Returns [`XlpageError::CellRef`] if the range does not parse or
    /// overlaps an existing merge.
    pub fn merge(&mut self, range: &str) -> Result<&mut Self> {
        let parsed =
            parse_cell_range(range).ok_or_else(|| XlpageError::CellRef(range.to_string()))?;
        if self
            .merges
            .iter()
            .any(|m| m.range().intersect(&parsed).is_some())
        {
            return Err(XlpageError::CellRef(format!("{range} overlaps an existing merge")));
        }
        self.merges.push(MergedRegion::from_range(parsed));
        Ok(self)
    }

    /// Set the print area from an A1 range.
    ///
    /// # Errors
    /// Returns [`XlpageError::CellRef`] if the range does not parse.
    pub fn set_print_area(&mut self, range: &str) -> Result<&mut Self> {
        let parsed =
            parse_cell_range(range).ok_or_else(|| XlpageError::CellRef(range.to_string()))?;
        self.print_area = Some(parsed);
        Ok(self)
    }

    /// Bounding box of every used cell and every merged region.
    pub fn used_range(&self) -> Option<CellRange> {
        let cells = self
            .cells
            .iter()
            .filter(|(_, cell)| cell.is_used())
            .map(|(&(row, col), _)| CellRange::cell(row, col));
        let merges = self.merges.iter().map(MergedRegion::range);
        cells.chain(merges).reduce(|acc, r| acc.union(&r))
    }
}
