//! Utilities for parsing Excel-style cell references and ranges.
//!
//! Rows and columns are 1-based throughout, matching the A1 notation they
//! come from.

use crate::types::CellRange;

/// Parse a cell reference like "A1" or "$B$7" into `(col, row)`, both 1-based.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    parse_cell_ref_bytes(cell_ref.trim().as_bytes())
}

/// Parse a cell reference from raw bytes (ASCII) into `(col, row)`, both 1-based.
///
/// This is the bytes equivalent of [`parse_cell_ref`] for use with raw XML
/// attribute values. Letters must precede digits.
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            if saw_row {
                return None;
            }
            let upper = b.to_ascii_uppercase();
            col = col
                .checked_mul(26)?
                .checked_add(u32::from(upper - b'A') + 1)?;
            saw_col = true;
        } else if b.is_ascii_digit() {
            row = row.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
            saw_row = true;
        } else {
            return None;
        }
    }

    if !saw_col || !saw_row || row == 0 {
        return None;
    }

    Some((col, row))
}

/// Parse a range like "A1:B10" (or a single cell "A1") into a normalized [`CellRange`].
///
/// Reversed corners ("B10:A1") are normalized so `first_*` <= `last_*`.
pub fn parse_cell_range(range: &str) -> Option<CellRange> {
    let (start, end) = range.split_once(':').unwrap_or((range, range));
    let (start_col, start_row) = parse_cell_ref(start)?;
    let (end_col, end_row) = parse_cell_ref(end)?;
    Some(CellRange::new(
        start_row.min(end_row),
        start_col.min(end_col),
        start_row.max(end_row),
        start_col.max(end_col),
    ))
}

/// Parse a defined-name area list such as `'My Sheet'!$A$1:$D$10,Sheet1!$F$1:$G$4`.
///
/// Sheet prefixes are dropped and the result is the bounding box of every
/// area that parses. Returns `None` if none does.
pub fn parse_area_list(formula: &str) -> Option<CellRange> {
    formula
        .split(',')
        .filter_map(|area| {
            let area = area.trim();
            let range_part = area.rfind('!').map_or(area, |pos| {
                area.get(pos + 1..).unwrap_or_default()
            });
            parse_cell_range(range_part)
        })
        .reduce(|acc, r| acc.union(&r))
}

/// Convert a 1-based column number to letters (1 -> "A", 27 -> "AA").
pub fn col_to_letters(col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + u8::try_from(rem).unwrap_or(0)));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Format a 1-based `(row, col)` pair as an A1 reference.
pub fn format_cell_ref(row: u32, col: u32) -> String {
    format!("{}{row}", col_to_letters(col))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("A1", Some((1, 1)); "first cell")]
    #[test_case("$C$7", Some((3, 7)); "absolute")]
    #[test_case("aa10", Some((27, 10)); "lowercase two letters")]
    #[test_case("XFD1048576", Some((16384, 1_048_576)); "last cell")]
    #[test_case("A0", None; "row zero")]
    #[test_case("12", None; "digits only")]
    #[test_case("A1B", None; "letters after digits")]
    fn parses_cell_refs(input: &str, expected: Option<(u32, u32)>) {
        assert_eq!(parse_cell_ref(input), expected);
    }

    #[test]
    fn range_is_normalized() {
        let r = parse_cell_range("C5:A1").unwrap();
        assert_eq!(r, CellRange::new(1, 1, 5, 3));
        let single = parse_cell_range("B2").unwrap();
        assert_eq!(single, CellRange::new(2, 2, 2, 2));
    }

    #[test]
    fn area_list_strips_sheet_and_unions() {
        let r = parse_area_list("'My Sheet'!$A$1:$B$2,'My Sheet'!$D$4:$E$9").unwrap();
        assert_eq!(r, CellRange::new(1, 1, 9, 5));
        assert_eq!(parse_area_list("#REF!"), None);
    }

    #[test]
    fn letters_round_trip() {
        assert_eq!(col_to_letters(1), "A");
        assert_eq!(col_to_letters(26), "Z");
        assert_eq!(col_to_letters(28), "AB");
        assert_eq!(format_cell_ref(10, 703), "AAA10");
    }
}
