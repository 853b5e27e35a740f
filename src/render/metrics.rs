//! Helvetica advance widths and WinAnsi text encoding.
//!
//! The standard 14 fonts are not embedded, so string widths for centred and
//! right-aligned text come from the Adobe font metrics. The oblique faces
//! share the widths of their upright counterparts.

use crate::grid::FontFace;

/// Advance widths (1/1000 em) of ASCII 32..=126 in Helvetica.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

/// Advance widths (1/1000 em) of ASCII 32..=126 in Helvetica-Bold.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    333, 333, 584, 584, 584, 611, 975, // :..@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    333, 278, 333, 584, 556, 333, // [..`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a..m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n..z
    389, 280, 389, 584, // {..~
];

/// Width used for every byte outside the ASCII table.
const FALLBACK_WIDTH: u16 = 556;

/// WinAnsi code points 0x80..=0x9F, where the encoding departs from Latin-1.
const WIN_ANSI_HIGH: [(char, u8); 27] = [
    ('€', 0x80),
    ('‚', 0x82),
    ('ƒ', 0x83),
    ('„', 0x84),
    ('…', 0x85),
    ('†', 0x86),
    ('‡', 0x87),
    ('ˆ', 0x88),
    ('‰', 0x89),
    ('Š', 0x8A),
    ('‹', 0x8B),
    ('Œ', 0x8C),
    ('Ž', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('•', 0x95),
    ('–', 0x96),
    ('—', 0x97),
    ('˜', 0x98),
    ('™', 0x99),
    ('š', 0x9A),
    ('›', 0x9B),
    ('œ', 0x9C),
    ('ž', 0x9E),
    ('Ÿ', 0x9F),
];

/// Encode text for a WinAnsiEncoding font. Line breaks and tabs become
/// spaces; characters the encoding cannot represent become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\t' | '\n' | '\r' => b' ',
            ' '..='~' | '\u{A0}'..='\u{FF}' => u8::try_from(u32::from(ch)).unwrap_or(b'?'),
            _ => WIN_ANSI_HIGH
                .iter()
                .find(|(c, _)| *c == ch)
                .map_or(b'?', |&(_, byte)| byte),
        })
        .collect()
}

fn byte_width(byte: u8, face: FontFace) -> u16 {
    let table = if face.is_bold() {
        &HELVETICA_BOLD_WIDTHS
    } else {
        &HELVETICA_WIDTHS
    };
    byte.checked_sub(32)
        .and_then(|i| table.get(usize::from(i)))
        .copied()
        .unwrap_or(FALLBACK_WIDTH)
}

/// Advance width in points of already encoded text.
pub fn encoded_width(bytes: &[u8], face: FontFace, size: f64) -> f64 {
    let units: u32 = bytes.iter().map(|&b| u32::from(byte_width(b, face))).sum();
    f64::from(units) * size / 1000.0
}

/// Advance width in points of `text` set in `face` at `size`.
pub fn text_width(text: &str, face: FontFace, size: f64) -> f64 {
    encoded_width(&encode_win_ansi(text), face, size)
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

    #[test]
    fn encodes_latin_and_windows_extras() {
        assert_eq!(encode_win_ansi("Abc"), b"Abc".to_vec());
        assert_eq!(encode_win_ansi("é"), vec![0xE9]);
        assert_eq!(encode_win_ansi("€5"), vec![0x80, b'5']);
        assert_eq!(encode_win_ansi("a\tb\n"), b"a b ".to_vec());
        assert_eq!(encode_win_ansi("ąž漢"), vec![b'?', 0x9E, b'?']);
    }

    #[test]
    fn widths_follow_the_font_metrics() {
        assert_eq!(text_width("", FontFace::Helvetica, 10.0), 0.0);
        // H=722 e=556 l=222 l=222 o=556
        assert!((text_width("Hello", FontFace::Helvetica, 10.0) - 22.78).abs() < 1e-9);
        // bold: H=722 e=556 l=278 l=278 o=611
        assert!((text_width("Hello", FontFace::HelveticaBold, 10.0) - 24.45).abs() < 1e-9);
        assert_eq!(
            text_width("Hello", FontFace::HelveticaOblique, 10.0),
            text_width("Hello", FontFace::Helvetica, 10.0)
        );
        assert!((text_width("é", FontFace::Helvetica, 1000.0) - 556.0).abs() < 1e-9);
    }

    #[test]
    fn tables_cover_printable_ascii() {
        assert_eq!(byte_width(b' ', FontFace::Helvetica), 278);
        assert_eq!(byte_width(b'@', FontFace::Helvetica), 1015);
        assert_eq!(byte_width(b'~', FontFace::HelveticaBold), 584);
        assert_eq!(byte_width(b'W', FontFace::HelveticaBoldOblique), 944);
    }
}
