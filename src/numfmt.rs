//! Number format lookup and value-to-text conversion.
//!
//! The page shows each value's plain string form rather than applying the
//! full number-format mini-language. Format codes are still consulted to
//! decide whether a stored number is really a date/time serial.

/// Built-in number format IDs (0-49 are predefined by Excel)
/// See: ECMA-376 Part 1, Section 18.8.30
pub const fn get_builtin_format(id: u32) -> Option<&'static str> {
    match id {
        0 => Some("General"),
        1 => Some("0"),
        2 => Some("0.00"),
        3 => Some("#,##0"),
        4 => Some("#,##0.00"),
        5 => Some("$#,##0_);($#,##0)"),
        6 => Some("$#,##0_);[Red]($#,##0)"),
        7 => Some("$#,##0.00_);($#,##0.00)"),
        8 => Some("$#,##0.00_);[Red]($#,##0.00)"),
        9 => Some("0%"),
        10 => Some("0.00%"),
        11 => Some("0.00E+00"),
        12 => Some("# ?/?"),
        13 => Some("# ??/??"),
        14 => Some("mm-dd-yy"),
        15 => Some("d-mmm-yy"),
        16 => Some("d-mmm"),
        17 => Some("mmm-yy"),
        18 => Some("h:mm AM/PM"),
        19 => Some("h:mm:ss AM/PM"),
        20 => Some("h:mm"),
        21 => Some("h:mm:ss"),
        22 => Some("m/d/yy h:mm"),
        37 => Some("#,##0 ;(#,##0)"),
        38 => Some("#,##0 ;[Red](#,##0)"),
        39 => Some("#,##0.00;(#,##0.00)"),
        40 => Some("#,##0.00;[Red](#,##0.00)"),
        41 => Some("_(* #,##0_);_(* (#,##0);_(* \"-\"_);_(@_)"),
        42 => Some("_($* #,##0_);_($* (#,##0);_($* \"-\"_);_(@_)"),
        43 => Some("_(* #,##0.00_);_(* (#,##0.00);_(* \"-\"??_);_(@_)"),
        44 => Some("_($* #,##0.00_);_($* (#,##0.00);_($* \"-\"??_);_(@_)"),
        45 => Some("mm:ss"),
        46 => Some("[h]:mm:ss"),
        47 => Some("mmss.0"),
        48 => Some("##0.0E+0"),
        49 => Some("@"),
        _ => None,
    }
}

/// Check if a format code is a date/time format
pub fn is_date_format(format_code: &str) -> bool {
    let lower = format_code.to_lowercase();

    // Skip text in quotes and brackets
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut cleaned = String::new();

    for c in lower.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            '[' => in_brackets = true,
            ']' => in_brackets = false,
            _ if !in_quotes && !in_brackets => cleaned.push(c),
            _ => {}
        }
    }

    if cleaned == "general" {
        return false;
    }

    cleaned.contains('y') ||
    cleaned.contains('m') && !cleaned.contains('#') ||  // m is month if no # (number format)
    cleaned.contains('d') ||
    cleaned.contains('h') ||
    cleaned.contains('s') && cleaned.contains(':') // s is seconds if with colon
}

/// Whether a numFmtId (with the workbook's custom codes) denotes a date/time.
pub fn is_date_format_id(id: u32, custom: &[(u32, String)]) -> bool {
    if let Some((_, code)) = custom.iter().find(|(fid, _)| *fid == id) {
        return is_date_format(code);
    }
    get_builtin_format(id).is_some_and(is_date_format)
}

/// Largest magnitude below which every integer is exactly representable.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// General format: every significant digit of the stored value.
///
/// Whole numbers below 2^53 print as integers. Other values use the shortest
/// text that reads back to the same `f64`, switching to an `E+NN` exponent
/// only outside `[1e-5, 1e16)`.
#[allow(clippy::float_cmp)]
#[allow(clippy::cast_possible_truncation)]
pub fn format_general(value: f64) -> String {
    let magnitude = value.abs();
    if value == value.trunc() && magnitude < EXACT_INTEGER_LIMIT {
        // Integer display; avoids "-0"
        format!("{}", value as i64)
    } else if magnitude >= 1e16 || magnitude < 1e-5 {
        exponent_form(value)
    } else {
        format!("{value}")
    }
}

/// `1.5e20` as `1.5E+20`, `2.5e-7` as `2.5E-07`.
fn exponent_form(value: f64) -> String {
    let raw = format!("{value:e}");
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{mantissa}E{sign}{digits:0>2}")
        }
        None => raw,
    }
}

/// Render a serial date/time as `YYYY-MM-DD HH:MM:SS`.
///
/// Serials in `[0, 1)` carry no date part and render as `HH:MM:SS`.
/// Negative or non-finite serials have no calendar form.
pub fn format_serial_datetime(serial: f64, date1904: bool) -> Option<String> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let (year, month, day, hour, minute, second) = excel_date_to_components(serial, date1904);
    if serial < 1.0 && !date1904 {
        return Some(format!("{hour:02}:{minute:02}:{second:02}"));
    }
    Some(format!(
        "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
    ))
}

/// Convert Excel serial date to (year, month, day, hour, minute, second)
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn excel_date_to_components(serial: f64, date1904: bool) -> (i32, u32, u32, u32, u32, u32) {
    let mut days = serial.floor() as i32;
    let time_frac = serial.fract().abs();

    // Time components; rounding up to midnight rolls into the next day
    let mut total_seconds = (time_frac * 86400.0).round() as u32;
    if total_seconds >= 86_400 {
        total_seconds -= 86_400;
        days += 1;
    }

    // Convert Excel serial to Julian Day Number
    // Excel 1900 system: serial 1 = Jan 1, 1900 = JDN 2415021
    // Excel 1904 system: serial 0 = Jan 1, 1904 = JDN 2416481
    let jdn = if date1904 {
        days + 2_416_481
    } else if days <= 60 {
        // Excel believes 1900 was a leap year; serial 60 is the phantom Feb 29
        days + 2_415_020
    } else {
        days + 2_415_019
    };

    let (year, month, day_of_month) = jdn_to_ymd(jdn);

    let hour = total_seconds / 3600;
    let minute = (total_seconds % 3600) / 60;
    let second = total_seconds % 60;

    (year, month, day_of_month, hour, minute, second)
}

/// Convert Julian Day Number to (year, month, day) in proleptic Gregorian calendar
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn jdn_to_ymd(jdn: i32) -> (i32, u32, u32) {
    // https://en.wikipedia.org/wiki/Julian_day#Julian_or_Gregorian_calendar_from_Julian_day_number
    let y = 4716;
    let j = 1401;
    let m = 2;
    let n = 12;
    let r = 4;
    let p = 1461;
    let v = 3;
    let u = 5;
    let s = 153;
    let w = 2;
    let b = 274_277;
    let c = -38;

    let jdn_i64 = i64::from(jdn);

    let f = jdn_i64 + j + (((4 * jdn_i64 + b) / 146_097) * 3) / 4 + c;
    let e = r * f + v;
    let g = (e % p) / r;
    let h = u * g + w;

    let day = (h % s) / u + 1;
    let month = ((h / s + m) % n) + 1;
    let year = (e / p) - y + (n + m - month) / n;

    (year as i32, month as u32, day as u32)
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

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_general_format() {
        assert_eq!(format_general(42.0), "42");
        assert_eq!(format_general(-7.0), "-7");
        assert_eq!(format_general(3.14159), "3.14159");
        assert_eq!(format_general(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_general(-0.0), "0");
    }

    #[test_case(1_234_567_890_123.0, "1234567890123"; "long identifier")]
    #[test_case(1e15, "1000000000000000"; "quadrillion")]
    #[test_case(9_007_199_254_740_991.0, "9007199254740991"; "largest exact integer")]
    #[test_case(123_456_789.125, "123456789.125"; "large fraction")]
    #[test_case(0.00005, "0.00005"; "small fraction")]
    #[test_case(1.5e20, "1.5E+20"; "huge")]
    #[test_case(-2.5e-7, "-2.5E-07"; "tiny negative")]
    fn general_format_keeps_every_digit(value: f64, expected: &str) {
        assert_eq!(format_general(value), expected);
    }

    #[test]
    fn test_date_detection() {
        assert!(is_date_format("yyyy-mm-dd"));
        assert!(is_date_format("m/d/yy"));
        assert!(is_date_format("[$-409]h:mm AM/PM"));
        assert!(!is_date_format("#,##0.00"));
        assert!(!is_date_format("General"));
        assert!(!is_date_format("\"days\" 0"));
    }

    #[test]
    fn test_date_format_ids() {
        assert!(is_date_format_id(14, &[]));
        assert!(is_date_format_id(22, &[]));
        assert!(!is_date_format_id(2, &[]));
        let custom = vec![(164, "dd/mm/yyyy".to_string()), (165, "0.000".to_string())];
        assert!(is_date_format_id(164, &custom));
        assert!(!is_date_format_id(165, &custom));
        assert!(!is_date_format_id(200, &custom));
    }

    #[test_case(1.0, false, "1900-01-01 00:00:00"; "epoch")]
    #[test_case(59.0, false, "1900-02-28 00:00:00"; "before phantom leap day")]
    #[test_case(61.0, false, "1900-03-01 00:00:00"; "after phantom leap day")]
    #[test_case(45_292.75, false, "2024-01-01 18:00:00"; "evening")]
    #[test_case(0.0, true, "1904-01-01 00:00:00"; "1904 epoch")]
    #[test_case(0.5, false, "12:00:00"; "time only")]
    #[test_case(44_926.999_999_99, false, "2023-01-01 00:00:00"; "rounds into next day")]
    fn test_serial_datetime(serial: f64, date1904: bool, expected: &str) {
        assert_eq!(
            format_serial_datetime(serial, date1904).as_deref(),
            Some(expected)
        );
    }

    #[test]
    fn test_serial_without_calendar_form() {
        assert_eq!(format_serial_datetime(-1.0, false), None);
        assert_eq!(format_serial_datetime(f64::NAN, false), None);
    }
}
