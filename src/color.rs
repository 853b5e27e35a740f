//! Color resolution utilities
//!
//! Turns the colour references found in styles.xml (ARGB, theme slot with
//! tint, legacy palette index) into concrete RGB values.

use crate::types::ColorSpec;

/// Excel's 64 indexed colors (legacy palette)
pub const INDEXED_COLORS: [&str; 64] = [
    "#000000", "#FFFFFF", "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF",
    "#000000", "#FFFFFF", "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF",
    "#800000", "#008000", "#000080", "#808000", "#800080", "#008080", "#C0C0C0", "#808080",
    "#9999FF", "#993366", "#FFFFCC", "#CCFFFF", "#660066", "#FF8080", "#0066CC", "#CCCCFF",
    "#000080", "#FF00FF", "#FFFF00", "#00FFFF", "#800080", "#800000", "#008080", "#0000FF",
    "#00CCFF", "#CCFFFF", "#CCFFCC", "#FFFF99", "#99CCFF", "#FF99CC", "#CC99FF", "#FFCC99",
    "#3366FF", "#33CCCC", "#99CC00", "#FFCC00", "#FF9900", "#FF6600", "#666699", "#969696",
    "#003366", "#339966", "#003300", "#333300", "#993300", "#993366", "#333399", "#333333",
];

/// Default theme colors (Office theme) used when no theme is present
/// Excel theme color indices (per ECMA-376):
/// 0: lt1 (Background 1 / light1) - typically white
/// 1: dk1 (Text 1 / dark1) - typically black
/// 2: lt2 (Background 2 / light2)
/// 3: dk2 (Text 2 / dark2)
/// 4-9: accent1-accent6
/// 10: hlink (hyperlink)
/// 11: folHlink (followed hyperlink)
pub const DEFAULT_THEME_COLORS: [&str; 12] = [
    "#FFFFFF", // 0: lt1 (Background 1 - light)
    "#000000", // 1: dk1 (Text 1 - dark)
    "#E7E6E6", // 2: lt2 (Background 2 - light)
    "#44546A", // 3: dk2 (Text 2 - dark)
    "#4472C4", // 4: accent1
    "#ED7D31", // 5: accent2
    "#A5A5A5", // 6: accent3
    "#FFC000", // 7: accent4
    "#5B9BD5", // 8: accent5
    "#70AD47", // 9: accent6
    "#0563C1", // 10: hlink
    "#954F72", // 11: folHlink
];

/// Resolve a `ColorSpec` to an #RRGGBB string
///
/// Priority: rgb > theme (+tint) > indexed > auto.
pub fn resolve_color(
    color: &ColorSpec,
    theme_colors: &[String],
    indexed_colors: Option<&Vec<String>>,
) -> Option<String> {
    if let Some(rgb) = &color.rgb {
        // Excel usually writes ARGB (8 chars); drop the alpha byte
        let rgb = rgb.trim_start_matches('#');
        let rgb = if rgb.len() == 8 {
            rgb.get(2..).unwrap_or(rgb)
        } else {
            rgb
        };
        return Some(format!("#{rgb}"));
    }

    if let Some(theme_idx) = color.theme {
        let idx = theme_idx as usize;
        let base_color = theme_colors
            .get(idx)
            .map(String::as_str)
            .or_else(|| DEFAULT_THEME_COLORS.get(idx).copied())?;

        if let Some(tint) = color.tint {
            return Some(apply_tint(base_color, tint));
        }
        return Some(base_color.to_string());
    }

    if let Some(indexed) = color.indexed {
        if indexed == 64 {
            // 64 is "system foreground"
            return Some("#000000".to_string());
        }

        let idx = indexed as usize;
        if let Some(color) = indexed_colors.and_then(|palette| palette.get(idx)) {
            return Some(color.clone());
        }
        if let Some(color) = INDEXED_COLORS.get(idx) {
            return Some((*color).to_string());
        }
    }

    if color.auto {
        return Some("#000000".to_string());
    }

    None
}

/// Apply a tint value to a color
/// tint < 0: shade (darken)
/// tint > 0: tint (lighten)
#[allow(clippy::many_single_char_names)]
pub fn apply_tint(hex_color: &str, tint: f64) -> String {
    let Some(Rgb { r, g, b }) = Rgb::parse_hex(hex_color) else {
        return hex_color.to_string();
    };

    let (h, s, l) = rgb_to_hsl(r, g, b);

    let new_l = if tint < 0.0 {
        l * (1.0 + tint)
    } else {
        (1.0 - l).mul_add(tint, l)
    };

    let (r, g, b) = hsl_to_rgb(h, s, new_l.clamp(0.0, 1.0));

    format!("#{r:02X}{g:02X}{b:02X}")
}

/// An opaque 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `RRGGBB` or `AARRGGBB`, with or without a leading `#`.
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let rgb = match hex.len() {
            6 => hex,
            8 => hex.get(2..)?,
            _ => return None,
        };
        let channel = |range: std::ops::Range<usize>| {
            rgb.get(range).and_then(|s| u8::from_str_radix(s, 16).ok())
        };
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub const fn is_black(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// Channels scaled to 0.0..=1.0, as PDF colour operators expect.
    pub fn to_unit(self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Convert RGB to HSL
#[allow(clippy::many_single_char_names)]
fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = f64::midpoint(max, min);

    if (max - min).abs() < f64::EPSILON {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if (max - r).abs() < f64::EPSILON {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if (max - g).abs() < f64::EPSILON {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (h / 6.0, s, l)
}

/// Convert HSL to RGB
#[allow(clippy::many_single_char_names)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    if s.abs() < f64::EPSILON {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l.mul_add(-s, l + s)
    };
    let p = 2.0f64.mul_add(l, -q);

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    (
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    )
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }

    if t < 1.0 / 6.0 {
        return ((q - p) * 6.0).mul_add(t, p);
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return ((q - p) * (2.0 / 3.0 - t)).mul_add(6.0, p);
    }
    p
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

    fn spec() -> ColorSpec {
        ColorSpec::default()
    }

    fn theme() -> Vec<String> {
        DEFAULT_THEME_COLORS.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_tint_lighten() {
        // 50% tint on black should give gray
        assert_eq!(apply_tint("#000000", 0.5), "#808080");
    }

    #[test]
    fn test_tint_darken() {
        // 50% shade on white should give gray
        assert_eq!(apply_tint("#FFFFFF", -0.5), "#808080");
    }

    #[test]
    fn test_resolve_rgb_strips_alpha() {
        let color = ColorSpec {
            rgb: Some("FFFFFF00".to_string()),
            ..spec()
        };
        assert_eq!(resolve_color(&color, &theme(), None), Some("#FFFF00".to_string()));

        let color = ColorSpec {
            rgb: Some("#00FF00".to_string()),
            ..spec()
        };
        assert_eq!(resolve_color(&color, &theme(), None), Some("#00FF00".to_string()));
    }

    #[test]
    fn test_rgb_wins_over_theme() {
        let color = ColorSpec {
            rgb: Some("FF123456".to_string()),
            theme: Some(4),
            ..spec()
        };
        assert_eq!(resolve_color(&color, &theme(), None), Some("#123456".to_string()));
    }

    #[test]
    fn test_resolve_theme_with_tint() {
        let color = ColorSpec {
            theme: Some(4),
            ..spec()
        };
        assert_eq!(resolve_color(&color, &theme(), None), Some("#4472C4".to_string()));

        let tinted = ColorSpec {
            theme: Some(0),
            tint: Some(-0.5),
            ..spec()
        };
        assert_eq!(resolve_color(&tinted, &theme(), None), Some("#808080".to_string()));
    }

    #[test]
    fn test_resolve_indexed() {
        let color = ColorSpec {
            indexed: Some(10),
            ..spec()
        };
        assert_eq!(resolve_color(&color, &theme(), None), Some("#FF0000".to_string()));

        let custom = vec!["#111111".to_string(); 11];
        assert_eq!(
            resolve_color(&color, &theme(), Some(&custom)),
            Some("#111111".to_string())
        );

        let system = ColorSpec {
            indexed: Some(64),
            ..spec()
        };
        assert_eq!(resolve_color(&system, &theme(), None), Some("#000000".to_string()));
    }

    #[test]
    fn test_unresolvable_is_none() {
        assert_eq!(resolve_color(&spec(), &theme(), None), None);
        let out_of_range = ColorSpec {
            theme: Some(40),
            ..spec()
        };
        assert_eq!(resolve_color(&out_of_range, &theme(), None), None);
    }

    #[test]
    fn test_rgb_parse_hex() {
        assert_eq!(Rgb::parse_hex("#FF8000"), Some(Rgb::new(255, 128, 0)));
        assert_eq!(Rgb::parse_hex("FF00FF00"), Some(Rgb::new(0, 255, 0)));
        assert_eq!(Rgb::parse_hex("GG0000"), None);
        assert_eq!(Rgb::parse_hex("#FFF"), None);
        assert!(Rgb::parse_hex("000000").unwrap().is_black());
        assert_eq!(Rgb::new(1, 2, 255).to_string(), "#0102FF");
    }

    #[test]
    fn test_rgb_to_unit() {
        let (r, g, b) = Rgb::new(255, 0, 51).to_unit();
        assert_eq!(r, 1.0);
        assert_eq!(g, 0.0);
        assert!((b - 0.2).abs() < 1e-6);
    }
}
