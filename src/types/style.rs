use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;

/// Cell style as authored in the workbook.
///
/// Every group is optional: a cell may declare a font but no fill, a fill with
/// no colour, and so on. The grid extractor flattens this into a fully
/// resolved record once per cell.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Style {
    pub font: Option<FontStyle>,
    pub fill: Option<FillStyle>,
    pub border: Option<BorderSides>,
    pub alignment: Option<Alignment>,
}

impl Style {
    /// True if no group carries any information.
    pub fn is_empty(&self) -> bool {
        self.font.is_none()
            && self.fill.is_none()
            && self.border.is_none()
            && self.alignment.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct StyleRef(pub Arc<Style>);

impl StyleRef {
    pub fn new(style: Style) -> Self {
        Self(Arc::new(style))
    }
}

impl Deref for StyleRef {
    type Target = Style;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for StyleRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl From<Style> for StyleRef {
    fn from(style: Style) -> Self {
        Self::new(style)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FontStyle {
    /// Size in points; `None` when the font does not declare one.
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FillStyle {
    /// Pattern type (`solid`, `gray125`, `none`, ...).
    pub pattern: Option<String>,
    /// Foreground colour as hex, `RRGGBB` or `AARRGGBB`, with or without `#`.
    pub color: Option<String>,
}

/// Border line style name per side (`thin`, `dashed`, `double`, ...).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BorderSides {
    pub top: Option<String>,
    pub bottom: Option<String>,
    pub left: Option<String>,
    pub right: Option<String>,
}

impl BorderSides {
    /// Same line style on all four sides.
    pub fn all(style: &str) -> Self {
        Self {
            top: Some(style.to_string()),
            bottom: Some(style.to_string()),
            left: Some(style.to_string()),
            right: Some(style.to_string()),
        }
    }

    pub fn sides(&self) -> [Option<&str>; 4] {
        [
            self.top.as_deref(),
            self.bottom.as_deref(),
            self.left.as_deref(),
            self.right.as_deref(),
        ]
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Alignment {
    pub horizontal: Option<HAlign>,
    pub vertical: Option<VAlign>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum HAlign {
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterContinuous,
    Distributed,
}

impl HAlign {
    pub fn from_xml(value: &str) -> Option<Self> {
        match value {
            "general" => Some(Self::General),
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            "fill" => Some(Self::Fill),
            "justify" => Some(Self::Justify),
            "centerContinuous" => Some(Self::CenterContinuous),
            "distributed" => Some(Self::Distributed),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum VAlign {
    Top,
    Center, // Note: Excel uses "center" not "middle"
    Bottom,
    Justify,
    Distributed,
}

impl VAlign {
    pub fn from_xml(value: &str) -> Option<Self> {
        match value {
            "top" => Some(Self::Top),
            "center" => Some(Self::Center),
            "bottom" => Some(Self::Bottom),
            "justify" => Some(Self::Justify),
            "distributed" => Some(Self::Distributed),
            _ => None,
        }
    }
}

/// Border line styles defined by SpreadsheetML.
pub const KNOWN_BORDER_STYLES: [&str; 14] = [
    "none",
    "thin",
    "medium",
    "thick",
    "dashed",
    "dotted",
    "double",
    "hair",
    "mediumDashed",
    "dashDot",
    "mediumDashDot",
    "dashDotDot",
    "mediumDashDotDot",
    "slantDashDot",
];

// ============================================================================
// Internal types for parsing styles.xml
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct RawFont {
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Default, Clone)]
pub struct RawFill {
    pub fg_color: Option<ColorSpec>,
    pub bg_color: Option<ColorSpec>,
    pub pattern_type: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct RawBorder {
    pub left: Option<RawBorderSide>,
    pub right: Option<RawBorderSide>,
    pub top: Option<RawBorderSide>,
    pub bottom: Option<RawBorderSide>,
}

#[derive(Debug, Clone)]
pub struct RawBorderSide {
    pub style: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ColorSpec {
    pub rgb: Option<String>,
    pub theme: Option<u32>,
    pub tint: Option<f64>,
    pub indexed: Option<u32>,
    pub auto: bool,
}

#[derive(Debug, Default, Clone)]
pub struct RawAlignment {
    pub horizontal: Option<String>,
    pub vertical: Option<String>,
}

/// Cell format (xf) from cellXfs or cellStyleXfs
///
/// Per ECMA-376 Section 18.8.45, the apply* attributes default to TRUE when absent.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone)]
pub struct CellXf {
    pub font_id: Option<u32>,
    pub fill_id: Option<u32>,
    pub border_id: Option<u32>,
    pub num_fmt_id: Option<u32>,
    pub alignment: Option<RawAlignment>,
    pub apply_font: bool,
    pub apply_fill: bool,
    pub apply_border: bool,
    pub apply_alignment: bool,
    /// Reference to cellStyleXfs entry (for cellXfs only)
    pub xf_id: Option<u32>,
}

impl Default for CellXf {
    fn default() -> Self {
        Self {
            font_id: None,
            fill_id: None,
            border_id: None,
            num_fmt_id: None,
            alignment: None,
            apply_font: true,
            apply_fill: true,
            apply_border: true,
            apply_alignment: true,
            xf_id: None,
        }
    }
}

/// Complete parsed style data from styles.xml
#[derive(Debug, Default)]
pub struct StyleSheet {
    pub fonts: Vec<RawFont>,
    pub fills: Vec<RawFill>,
    pub borders: Vec<RawBorder>,
    pub cell_xfs: Vec<CellXf>,
    pub num_fmts: Vec<(u32, String)>, // (numFmtId, formatCode)
    pub cell_style_xfs: Vec<CellXf>,
    /// Custom indexed colors from `<colors><indexedColors>` (if present)
    pub indexed_colors: Option<Vec<String>>,
    /// Default font from the "Normal" style (`cellStyleXfs[0]`)
    pub default_font: Option<RawFont>,
}
