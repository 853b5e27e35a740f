//! Style and value resolution - turns cellXfs entries into [`Style`] records
//! and raw `<v>` text into [`CellValue`]s.

use crate::color::resolve_color;
use crate::numfmt::is_date_format_id;
use crate::types::{
    Alignment, BorderSides, CellValue, CellXf, FillStyle, FontStyle, HAlign, RawBorderSide,
    Style, StyleRef, StyleSheet, VAlign,
};

use super::worksheet::CellTypeTag;

/// Every cellXfs entry resolved once, shared by all cells that use it.
pub(super) struct ResolvedStyles {
    styles: Vec<StyleRef>,
    date_formats: Vec<bool>,
}

impl ResolvedStyles {
    pub(super) fn new(stylesheet: &StyleSheet, theme_colors: &[String]) -> Self {
        let styles = stylesheet
            .cell_xfs
            .iter()
            .map(|xf| StyleRef::new(resolve_style(xf, stylesheet, theme_colors)))
            .collect();
        let date_formats = stylesheet
            .cell_xfs
            .iter()
            .map(|xf| {
                xf.num_fmt_id
                    .is_some_and(|id| is_date_format_id(id, &stylesheet.num_fmts))
            })
            .collect();
        Self {
            styles,
            date_formats,
        }
    }

    /// Style for a cell's `s` attribute. Cells without one use cellXfs[0].
    pub(super) fn style(&self, idx: Option<u32>) -> Option<StyleRef> {
        self.styles.get(idx.unwrap_or(0) as usize).cloned()
    }

    pub(super) fn is_date(&self, idx: Option<u32>) -> bool {
        self.date_formats
            .get(idx.unwrap_or(0) as usize)
            .copied()
            .unwrap_or(false)
    }
}

/// Resolve one cellXfs entry to a full Style
pub(super) fn resolve_style(
    xf: &CellXf,
    stylesheet: &StyleSheet,
    theme_colors: &[String],
) -> Style {
    let indexed_colors = stylesheet.indexed_colors.as_ref();

    // cellXfs inherit from their cellStyleXfs parent when apply* is off
    let parent_xf = xf
        .xf_id
        .and_then(|xf_id| stylesheet.cell_style_xfs.get(xf_id as usize));
    let pick = |apply: bool, own: Option<u32>, parent: fn(&CellXf) -> Option<u32>| {
        if apply {
            own
        } else {
            parent_xf.and_then(parent).or(own)
        }
    };

    let mut style = Style::default();

    let font_id = pick(xf.apply_font, xf.font_id, |p| p.font_id);
    let font = font_id
        .and_then(|id| stylesheet.fonts.get(id as usize))
        .or(stylesheet.default_font.as_ref());
    if let Some(font) = font {
        let default_size = stylesheet.default_font.as_ref().and_then(|f| f.size);
        style.font = Some(FontStyle {
            size: font.size.or(default_size),
            bold: font.bold,
            italic: font.italic,
        });
    }

    let fill_id = pick(xf.apply_fill, xf.fill_id, |p| p.fill_id);
    if let Some(fill) = fill_id.and_then(|id| stylesheet.fills.get(id as usize)) {
        let color = fill
            .fg_color
            .as_ref()
            .and_then(|c| resolve_color(c, theme_colors, indexed_colors));
        if fill.pattern_type.is_some() || color.is_some() {
            style.fill = Some(FillStyle {
                pattern: fill.pattern_type.clone(),
                color,
            });
        }
    }

    let border_id = pick(xf.apply_border, xf.border_id, |p| p.border_id);
    if let Some(border) = border_id.and_then(|id| stylesheet.borders.get(id as usize)) {
        let side = |s: &Option<RawBorderSide>| s.as_ref().map(|s| s.style.clone());
        let sides = BorderSides {
            top: side(&border.top),
            bottom: side(&border.bottom),
            left: side(&border.left),
            right: side(&border.right),
        };
        if sides.sides().iter().any(Option::is_some) {
            style.border = Some(sides);
        }
    }

    let alignment = if xf.apply_alignment || parent_xf.is_none() {
        xf.alignment.as_ref()
    } else {
        parent_xf
            .and_then(|p| p.alignment.as_ref())
            .or(xf.alignment.as_ref())
    };
    if let Some(align) = alignment {
        style.alignment = Some(Alignment {
            horizontal: align.horizontal.as_deref().and_then(HAlign::from_xml),
            vertical: align.vertical.as_deref().and_then(VAlign::from_xml),
        });
    }

    style
}

/// Resolve the cached value of a `<c>` element
pub(super) fn resolve_cell_value(
    raw_value: Option<&str>,
    cell_type: CellTypeTag,
    shared_strings: &[String],
    is_date: bool,
    date1904: bool,
) -> Option<CellValue> {
    let raw = raw_value?;
    match cell_type {
        CellTypeTag::Shared => {
            let idx: usize = raw.trim().parse().ok()?;
            shared_strings.get(idx).cloned().map(CellValue::Text)
        }
        CellTypeTag::Str | CellTypeTag::Inline => Some(CellValue::Text(raw.to_string())),
        CellTypeTag::Bool => match raw.trim() {
            "1" | "true" => Some(CellValue::Boolean(true)),
            "0" | "false" => Some(CellValue::Boolean(false)),
            other => Some(CellValue::Text(other.to_string())),
        },
        CellTypeTag::Error => Some(CellValue::Error(raw.to_string())),
        CellTypeTag::Date => Some(CellValue::Text(raw.to_string())),
        CellTypeTag::Default => match raw.trim().parse::<f64>() {
            Ok(serial) if is_date => Some(CellValue::DateTime { serial, date1904 }),
            Ok(num) => Some(CellValue::Number(num)),
            Err(_) => Some(CellValue::Text(raw.to_string())),
        },
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
    use crate::color::DEFAULT_THEME_COLORS;
    use crate::styles::parse_styles;

    fn theme() -> Vec<String> {
        DEFAULT_THEME_COLORS.iter().map(|s| (*s).to_string()).collect()
    }

    const STYLES: &str = r#"<styleSheet>
  <fonts><font><sz val="11"/><name val="Calibri"/></font><font><b/><i/></font></fonts>
  <fills>
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor theme="4"/></patternFill></fill>
  </fills>
  <borders><border/><border><bottom style="thin"/></border></borders>
  <cellStyleXfs><xf fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs>
    <xf fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf fontId="1" fillId="2" borderId="1" numFmtId="14" xfId="0"><alignment horizontal="right" vertical="bogus"/></xf>
    <xf fontId="1" fillId="2" xfId="0" applyFont="0" applyFill="0"/>
  </cellXfs>
</styleSheet>"#;

    #[test]
    fn resolves_font_fill_border_alignment() {
        let ss = parse_styles(STYLES.as_bytes()).unwrap();
        let resolved = ResolvedStyles::new(&ss, &theme());

        let plain = resolved.style(None).unwrap();
        assert_eq!(plain.font.as_ref().unwrap().size, Some(11.0));
        assert!(plain.fill.as_ref().unwrap().color.is_none());
        assert!(plain.border.is_none());
        assert!(!resolved.is_date(None));

        let rich = resolved.style(Some(1)).unwrap();
        let font = rich.font.as_ref().unwrap();
        assert!(font.bold && font.italic);
        // size falls back to the Normal style's font
        assert_eq!(font.size, Some(11.0));
        assert_eq!(rich.fill.as_ref().unwrap().color.as_deref(), Some("#4472C4"));
        assert_eq!(rich.border.as_ref().unwrap().bottom.as_deref(), Some("thin"));
        let align = rich.alignment.unwrap();
        assert_eq!(align.horizontal, Some(HAlign::Right));
        assert_eq!(align.vertical, None);
        assert!(resolved.is_date(Some(1)));
    }

    #[test]
    fn apply_flags_fall_back_to_parent() {
        let ss = parse_styles(STYLES.as_bytes()).unwrap();
        let resolved = ResolvedStyles::new(&ss, &theme());
        let inherited = resolved.style(Some(2)).unwrap();
        assert!(!inherited.font.as_ref().unwrap().bold);
        assert_eq!(inherited.fill.as_ref().unwrap().pattern.as_deref(), Some("none"));
        assert!(resolved.style(Some(99)).is_none());
    }

    #[test]
    fn cell_values() {
        let sst = vec!["zero".to_string(), "one".to_string()];
        assert_eq!(
            resolve_cell_value(Some("1"), CellTypeTag::Shared, &sst, false, false),
            Some(CellValue::Text("one".into()))
        );
        assert_eq!(
            resolve_cell_value(Some("7"), CellTypeTag::Shared, &sst, false, false),
            None
        );
        assert_eq!(
            resolve_cell_value(Some("0"), CellTypeTag::Bool, &sst, false, false),
            Some(CellValue::Boolean(false))
        );
        assert_eq!(
            resolve_cell_value(Some("2.5"), CellTypeTag::Default, &sst, false, false),
            Some(CellValue::Number(2.5))
        );
        assert_eq!(
            resolve_cell_value(Some("45292"), CellTypeTag::Default, &sst, true, false),
            Some(CellValue::DateTime {
                serial: 45292.0,
                date1904: false
            })
        );
        assert_eq!(
            resolve_cell_value(Some("#DIV/0!"), CellTypeTag::Error, &sst, false, false),
            Some(CellValue::Error("#DIV/0!".into()))
        );
        assert_eq!(resolve_cell_value(None, CellTypeTag::Default, &sst, false, false), None);
    }
}
