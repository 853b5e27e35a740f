//! XLSX reader
//!
//! Pulls one worksheet out of a workbook archive: relationships, shared
//! strings, theme, styles and workbook metadata are read first, then the
//! selected sheet part is parsed into a [`Worksheet`].

mod relationships;
pub(crate) mod styles;
mod workbook;
mod worksheet;

use std::io::{BufReader, Cursor, Read, Seek};
use tracing::{debug, info_span};
use zip::ZipArchive;

use crate::error::{Result, XlpageError};
use crate::types::Worksheet;

use relationships::{
    parse_shared_strings, parse_stylesheet, parse_theme_colors, parse_workbook_relationships,
    WorkbookRelationships,
};
use styles::ResolvedStyles;
use workbook::{parse_workbook_xml, WorkbookMeta};
use worksheet::{parse_sheet, SheetContext};

/// Which worksheet of a workbook to read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SheetSelector {
    /// The tab that was selected when the workbook was last saved.
    #[default]
    Active,
    /// Zero-based position in the workbook's tab order.
    Index(usize),
    Name(String),
}

impl std::fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("active sheet"),
            Self::Index(idx) => write!(f, "sheet #{idx}"),
            Self::Name(name) => write!(f, "sheet '{name}'"),
        }
    }
}

fn read_meta<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<(WorkbookMeta, WorkbookRelationships)> {
    let relationships = parse_workbook_relationships(archive);
    let file = archive.by_name("xl/workbook.xml")?;
    let meta = parse_workbook_xml(BufReader::new(file), &relationships.worksheets)?;
    Ok((meta, relationships))
}

/// Names of all worksheets, in tab order.
///
/// # Errors
/// Fails if the data is not a ZIP archive or has no readable workbook part.
pub fn sheet_names(data: &[u8]) -> Result<Vec<String>> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let (meta, _) = read_meta(&mut archive)?;
    Ok(meta.sheets.into_iter().map(|s| s.name).collect())
}

/// Read the active worksheet of an XLSX file.
///
/// # Errors
/// See [`parse_sheet_from`].
pub fn parse_active_sheet(data: &[u8]) -> Result<Worksheet> {
    parse_sheet_from(data, &SheetSelector::Active)
}

/// Read one worksheet of an XLSX file.
///
/// The print area comes from the workbook's `_xlnm.Print_Area` name scoped to
/// that sheet. An unreadable stylesheet is logged and replaced by default
/// styling rather than failing the read.
///
/// # Errors
/// Fails if the archive or workbook part is unreadable, if the selector
/// matches no sheet, or if the sheet part itself is malformed.
pub fn parse_sheet_from(data: &[u8], selector: &SheetSelector) -> Result<Worksheet> {
    let _span = info_span!("parse_sheet", %selector).entered();
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let (meta, relationships) = read_meta(&mut archive)?;

    let index = match selector {
        SheetSelector::Active => Some(meta.active_tab),
        SheetSelector::Index(idx) => Some(*idx),
        SheetSelector::Name(name) => meta.sheets.iter().position(|s| &s.name == name),
    };
    let (index, info) = index
        .and_then(|idx| meta.sheets.get(idx).map(|info| (idx, info)))
        .ok_or_else(|| XlpageError::MissingSheet(selector.to_string()))?;

    let theme_colors = parse_theme_colors(&mut archive, relationships.theme.as_deref());
    let shared_strings =
        parse_shared_strings(&mut archive, relationships.shared_strings.as_deref());
    let stylesheet = parse_stylesheet(&mut archive, relationships.styles.as_deref());
    let resolved = ResolvedStyles::new(&stylesheet, &theme_colors);

    let ctx = SheetContext {
        shared_strings: &shared_strings,
        styles: &resolved,
        date1904: meta.date1904,
    };
    let mut sheet = parse_sheet(&mut archive, info, &ctx)?;
    sheet.print_area = meta.print_areas.get(&index).copied();

    debug!(
        sheet = %sheet.name,
        cells = sheet.cells.len(),
        merges = sheet.merges.len(),
        print_area = ?sheet.print_area,
        "worksheet read"
    );
    Ok(sheet)
}
