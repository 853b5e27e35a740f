//! File-level conversion: workbook in, one-page PDF out.
//!
//! Output is all-or-nothing. The page is rendered fully in memory, written to
//! a temporary file next to the destination and only then renamed over it, so
//! a failed render never leaves a truncated or stale-looking file behind.
//!
//! The entry points here never return `Err`: every failure is reported as a
//! [`RenderOutcome::Failed`] carrying a readable diagnostic.

use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info_span, warn};

use crate::error::Result;
use crate::fallback::render_plain_grid;
use crate::grid::Grid;
use crate::page_setup::PageConfig;
use crate::parser::{parse_sheet_from, SheetSelector};
use crate::render::{paint_page, PagePlan};
use crate::source::SheetSource;
use crate::types::Worksheet;

/// Options for one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Page for the styled renderer.
    pub page: PageConfig,
    /// Page for the plain-grid fallback.
    pub fallback_page: PageConfig,
    pub sheet: SheetSelector,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page: PageConfig::default(),
            fallback_page: PageConfig::a4_landscape(),
            sheet: SheetSelector::Active,
        }
    }
}

/// Which renderer produced the output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Primary,
    /// The styled renderer failed with `primary_error`; the plain grid was written instead.
    Fallback { primary_error: String },
}

/// Result of a file-level conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum RenderOutcome {
    Rendered(Rendered),
    Failed(String),
}

impl RenderOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }

    /// Diagnostic of a failed conversion.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Rendered(_) => None,
            Self::Failed(msg) => Some(msg),
        }
    }
}

/// Run the four render stages and return the draw plan.
///
/// # Errors
/// Fails on an unusable page, an empty extent or inconsistent geometry.
pub fn render_plan<S: SheetSource + ?Sized>(source: &S, page: &PageConfig) -> Result<PagePlan> {
    page.validate()?;
    let grid = Grid::extract(source)?;
    paint_page(&grid, page)
}

/// Render a worksheet to PDF bytes with the styled renderer.
///
/// # Errors
/// See [`render_plan`].
pub fn render_worksheet_pdf<S: SheetSource + ?Sized>(
    source: &S,
    options: &RenderOptions,
) -> Result<Vec<u8>> {
    render_plan(source, &options.page)?.to_pdf()
}

/// Write `bytes` to `dest` through a temporary sibling file, creating the
/// destination directory if needed.
///
/// # Errors
/// Any I/O failure; `dest` is untouched in that case.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest)?;
    debug!(path = %dest.display(), bytes = bytes.len(), "output written");
    Ok(())
}

/// Read one worksheet from an XLSX file on disk.
///
/// # Errors
/// I/O and parse failures.
pub fn load_sheet(input: &Path, selector: &SheetSelector) -> Result<Worksheet> {
    let data = fs::read(input)?;
    parse_sheet_from(&data, selector)
}

/// Render `source` with the styled renderer and write it to `output`.
pub fn export_sheet<S: SheetSource + ?Sized>(
    source: &S,
    output: &Path,
    options: &RenderOptions,
) -> RenderOutcome {
    match render_worksheet_pdf(source, options).and_then(|pdf| write_atomic(output, &pdf)) {
        Ok(()) => RenderOutcome::Rendered(Rendered::Primary),
        Err(e) => {
            warn!(sheet = source.name(), error = %e, "styled render failed");
            RenderOutcome::Failed(e.to_string())
        }
    }
}

/// Like [`export_sheet`], but falls back to the plain grid when the styled
/// renderer fails.
pub fn export_sheet_with_fallback<S: SheetSource + ?Sized>(
    source: &S,
    output: &Path,
    options: &RenderOptions,
) -> RenderOutcome {
    let primary_error = match export_sheet(source, output, options) {
        RenderOutcome::Failed(msg) => msg,
        done @ RenderOutcome::Rendered(_) => return done,
    };
    match render_plain_grid(source, &options.fallback_page)
        .and_then(|pdf| write_atomic(output, &pdf))
    {
        Ok(()) => {
            warn!(sheet = source.name(), "plain grid written instead");
            RenderOutcome::Rendered(Rendered::Fallback { primary_error })
        }
        Err(e) => {
            warn!(sheet = source.name(), error = %e, "plain grid render failed");
            RenderOutcome::Failed(format!("{primary_error}; fallback: {e}"))
        }
    }
}

/// Convert the selected sheet of `input` into a one-page PDF at `output`.
pub fn convert_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &RenderOptions,
) -> RenderOutcome {
    let input = input.as_ref();
    let _span = info_span!("convert", input = %input.display()).entered();
    match load_sheet(input, &options.sheet) {
        Ok(sheet) => export_sheet(&sheet, output.as_ref(), options),
        Err(e) => RenderOutcome::Failed(format!("{}: {e}", input.display())),
    }
}

/// [`convert_file`] with the plain-grid fallback.
///
/// A workbook that cannot be read at all fails outright: the fallback needs
/// the same worksheet the styled renderer does.
pub fn convert_file_with_fallback(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &RenderOptions,
) -> RenderOutcome {
    let input = input.as_ref();
    let _span = info_span!("convert", input = %input.display()).entered();
    match load_sheet(input, &options.sheet) {
        Ok(sheet) => export_sheet_with_fallback(&sheet, output.as_ref(), options),
        Err(e) => RenderOutcome::Failed(format!("{}: {e}", input.display())),
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
    use crate::page_setup::{Orientation, PageSize};

    fn sheet() -> Worksheet {
        let mut ws = Worksheet::new("Report");
        ws.set_value(1, 1, "Total").set_value(1, 2, 42.0);
        ws
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn writes_into_missing_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("nested/deeper/report.pdf");
        let outcome = export_sheet(&sheet(), &out, &RenderOptions::default());
        assert_eq!(outcome, RenderOutcome::Rendered(Rendered::Primary));
        assert!(fs::read(&out).unwrap().starts_with(b"%PDF-"));
        assert_eq!(files_in(out.parent().unwrap()), vec!["report.pdf"]);
    }

    #[test]
    fn failure_leaves_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("empty.pdf");
        let outcome = export_sheet(&Worksheet::new("Blank"), &out, &RenderOptions::default());
        assert!(!outcome.is_success());
        assert!(outcome.error().unwrap().contains("Blank"));
        assert!(files_in(tmp.path()).is_empty());
    }

    #[test]
    fn failure_keeps_an_existing_file_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("keep.pdf");
        fs::write(&out, b"previous").unwrap();
        let outcome = export_sheet(&Worksheet::new("Blank"), &out, &RenderOptions::default());
        assert!(!outcome.is_success());
        assert_eq!(fs::read(&out).unwrap(), b"previous");
    }

    #[test]
    fn fallback_takes_over_after_a_primary_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("fallback.pdf");
        let outcome =
            export_sheet_with_fallback(&Worksheet::new("Blank"), &out, &RenderOptions::default());
        match outcome {
            RenderOutcome::Rendered(Rendered::Fallback { primary_error }) => {
                assert!(primary_error.contains("no used range"));
            }
            other => panic!("expected fallback, got {other:?}"),
        }
        assert!(fs::read(&out).unwrap().starts_with(b"%PDF-"));
    }

    #[test]
    fn both_renderers_failing_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("none.pdf");
        let unusable = PageConfig::new(PageSize::A5, Orientation::Portrait, 100.0);
        let options = RenderOptions {
            page: unusable,
            fallback_page: unusable,
            ..RenderOptions::default()
        };
        let outcome = export_sheet_with_fallback(&sheet(), &out, &options);
        assert!(outcome.error().unwrap().contains("fallback:"));
        assert!(!out.exists());
    }

    #[test]
    fn unreadable_input_fails_cleanly() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("missing.xlsx");
        let out = tmp.path().join("out.pdf");
        let outcome = convert_file_with_fallback(&input, &out, &RenderOptions::default());
        assert!(outcome.error().unwrap().contains("missing.xlsx"));
        assert!(!out.exists());
    }

    #[test]
    fn rendering_is_deterministic() {
        let options = RenderOptions::default();
        let a = render_worksheet_pdf(&sheet(), &options).unwrap();
        let b = render_worksheet_pdf(&sheet(), &options).unwrap();
        assert_eq!(a, b);
    }
}
