//! CLI tool for xlpage - renders one worksheet of an XLSX file to a one-page PDF
//!
//! Usage:
//!   xlpage_cli <input.xlsx>                    # Writes <input>.pdf next to the input
//!   xlpage_cli <input.xlsx> -o out.pdf         # Explicit output path
//!   xlpage_cli <input.xlsx> --plan plan.json   # Also dump the draw plan as JSON
//!   xlpage_cli <input.xlsx> --list-sheets      # Print sheet names and exit

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use xlpage::convert::{
    export_sheet, export_sheet_with_fallback, load_sheet, render_plan, write_atomic,
    RenderOptions, RenderOutcome, Rendered,
};
use xlpage::page_setup::{Orientation, PageConfig, PageSize, DEFAULT_MARGIN_MM};
use xlpage::parser::{sheet_names, SheetSelector};

/// Render an XLSX worksheet to a single scaled-to-fit PDF page
#[derive(Parser, Debug)]
#[command(
    name = "xlpage_cli",
    about = "Render an XLSX worksheet to a single scaled-to-fit PDF page",
    version
)]
struct Args {
    /// Input workbook
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output PDF; defaults to the input path with a .pdf extension
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Worksheet name; defaults to the active sheet
    #[arg(long, conflicts_with = "sheet_index")]
    sheet: Option<String>,

    /// Zero-based worksheet position
    #[arg(long)]
    sheet_index: Option<usize>,

    /// Paper size
    #[arg(long, value_enum, default_value = "a4")]
    page: PageSizeArg,

    /// Rotate the page to landscape
    #[arg(long)]
    landscape: bool,

    /// Margin on every side, in millimetres
    #[arg(long, value_name = "MM", default_value_t = DEFAULT_MARGIN_MM)]
    margin_mm: f64,

    /// Also write the draw plan as JSON
    #[arg(long, value_name = "JSON")]
    plan: Option<PathBuf>,

    /// Fail instead of writing a plain grid when styled rendering fails
    #[arg(long)]
    no_fallback: bool,

    /// Print the workbook's sheet names and exit
    #[arg(long)]
    list_sheets: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Paper sizes for CLI
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PageSizeArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl From<PageSizeArg> for PageSize {
    fn from(arg: PageSizeArg) -> Self {
        match arg {
            PageSizeArg::A3 => PageSize::A3,
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::A5 => PageSize::A5,
            PageSizeArg::Letter => PageSize::Letter,
            PageSizeArg::Legal => PageSize::Legal,
        }
    }
}

impl Args {
    fn options(&self) -> RenderOptions {
        let orientation = if self.landscape {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };
        let sheet = match (&self.sheet, self.sheet_index) {
            (Some(name), _) => SheetSelector::Name(name.clone()),
            (None, Some(idx)) => SheetSelector::Index(idx),
            (None, None) => SheetSelector::Active,
        };
        RenderOptions {
            page: PageConfig::new(self.page.into(), orientation, self.margin_mm),
            fallback_page: PageConfig::new(
                self.page.into(),
                Orientation::Landscape,
                self.margin_mm,
            ),
            sheet,
        }
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("pdf"))
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();
}

fn list_sheets(args: &Args) -> ExitCode {
    let names = std::fs::read(&args.input)
        .map_err(xlpage::XlpageError::from)
        .and_then(|data| sheet_names(&data));
    match names {
        Ok(names) => {
            for (idx, name) in names.iter().enumerate() {
                println!("{idx}\t{name}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error reading {}: {e}", args.input.display());
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.list_sheets {
        return list_sheets(&args);
    }

    let options = args.options();
    let output = args.output_path();

    let sheet = match load_sheet(&args.input, &options.sheet) {
        Ok(sheet) => sheet,
        Err(e) => {
            eprintln!("Error reading {}: {e}", args.input.display());
            return ExitCode::FAILURE;
        }
    };

    if let Some(plan_path) = &args.plan {
        let written = render_plan(&sheet, &options.page)
            .and_then(|plan| Ok(serde_json::to_vec_pretty(&plan)?))
            .and_then(|json| write_atomic(plan_path, &json));
        match written {
            Ok(()) => eprintln!("Plan written: {}", plan_path.display()),
            Err(e) => eprintln!("Error writing plan {}: {e}", plan_path.display()),
        }
    }

    let outcome = if args.no_fallback {
        export_sheet(&sheet, &output, &options)
    } else {
        export_sheet_with_fallback(&sheet, &output, &options)
    };

    match outcome {
        RenderOutcome::Rendered(Rendered::Primary) => {
            eprintln!("Written: {}", output.display());
            ExitCode::SUCCESS
        }
        RenderOutcome::Rendered(Rendered::Fallback { primary_error }) => {
            eprintln!(
                "Styled render failed ({primary_error}); plain grid written: {}",
                output.display()
            );
            ExitCode::SUCCESS
        }
        RenderOutcome::Failed(msg) => {
            eprintln!("Error rendering {}: {msg}", args.input.display());
            ExitCode::FAILURE
        }
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

    fn options(argv: &[&str]) -> RenderOptions {
        Args::try_parse_from(argv).unwrap().options()
    }

    #[test]
    fn fallback_page_follows_paper_and_margin() {
        let opts = options(&["xlpage_cli", "in.xlsx", "--page", "letter", "--margin-mm", "5"]);
        assert_eq!(
            opts.page,
            PageConfig::new(PageSize::Letter, Orientation::Portrait, 5.0)
        );
        assert_eq!(
            opts.fallback_page,
            PageConfig::new(PageSize::Letter, Orientation::Landscape, 5.0)
        );
    }

    #[test]
    fn defaults_to_a4_and_the_active_sheet() {
        let opts = options(&["xlpage_cli", "in.xlsx"]);
        assert_eq!(opts.fallback_page, PageConfig::a4_landscape());
        assert_eq!(opts.sheet, SheetSelector::Active);
    }

    #[test]
    fn sheet_index_selects_by_position() {
        let opts = options(&["xlpage_cli", "in.xlsx", "--sheet-index", "2", "--landscape"]);
        assert_eq!(opts.sheet, SheetSelector::Index(2));
        assert!(opts.page.width > opts.page.height);
    }
}
