//! xlpage - XLSX worksheet to single-page PDF
//!
//! Renders one worksheet onto one fixed-size page, keeping its geometry:
//! - Column widths, row heights and merged regions
//! - Fills, borders, bold/italic Helvetica faces and cell alignment
//! - Uniform scale-to-fit inside the page margins, never upscaled
//! - A plain-grid fallback renderer for sheets the styled path cannot handle
//!
//! # Usage
//!
//! ```no_run
//! use xlpage::convert::{convert_file_with_fallback, RenderOptions};
//!
//! let outcome = convert_file_with_fallback("report.xlsx", "report.pdf", &RenderOptions::default());
//! if let Some(err) = outcome.error() {
//!     eprintln!("{err}");
//! }
//! ```

// Workbook reading
pub mod cell_ref;
pub mod color;
pub mod error;
pub mod numfmt;
pub mod parser;
pub mod source;
pub mod styles;
pub mod types;
pub mod xml_helpers;

// Page rendering
pub mod convert;
pub mod fallback;
pub mod grid;
pub mod layout;
pub mod page_setup;
pub mod render;

use wasm_bindgen::prelude::*;

pub use convert::{RenderOptions, RenderOutcome, Rendered};
pub use error::{Result, XlpageError};
pub use grid::{Grid, StyleWarning};
pub use render::{DrawOp, PagePlan};
pub use source::SheetSource;
pub use types::*;

/// Render the active sheet of an XLSX file to PDF bytes
///
/// # Arguments
/// * `data` - The raw bytes of the XLSX file
///
/// # Errors
/// Returns an error if the file cannot be read or the sheet cannot be rendered.
#[wasm_bindgen]
pub fn render_xlsx_to_pdf(data: &[u8]) -> std::result::Result<Vec<u8>, JsValue> {
    let sheet = parser::parse_active_sheet(data).map_err(|e| JsValue::from_str(&e.to_string()))?;
    convert::render_worksheet_pdf(&sheet, &RenderOptions::default())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Render the active sheet of an XLSX file and return the draw plan as JSON
///
/// # Errors
/// Returns an error if the file cannot be read or the sheet cannot be rendered.
#[wasm_bindgen]
pub fn render_xlsx_plan(data: &[u8]) -> std::result::Result<String, JsValue> {
    let sheet = parser::parse_active_sheet(data).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let plan = convert::render_plan(&sheet, &page_setup::PageConfig::default())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&plan)
        .map_err(|e| JsValue::from_str(&format!("JSON serialization error: {e}")))
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
