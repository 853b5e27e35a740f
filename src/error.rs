//! Structured error types for xlpage.
//!
//! Style-level anomalies never show up here: they are absorbed by the grid
//! extractor and reported as [`crate::grid::StyleWarning`]s instead.

/// All errors that can occur while reading a workbook or rendering a page.
#[derive(Debug, thiserror::Error)]
pub enum XlpageError {
    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The worksheet has neither a print area nor any used cell.
    #[error("worksheet '{sheet}' has no used range to render")]
    EmptyExtent { sheet: String },

    /// The requested worksheet does not exist in the workbook.
    #[error("worksheet not found: {0}")]
    MissingSheet(String),

    /// Invalid cell reference.
    #[error("Invalid cell reference: {0}")]
    CellRef(String),

    /// General parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Geometry or page finalization failure.
    #[error("Render error: {0}")]
    Render(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, XlpageError>;

impl From<serde_json::Error> for XlpageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Render(format!("plan serialization: {e}"))
    }
}

impl From<tempfile::PersistError> for XlpageError {
    fn from(e: tempfile::PersistError) -> Self {
        Self::Io(e.error)
    }
}
