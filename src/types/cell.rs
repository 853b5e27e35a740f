use serde::{Deserialize, Serialize};

use super::StyleRef;
use crate::numfmt::{format_general, format_serial_datetime};

/// A single cell's cached value and authored style.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Cell {
    pub value: Option<CellValue>,
    pub style: Option<StyleRef>,
}

impl Cell {
    /// String form of the value; empty when the cell holds none.
    pub fn display(&self) -> String {
        self.value.as_ref().map(CellValue::display).unwrap_or_default()
    }

    /// A cell counts toward the used range if it has a value or a style.
    pub fn is_used(&self) -> bool {
        self.value.is_some() || self.style.is_some()
    }
}

/// Cached cell value. Formulas are never evaluated, only their stored result is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "camelCase")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Serial date/time under the workbook's date system.
    DateTime { serial: f64, date1904: bool },
    /// Error literal such as `#DIV/0!`.
    Error(String),
}

impl CellValue {
    /// The string the page shows for this value.
    ///
    /// Non-finite numbers have no text form and show as the empty string.
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) | Self::Error(s) => s.clone(),
            Self::Number(n) if n.is_finite() => format_general(*n),
            Self::Number(_) => String::new(),
            Self::Boolean(true) => "TRUE".to_string(),
            Self::Boolean(false) => "FALSE".to_string(),
            Self::DateTime { serial, date1904 } => {
                format_serial_datetime(*serial, *date1904).unwrap_or_default()
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}
