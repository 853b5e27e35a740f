//! Data types for worksheets, cells and styles.

mod cell;
mod style;
mod worksheet;

pub use cell::*;
pub use style::*;
pub use worksheet::*;
