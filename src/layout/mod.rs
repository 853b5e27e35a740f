//! Layout engine: turns dimension tables into page positions.
//!
//! This module handles:
//! - Uniform scale-to-fit against the printable area
//! - Centring the scaled grid on the page
//! - Prefix-sum edge tables and merged-span rectangles with the row axis flipped

mod page_layout;

pub use page_layout::{PageLayout, Rect};
