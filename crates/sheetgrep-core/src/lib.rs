//! # sheetgrep-core
//!
//! Core data structures for the sheetgrep spreadsheet search engine.
//!
//! This crate provides the read-only spreadsheet model that the search engine
//! walks, independent of the container format it was decoded from:
//! - [`Workbook`], [`Worksheet`], [`Row`] and [`Cell`] - a sparse, ordered tree
//! - [`CellValue`] and [`CellError`] - cell contents, including formulas
//! - [`CellAddress`] - A1-style cell coordinates
//! - [`NumberFormat`] and [`format_value`] - the display string a spreadsheet
//!   application would show for a value
//!
//! ## Example
//!
//! ```rust
//! use sheetgrep_core::{CellKind, Worksheet};
//!
//! let mut sheet = Worksheet::new("Sheet1");
//! sheet.set_cell_value("A1", "hello world").unwrap();
//! sheet.set_cell_formula("A2", "A1&\"!\"", Some("hello world!".into())).unwrap();
//!
//! let kinds: Vec<_> = sheet.cells().map(|c| c.kind()).collect();
//! assert_eq!(kinds, vec![CellKind::Value, CellKind::Formula]);
//! ```

pub mod cell;
pub mod error;
pub mod format;
pub mod row;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{Cell, CellAddress, CellError, CellKind, CellValue};
pub use error::{Error, Result};
pub use format::{format_value, NumberFormat};
pub use row::Row;
pub use workbook::Workbook;
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;
