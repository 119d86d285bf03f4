//! Cell-related types
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`Cell`] - A value at an address, with its number format

mod address;
mod value;

pub use address::CellAddress;
pub use value::{CellError, CellValue};

use crate::error::Result;
use crate::format::{format_value, NumberFormat};

/// Broad classification of a cell, as seen by the search engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// Cell exists but holds nothing
    Blank,
    /// Cell holds a formula (with or without a cached result)
    Formula,
    /// Any other literal value
    Value,
}

/// A single physically present cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Location within the sheet
    pub address: CellAddress,
    /// Stored value
    pub value: CellValue,
    /// Display format applied to the value
    pub number_format: NumberFormat,
}

impl Cell {
    /// Create a cell with the General format
    pub fn new(address: CellAddress, value: CellValue) -> Self {
        Self {
            address,
            value,
            number_format: NumberFormat::General,
        }
    }

    /// Create a cell with an explicit number format
    pub fn with_format(address: CellAddress, value: CellValue, number_format: NumberFormat) -> Self {
        Self {
            address,
            value,
            number_format,
        }
    }

    /// Classify this cell
    pub fn kind(&self) -> CellKind {
        match &self.value {
            CellValue::Empty => CellKind::Blank,
            CellValue::Formula { .. } => CellKind::Formula,
            _ => CellKind::Value,
        }
    }

    /// Formula source text (without the leading `=`), if this is a formula cell
    pub fn formula_text(&self) -> Option<&str> {
        self.value.formula_text()
    }

    /// The string a spreadsheet application would display for this cell.
    ///
    /// For formula cells this is the formatted cached result.
    pub fn formatted_value(&self) -> Result<String> {
        format_value(&self.value, &self.number_format)
    }

    /// Unformatted string form of the underlying value
    pub fn raw_value(&self) -> String {
        self.value.to_string()
    }
}
