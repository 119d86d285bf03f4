//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{Cell, CellAddress, CellValue};
use crate::error::Result;
use crate::format::NumberFormat;
use crate::row::Row;

/// A worksheet (single sheet in a workbook)
///
/// Storage is sparse: only cells that physically exist in the source file
/// are present, and iteration is always in document order (row-major).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Present rows keyed by 0-based index
    rows: BTreeMap<u32, Row>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterate over all present cells in document order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.values().flat_map(Row::cells)
    }

    /// Get a cell by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<Option<&Cell>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_at(addr.row, addr.col))
    }

    /// Get a cell by row and column indices
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&Cell> {
        self.rows.get(&row).and_then(|r| r.cell(col))
    }

    /// Set a cell value by address string (e.g., "A1")
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.put(addr, value.into());
        Ok(())
    }

    /// Set a formula, optionally with the result last computed for it
    pub fn set_cell_formula(
        &mut self,
        address: &str,
        formula: &str,
        cached_value: Option<CellValue>,
    ) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.put(addr, CellValue::formula_with_result(formula, cached_value));
        Ok(())
    }

    /// Set the number format of a cell, creating a blank cell if needed
    pub fn set_cell_format(&mut self, address: &str, format: NumberFormat) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_format_at(addr, format);
        Ok(())
    }

    /// Set the number format of the cell at `addr`
    pub fn set_cell_format_at(&mut self, addr: CellAddress, format: NumberFormat) {
        let row = self
            .rows
            .entry(addr.row)
            .or_insert_with(|| Row::new(addr.row));
        match row.entry(addr.col) {
            Some(cell) => cell.number_format = format,
            None => row.insert(Cell::with_format(addr, CellValue::Empty, format)),
        }
    }

    /// Insert a fully built cell, replacing any cell at the same address
    pub fn insert_cell(&mut self, cell: Cell) {
        self.rows
            .entry(cell.address.row)
            .or_insert_with(|| Row::new(cell.address.row))
            .insert(cell);
    }

    /// Number of present cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(Row::cell_count).sum()
    }

    /// Check if the sheet has no cells
    pub fn is_empty(&self) -> bool {
        self.rows.values().all(Row::is_empty)
    }

    /// Keeps the cell's existing number format.
    fn put(&mut self, addr: CellAddress, value: CellValue) {
        let row = self
            .rows
            .entry(addr.row)
            .or_insert_with(|| Row::new(addr.row));
        match row.entry(addr.col) {
            Some(cell) => cell.value = value,
            None => row.insert(Cell::new(addr, value)),
        }
    }
}
