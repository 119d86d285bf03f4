//! Row type

use std::collections::BTreeMap;

use crate::cell::Cell;

/// A physically present row and its cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Row index (0-based)
    pub index: u32,
    cells: BTreeMap<u16, Cell>,
}

impl Row {
    /// Create an empty row
    pub fn new(index: u32) -> Self {
        Self {
            index,
            cells: BTreeMap::new(),
        }
    }

    /// Get a cell by column index
    pub fn cell(&self, col: u16) -> Option<&Cell> {
        self.cells.get(&col)
    }

    /// Iterate over present cells, left to right
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Number of present cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Check if row has any cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub(crate) fn entry(&mut self, col: u16) -> Option<&mut Cell> {
        self.cells.get_mut(&col)
    }

    pub(crate) fn insert(&mut self, cell: Cell) {
        self.cells.insert(cell.address.col, cell);
    }
}
