//! Workbook type - the root of the decoded document

use crate::worksheet::Worksheet;

/// A workbook (spreadsheet document)
///
/// Worksheets are kept in the order the workbook declares them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    worksheets: Vec<Worksheet>,
}

impl Workbook {
    /// Create an empty workbook with no worksheets
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Iterate over all worksheets in declared order
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Append a worksheet, returning its index
    pub fn add_worksheet(&mut self, worksheet: Worksheet) -> usize {
        self.worksheets.push(worksheet);
        self.worksheets.len() - 1
    }
}

impl FromIterator<Worksheet> for Workbook {
    fn from_iter<I: IntoIterator<Item = Worksheet>>(iter: I) -> Self {
        Self {
            worksheets: iter.into_iter().collect(),
        }
    }
}
