//! Search results

use std::fmt;
use std::path::{Path, PathBuf};

/// One cell whose resolved value matched the pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellMatch {
    /// Absolute path of the workbook
    pub file_path: PathBuf,
    /// Name of the sheet holding the cell
    pub sheet_name: String,
    /// A1-style address, e.g. `B7`
    pub cell_address: String,
    /// The resolved value that matched
    pub cell_value: String,
}

/// `[<file>][<sheet>][<address>] <value>`
impl fmt::Display for CellMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}][{}][{}] {}",
            self.file_path.display(),
            self.sheet_name,
            self.cell_address,
            self.cell_value
        )
    }
}

/// Matches found in one workbook, in sheet, row, cell order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    file: PathBuf,
    matches: Vec<CellMatch>,
}

impl FileResult {
    /// Create a result for `file`
    pub fn new(file: PathBuf, matches: Vec<CellMatch>) -> Self {
        Self { file, matches }
    }

    /// Absolute path of the workbook
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Matches in document order
    pub fn matches(&self) -> &[CellMatch] {
        &self.matches
    }

    /// Number of matches
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Check if the workbook had at least one match
    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }
}

/// The outcome of a whole search, ordered by file path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSummary {
    results: Vec<FileResult>,
}

impl SearchSummary {
    /// Build a summary, sorting `results` by the bytes of their paths
    pub fn new(mut results: Vec<FileResult>) -> Self {
        results.sort_by(|a, b| a.file.as_os_str().cmp(b.file.as_os_str()));
        Self { results }
    }

    /// Per-file results
    pub fn results(&self) -> &[FileResult] {
        &self.results
    }

    /// Number of files searched
    pub fn target_file_count(&self) -> usize {
        self.results.len()
    }

    /// Number of files with at least one match
    pub fn match_file_count(&self) -> usize {
        self.results.iter().filter(|r| r.has_matches()).count()
    }

    /// Number of matches across all files
    pub fn total_match_count(&self) -> usize {
        self.results.iter().map(FileResult::match_count).sum()
    }

    /// Every match, file by file
    pub fn all_matches(&self) -> impl Iterator<Item = &CellMatch> {
        self.results.iter().flat_map(|r| r.matches.iter())
    }

    /// Widest per-file match count in decimal digits
    pub fn max_match_count_width(&self) -> usize {
        self.results
            .iter()
            .map(|r| r.match_count().to_string().len())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell_match(file: &str, address: &str) -> CellMatch {
        CellMatch {
            file_path: PathBuf::from(file),
            sheet_name: "Sheet1".into(),
            cell_address: address.into(),
            cell_value: "hit".into(),
        }
    }

    fn file_result(file: &str, count: usize) -> FileResult {
        let matches = (1..=count)
            .map(|row| cell_match(file, &format!("A{row}")))
            .collect();
        FileResult::new(PathBuf::from(file), matches)
    }

    #[test]
    fn test_display_line() {
        assert_eq!(
            cell_match("/data/book.xlsx", "B7").to_string(),
            "[/data/book.xlsx][Sheet1][B7] hit"
        );
    }

    #[test]
    fn test_results_sorted_by_path_bytes() {
        let summary = SearchSummary::new(vec![
            file_result("/b.xlsx", 0),
            file_result("/a/z.xlsx", 0),
            file_result("/B.xlsx", 0),
            file_result("/a.xlsx", 0),
        ]);
        let order: Vec<_> = summary
            .results()
            .iter()
            .map(|r| r.file().to_string_lossy().into_owned())
            .collect();
        assert_eq!(order, vec!["/B.xlsx", "/a.xlsx", "/a/z.xlsx", "/b.xlsx"]);
    }

    #[test]
    fn test_counts() {
        let summary = SearchSummary::new(vec![
            file_result("/one.xlsx", 12),
            file_result("/two.xlsx", 0),
            file_result("/three.xlsx", 3),
        ]);
        assert_eq!(summary.target_file_count(), 3);
        assert_eq!(summary.match_file_count(), 2);
        assert_eq!(summary.total_match_count(), 15);
        assert_eq!(summary.all_matches().count(), 15);
        assert_eq!(summary.max_match_count_width(), 2);
    }

    #[test]
    fn test_empty_summary() {
        let summary = SearchSummary::default();
        assert_eq!(summary.target_file_count(), 0);
        assert_eq!(summary.total_match_count(), 0);
        assert_eq!(summary.max_match_count_width(), 0);
    }
}
