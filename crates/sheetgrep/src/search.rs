//! Workbook traversal and the search driver

use std::path::Path;

use log::{debug, trace};
use rayon::prelude::*;
use sheetgrep_core::{CellKind, Workbook};

use crate::config::SearchConfig;
use crate::discover::discover_files;
use crate::error::{Result, SearchError};
use crate::pattern::CompiledPattern;
use crate::reader::{CalamineReader, WorkbookReader};
use crate::resolve::resolve_cell_value;
use crate::result::{CellMatch, FileResult, SearchSummary};

/// Collect every match in `workbook`, in sheet, row, cell order.
///
/// Blank cells are never resolved or matched.
pub fn search_workbook(
    file: &Path,
    workbook: &Workbook,
    pattern: &CompiledPattern,
    config: &SearchConfig,
) -> Vec<CellMatch> {
    let mut matches = Vec::new();

    for sheet in workbook.worksheets() {
        for cell in sheet.cells() {
            if cell.kind() == CellKind::Blank {
                continue;
            }

            let value = resolve_cell_value(cell, config.match_formula_result);
            trace!(
                "file: {}, sheet: {}, cell: {}, value: {:?}",
                file.display(),
                sheet.name(),
                cell.address,
                value
            );

            if pattern.is_match(&value) {
                matches.push(CellMatch {
                    file_path: file.to_path_buf(),
                    sheet_name: sheet.name().to_string(),
                    cell_address: cell.address.to_string(),
                    cell_value: value,
                });
            }
        }
    }

    matches
}

/// Searches spreadsheet files for a pattern
///
/// ```no_run
/// use sheetgrep::{SearchConfig, SheetGrep};
///
/// let config = SearchConfig {
///     ignore_case: true,
///     recursive: true,
///     ..Default::default()
/// };
/// let summary = SheetGrep::new(config).search("total", &["reports"])?;
/// for m in summary.all_matches() {
///     println!("{m}");
/// }
/// # Ok::<(), sheetgrep::SearchError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SheetGrep<R: WorkbookReader = CalamineReader> {
    config: SearchConfig,
    reader: R,
}

impl SheetGrep {
    /// Create a searcher that decodes files with calamine
    pub fn new(config: SearchConfig) -> Self {
        Self::with_reader(config, CalamineReader)
    }
}

impl<R: WorkbookReader> SheetGrep<R> {
    /// Create a searcher with a custom workbook reader
    pub fn with_reader(config: SearchConfig, reader: R) -> Self {
        Self { config, reader }
    }

    /// The configuration this searcher was built with
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search every spreadsheet under `paths` for `pattern`.
    ///
    /// The pattern is compiled and all files are discovered before any
    /// workbook is opened. The first file that fails to open aborts the
    /// search. Results are ordered by file path whether or not the files
    /// were searched in parallel.
    pub fn search<P: AsRef<Path>>(&self, pattern: &str, paths: &[P]) -> Result<SearchSummary> {
        debug!("config: {:?}", self.config);
        debug!("pattern: {:?}", pattern);
        debug!(
            "paths: {:?}",
            paths.iter().map(|p| p.as_ref()).collect::<Vec<_>>()
        );

        let pattern = CompiledPattern::compile(pattern, &self.config)?;
        let files = discover_files(paths, self.config.recursive)?;

        let results = if self.config.parallel {
            files
                .par_iter()
                .map(|file| self.search_file(file, &pattern))
                .collect::<Result<Vec<_>>>()?
        } else {
            files
                .iter()
                .map(|file| self.search_file(file, &pattern))
                .collect::<Result<Vec<_>>>()?
        };

        Ok(SearchSummary::new(results))
    }

    fn search_file(&self, file: &Path, pattern: &CompiledPattern) -> Result<FileResult> {
        debug!("searching {}", file.display());

        let workbook = self
            .reader
            .open(file)
            .map_err(|source| SearchError::Workbook {
                path: file.to_path_buf(),
                source,
            })?;
        let matches = search_workbook(file, &workbook, pattern, &self.config);

        debug!("{} match(es) in {}", matches.len(), file.display());
        Ok(FileResult::new(file.to_path_buf(), matches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadError;
    use pretty_assertions::assert_eq;
    use sheetgrep_core::{CellValue, NumberFormat, Worksheet};
    use std::collections::HashMap;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Serves workbooks by file name; names it does not know fail to open
    #[derive(Default)]
    struct FakeReader {
        books: HashMap<String, Workbook>,
    }

    impl FakeReader {
        fn with(mut self, name: &str, workbook: Workbook) -> Self {
            self.books.insert(name.to_string(), workbook);
            self
        }
    }

    impl WorkbookReader for FakeReader {
        fn open(&self, path: &Path) -> std::result::Result<Workbook, ReadError> {
            let name = path.file_name().unwrap().to_string_lossy();
            self.books.get(name.as_ref()).cloned().ok_or_else(|| {
                ReadError::Io(io::Error::new(io::ErrorKind::InvalidData, "corrupt"))
            })
        }
    }

    fn hello_world_book() -> Workbook {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_value("A1", "hello world").unwrap();
        sheet
            .set_cell_formula("A2", "A1&\"!\"", Some("hello world!".into()))
            .unwrap();
        [sheet].into_iter().collect()
    }

    fn single_value_book(sheet: &str, addr: &str, value: &str) -> Workbook {
        let mut ws = Worksheet::new(sheet);
        ws.set_cell_value(addr, value).unwrap();
        [ws].into_iter().collect()
    }

    fn pattern(text: &str) -> CompiledPattern {
        CompiledPattern::compile(text, &SearchConfig::default()).unwrap()
    }

    fn addresses(matches: &[CellMatch]) -> Vec<(String, String)> {
        matches
            .iter()
            .map(|m| (m.cell_address.clone(), m.cell_value.clone()))
            .collect()
    }

    fn workspace(names: &[&str]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for name in names {
            fs::write(tmp.path().join(name), b"").unwrap();
        }
        tmp
    }

    #[test]
    fn test_formula_source_vs_result() {
        let book = hello_world_book();
        let file = Path::new("/tmp/hello.xlsx");

        let source = search_workbook(file, &book, &pattern("hello"), &SearchConfig::default());
        assert_eq!(
            addresses(&source),
            vec![("A1".to_string(), "hello world".to_string())]
        );

        let config = SearchConfig {
            match_formula_result: true,
            ..Default::default()
        };
        let result = search_workbook(file, &book, &pattern("hello"), &config);
        assert_eq!(
            addresses(&result),
            vec![
                ("A1".to_string(), "hello world".to_string()),
                ("A2".to_string(), "hello world!".to_string()),
            ]
        );
    }

    #[test]
    fn test_formula_source_is_searchable() {
        let book = hello_world_book();
        let matches = search_workbook(
            Path::new("hello.xlsx"),
            &book,
            &pattern("^=A1"),
            &SearchConfig::default(),
        );
        assert_eq!(
            addresses(&matches),
            vec![("A2".to_string(), "=A1&\"!\"".to_string())]
        );
    }

    #[test]
    fn test_blank_cells_never_match() {
        let mut sheet = Worksheet::new("Sheet1");
        sheet.set_cell_format("A1", NumberFormat::percent()).unwrap();
        sheet.set_cell_value("B1", CellValue::Empty).unwrap();
        let book: Workbook = [sheet].into_iter().collect();

        let matches = search_workbook(
            Path::new("blank.xlsx"),
            &book,
            &pattern(""),
            &SearchConfig::default(),
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn test_document_order_across_sheets() {
        let mut first = Worksheet::new("Second");
        first.set_cell_value("B2", "x4").unwrap();
        first.set_cell_value("A1", "x3").unwrap();
        let mut second = Worksheet::new("First");
        second.set_cell_value("C1", "x2").unwrap();
        second.set_cell_value("A1", "x1").unwrap();
        let book: Workbook = [first, second].into_iter().collect();

        let matches = search_workbook(
            Path::new("order.xlsx"),
            &book,
            &pattern("x"),
            &SearchConfig::default(),
        );
        let seen: Vec<_> = matches
            .iter()
            .map(|m| format!("{}!{}", m.sheet_name, m.cell_address))
            .collect();
        assert_eq!(seen, vec!["Second!A1", "Second!B2", "First!A1", "First!C1"]);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let names = ["d.xlsx", "a.xls", "c.xlsm", "b.xltx", "e.xlt"];
        let tmp = workspace(&names);
        let reader = names.iter().fold(FakeReader::default(), |r, name| {
            r.with(name, single_value_book("Sheet1", "A1", name))
        });

        let sequential = SheetGrep::with_reader(SearchConfig::default(), reader);
        let expected = sequential.search("\\.", &[tmp.path()]).unwrap();

        let parallel = SheetGrep::with_reader(
            SearchConfig {
                parallel: true,
                ..Default::default()
            },
            sequential.reader,
        );
        for _ in 0..5 {
            assert_eq!(parallel.search("\\.", &[tmp.path()]).unwrap(), expected);
        }

        let files: Vec<PathBuf> = expected
            .results()
            .iter()
            .map(|r| r.file().to_path_buf())
            .collect();
        let mut sorted = files.clone();
        sorted.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        assert_eq!(files, sorted);
        assert_eq!(expected.target_file_count(), 5);
        assert_eq!(expected.total_match_count(), 5);
    }

    #[test]
    fn test_files_without_matches_are_counted() {
        let tmp = workspace(&["hit.xlsx", "miss.xlsx"]);
        let reader = FakeReader::default()
            .with("hit.xlsx", single_value_book("S", "A1", "needle"))
            .with("miss.xlsx", single_value_book("S", "A1", "hay"));

        let summary = SheetGrep::with_reader(SearchConfig::default(), reader)
            .search("needle", &[tmp.path()])
            .unwrap();
        assert_eq!(summary.target_file_count(), 2);
        assert_eq!(summary.match_file_count(), 1);
        assert_eq!(summary.total_match_count(), 1);
    }

    #[test]
    fn test_unreadable_file_aborts_search() {
        let tmp = workspace(&["good.xlsx", "broken.xlsx"]);
        let reader = FakeReader::default().with("good.xlsx", single_value_book("S", "A1", "x"));

        for parallel in [false, true] {
            let config = SearchConfig {
                parallel,
                ..Default::default()
            };
            let err = SheetGrep::with_reader(config, &reader)
                .search("x", &[tmp.path()])
                .unwrap_err();
            match err {
                SearchError::Workbook { path, .. } => {
                    assert!(path.ends_with("broken.xlsx"))
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_bad_pattern_fails_before_reading() {
        let tmp = workspace(&["broken.xlsx"]);
        let err = SheetGrep::with_reader(SearchConfig::default(), FakeReader::default())
            .search("[", &[tmp.path()])
            .unwrap_err();
        assert!(matches!(err, SearchError::Pattern(_)));
    }

    #[test]
    fn test_empty_directory() {
        let tmp = TempDir::new().unwrap();
        let summary = SheetGrep::with_reader(SearchConfig::default(), FakeReader::default())
            .search("anything", &[tmp.path()])
            .unwrap();
        assert_eq!(summary.target_file_count(), 0);
        assert_eq!(summary.total_match_count(), 0);
    }
}
