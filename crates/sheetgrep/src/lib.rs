//! # sheetgrep
//!
//! Search the cells of Excel workbooks for a regular expression.
//!
//! A search runs in fixed stages:
//! - the pattern is compiled once ([`CompiledPattern`])
//! - roots are expanded into spreadsheet files ([`discover_files`])
//! - each file is decoded by a [`WorkbookReader`] and walked sheet by sheet,
//!   row by row, cell by cell ([`search_workbook`]), resolving every
//!   non-blank cell to the text it is matched against ([`resolve_cell_value`])
//! - per-file results are sorted by path into a [`SearchSummary`]
//!
//! Files are searched one after another or on the rayon thread pool; the
//! ordering of the summary is the same either way.
//!
//! ## Example
//!
//! ```no_run
//! use sheetgrep::{SearchConfig, SheetGrep};
//!
//! let summary = SheetGrep::new(SearchConfig::default()).search("hello", &["book.xlsx"])?;
//! println!(
//!     "{} match(es) in {} file(s)",
//!     summary.total_match_count(),
//!     summary.match_file_count()
//! );
//! # Ok::<(), sheetgrep::SearchError>(())
//! ```

pub mod config;
pub mod discover;
pub mod error;
pub mod pattern;
pub mod reader;
pub mod resolve;
pub mod result;
pub mod search;

pub use config::SearchConfig;
pub use discover::{discover_files, is_spreadsheet_file, SPREADSHEET_EXTENSIONS};
pub use error::{ReadError, Result, SearchError};
pub use pattern::CompiledPattern;
pub use reader::{CalamineReader, WorkbookReader};
pub use resolve::resolve_cell_value;
pub use result::{CellMatch, FileResult, SearchSummary};
pub use search::{search_workbook, SheetGrep};

/// The spreadsheet model searched by the engine
pub use sheetgrep_core as model;
