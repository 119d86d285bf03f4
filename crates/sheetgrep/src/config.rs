//! Search configuration

/// Options for one search invocation.
///
/// Built once from the command line and never changed while a search runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchConfig {
    /// Case-insensitive matching with Unicode case folding
    pub ignore_case: bool,
    /// Treat the pattern as plain text instead of a regular expression
    pub literal: bool,
    /// Match formula cells against their cached result instead of their source
    pub match_formula_result: bool,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Search files on the rayon thread pool
    pub parallel: bool,
}
