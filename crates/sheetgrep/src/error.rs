//! Error types for sheetgrep

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`SearchError`]
pub type Result<T> = std::result::Result<T, SearchError>;

/// Fatal errors that abort a search
#[derive(Debug, Error)]
pub enum SearchError {
    /// The pattern is not a valid regular expression
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Walking a root path failed
    #[error("Failed to walk '{}'", root.display())]
    Discovery {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A discovered file could not be made absolute
    #[error("Failed to resolve '{}'", path.display())]
    Absolute {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A workbook could not be opened or read
    #[error("Failed to read workbook '{}'", path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: ReadError,
    },
}

/// Errors raised while decoding a workbook
#[derive(Debug, Error)]
pub enum ReadError {
    /// Container decoding error
    #[error(transparent)]
    Calamine(#[from] calamine::Error),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// OOXML package error while reading stored formats
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Malformed OOXML part
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed BIFF record stream
    #[error("Invalid BIFF stream: {0}")]
    Biff(String),

    /// The decoded content does not fit the sheet model
    #[error("Invalid cell: {0}")]
    Model(#[from] sheetgrep_core::Error),
}
