//! Error types for sheetgrep-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sheetgrep-core
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Row index out of bounds
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index out of bounds
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u32, u16),

    /// A number that cannot be displayed (NaN or infinite)
    #[error("Cannot format non-finite number {0}")]
    NonFiniteNumber(f64),

    /// Date serial outside the range the 1900 date system can express
    #[error("Date serial {0} is out of range")]
    DateOutOfRange(f64),

    /// Format code construct the formatter does not render
    #[error("Unsupported number format '{format}': {reason}")]
    UnsupportedFormat {
        format: String,
        reason: &'static str,
    },
}

impl Error {
    /// Create an unsupported-format error
    pub fn unsupported<S: Into<String>>(format: S, reason: &'static str) -> Self {
        Error::UnsupportedFormat {
            format: format.into(),
            reason,
        }
    }
}
