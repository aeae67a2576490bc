//! Feed loading error types.

use std::path::PathBuf;

/// Errors from reading a feed archive.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The archive does not exist
    #[error("feed archive not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A required table is absent from the archive
    #[error("feed is missing required table {0}.txt")]
    MissingTable(&'static str),

    /// A required column is absent from a table header
    #[error("{table}.txt is missing required column {column}")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    /// A value could not be interpreted
    #[error("{table}.txt: invalid {column} value {value:?}")]
    InvalidValue {
        table: &'static str,
        column: &'static str,
        value: String,
    },

    /// The archive could not be read
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A table could not be parsed as CSV
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O failure while reading the archive
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
