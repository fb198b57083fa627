//! Historical data loading errors.

use std::path::PathBuf;

/// Errors while loading the historical tables.
///
/// All of these are fatal at startup: the engine cannot produce meaningful
/// scores without its tables.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// A table file could not be opened
    #[error("failed to open {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected the input
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row was well-formed CSV but carried an unusable value
    #[error("line {line}: {message}")]
    Parse { line: u64, message: String },

    /// A required column is missing from the header
    #[error("missing column {0:?}")]
    MissingColumn(&'static str),
}
