use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop ingestion. Everything else is reported as an
/// [`Advisory`](crate::advisory::Advisory).
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no trade log supplied and no default log at {default_path}")]
    MissingSourceData { default_path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("trade log has no header row")]
    EmptyHeader,

    #[error("line {line}: expected {expected} fields, got {got}")]
    RowWidth {
        line: usize,
        expected: usize,
        got: usize,
    },

    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },
}
