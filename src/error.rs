use thiserror::Error;

use crate::column::ColumnType;

/// Error type definition
#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed row at line {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("cannot coerce column '{column}' to {target:?}: value '{value}' at row {row}")]
    TypeCoercion {
        column: String,
        row: usize,
        value: String,
        target: ColumnType,
    },

    #[error("column not found: {0}")]
    UnknownColumn(String),

    #[error("duplicate column name: {0}")]
    DuplicateColumnName(String),

    #[error("length mismatch for column '{column}': expected {expected}, found {found}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("column '{column}' has type {found:?}, expected {expected}")]
    ColumnTypeMismatch {
        column: String,
        expected: String,
        found: ColumnType,
    },

    #[error("design matrix is rank deficient at column '{column}' (term '{term}')")]
    SingularDesign { term: String, column: String },

    #[error("solver did not converge within {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("invalid formula '{formula}': {reason}")]
    FormulaParse { formula: String, reason: String },

    #[error("source not found: {name}")]
    NotFound { name: String },

    #[error("failed to read '{name}': {reason}")]
    ReadFailed { name: String, reason: String },

    #[error("failed to write '{name}': {reason}")]
    WriteFailed { name: String, reason: String },

    #[error("output format {0} is not supported by this backend")]
    UnsupportedFormat(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("CSV error")]
    Csv(#[source] csv::Error),

    #[error("JSON error")]
    Json(#[source] serde_json::Error),

    #[error("visualization error: {0}")]
    Visualization(String),
}

// Aliased the way downstream code names it.
pub type StatFrameError = Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

#[cfg(feature = "visualization")]
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for Error
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        Error::Visualization(format!("drawing failed: {}", err))
    }
}
