//! Runner errors

use sqllogic_core::SltError;
use std::path::PathBuf;
use thiserror::Error;

pub type RunnerResult<T> = Result<T, RunnerError>;

/// A script that could not be turned into operations
#[derive(Debug, Clone, Error)]
#[error("{file}:{line}: {message}")]
pub struct ParseError {
    pub file: String,
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Unexpected column type {0}")]
    UnknownColumnType(char),

    #[error("Column {column}: cannot interpret '{value}' as {expected}")]
    Normalization {
        column: usize,
        value: String,
        expected: &'static str,
    },

    #[error("Query produced {actual} columns, {expected} declared")]
    ColumnCount { expected: usize, actual: usize },

    #[error("Comparing rows of different lengths ({left} and {right})")]
    RowArity { left: usize, right: usize },

    #[error(transparent)]
    Backend(#[from] SltError),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl RunnerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Errors that indicate a bug in the runner itself rather than a wrong
    /// answer from the backend. These abort the run instead of being
    /// recorded as a query failure.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::RowArity { .. })
    }
}
