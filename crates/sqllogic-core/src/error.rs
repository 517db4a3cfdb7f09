//! Error types for backend operations

use thiserror::Error;

/// Core error type for backend operations
#[derive(Error, Debug)]
pub enum SltError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown executor '{name}'; registered executors: {}", available.join(", "))]
    UnknownDriver {
        name: String,
        available: Vec<String>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, SltError>;
