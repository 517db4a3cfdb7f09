//! sqllogic drivers - Backend implementations
//!
//! This crate provides the registry the runner selects backends from, plus
//! concrete implementations of the traits defined in `sqllogic-core`.

#[cfg(feature = "postgres")]
pub use sqllogic_driver_postgres as postgres;
#[cfg(feature = "sqlite")]
pub use sqllogic_driver_sqlite as sqlite;

pub mod none;
mod registry;

pub use registry::DriverRegistry;

/// Re-export commonly used types from sqllogic-core
pub use sqllogic_core::{
    ColumnMeta, Connection, ConnectionConfig, DatabaseDriver, DriverCapabilities, QueryResult,
    Result, Row, SchemaIntrospection, SltError, StatementResult, Value,
};
