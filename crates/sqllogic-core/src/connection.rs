//! Connection and schema introspection traits

use crate::{QueryResult, Result, StatementResult};
use async_trait::async_trait;

/// Table metadata returned by schema enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    /// Table name
    pub name: String,
    /// Schema the table lives in, if the backend has schemas
    pub schema: Option<String>,
}

/// View metadata returned by schema enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewInfo {
    /// View name
    pub name: String,
    /// Schema the view lives in, if the backend has schemas
    pub schema: Option<String>,
}

/// A live backend connection, exclusively owned by the file being run
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "sqlite", "postgres")
    fn driver_name(&self) -> &str;

    /// Execute a statement that does not produce rows (DDL/DML)
    async fn execute(&self, sql: &str) -> Result<StatementResult>;

    /// Execute a query that returns rows
    async fn query(&self, sql: &str) -> Result<QueryResult>;

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;

    /// Get schema introspection interface if supported
    fn as_schema_introspection(&self) -> Option<&dyn SchemaIntrospection> {
        None
    }
}

/// Enumerates the objects a schema reset has to drop
#[async_trait]
pub trait SchemaIntrospection: Send + Sync {
    /// List user tables
    async fn list_tables(&self) -> Result<Vec<TableInfo>>;

    /// List user views
    async fn list_views(&self) -> Result<Vec<ViewInfo>>;
}
