//! A backend that never runs SQL.
//!
//! Selecting it checks that test scripts parse: the runner treats every
//! statement as skipped and every query as ignored.

use async_trait::async_trait;
use sqllogic_core::{
    Connection, ConnectionConfig, DatabaseDriver, DriverCapabilities, QueryResult, Result,
    SchemaIntrospection, StatementResult, TableInfo, ViewInfo,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Driver registered as `none`
pub struct NoneDriver;

impl NoneDriver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoneDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for NoneDriver {
    fn name(&self) -> &'static str {
        "none"
    }

    fn display_name(&self) -> &'static str {
        "No execution"
    }

    fn capabilities(&self) -> DriverCapabilities {
        DriverCapabilities {
            executes_sql: false,
            supports_views: false,
            supports_drop_cascade: false,
        }
    }

    async fn connect(&self, _config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        Ok(Arc::new(NoneConnection::default()))
    }

    fn build_connection_string(&self, _config: &ConnectionConfig) -> String {
        "none".to_string()
    }
}

/// Connection that accepts everything and holds no data
#[derive(Default)]
pub struct NoneConnection {
    closed: AtomicBool,
}

#[async_trait]
impl Connection for NoneConnection {
    fn driver_name(&self) -> &str {
        "none"
    }

    async fn execute(&self, _sql: &str) -> Result<StatementResult> {
        Ok(StatementResult::default())
    }

    async fn query(&self, _sql: &str) -> Result<QueryResult> {
        Ok(QueryResult::empty())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn as_schema_introspection(&self) -> Option<&dyn SchemaIntrospection> {
        Some(self)
    }
}

#[async_trait]
impl SchemaIntrospection for NoneConnection {
    async fn list_tables(&self) -> Result<Vec<TableInfo>> {
        Ok(Vec::new())
    }

    async fn list_views(&self) -> Result<Vec<ViewInfo>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_none_connection_is_inert() {
        let conn = NoneDriver::new()
            .connect(&ConnectionConfig::new("none"))
            .await
            .unwrap();
        assert!(conn.query("SELECT * FROM nowhere").await.unwrap().rows.is_empty());
        let schema = conn.as_schema_introspection().unwrap();
        assert!(schema.list_tables().await.unwrap().is_empty());
        conn.close().await.unwrap();
        assert!(conn.is_closed());
    }
}
