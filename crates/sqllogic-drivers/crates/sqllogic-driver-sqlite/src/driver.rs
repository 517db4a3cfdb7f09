//! SQLite driver implementation

use async_trait::async_trait;
use sqllogic_core::{
    Connection, ConnectionConfig, DatabaseDriver, DriverCapabilities, Result, SltError,
};
use std::sync::Arc;

use crate::SqliteConnection;

/// SQLite database driver
pub struct SqliteDriver;

impl SqliteDriver {
    /// Create a new SQLite driver instance
    pub fn new() -> Self {
        tracing::debug!("SQLite driver initialized");
        Self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn display_name(&self) -> &'static str {
        "SQLite"
    }

    fn capabilities(&self) -> DriverCapabilities {
        DriverCapabilities {
            executes_sql: true,
            supports_views: true,
            supports_drop_cascade: false,
        }
    }

    /// Connects to the configured file, or to a private in-memory database
    /// when no path is given so that every test file starts empty.
    #[tracing::instrument(skip(self, config), fields(path = config.get_string("path").as_deref()))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let path = config
            .get_string("path")
            .unwrap_or_else(|| ":memory:".to_string());

        let conn = SqliteConnection::open(&path).map_err(|e| {
            tracing::error!(error = %e, "failed to connect to SQLite database");
            match e {
                SltError::Connection(_) | SltError::Configuration(_) => e,
                other => SltError::Connection(format!(
                    "Failed to connect to SQLite database: {}",
                    other
                )),
            }
        })?;

        tracing::debug!(path = %path, "SQLite connection created");
        Ok(Arc::new(conn))
    }

    fn build_connection_string(&self, config: &ConnectionConfig) -> String {
        config
            .get_string("path")
            .unwrap_or_else(|| ":memory:".to_string())
    }
}
