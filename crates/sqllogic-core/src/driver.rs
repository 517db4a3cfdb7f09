//! Database driver trait definition

use crate::{Connection, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Capabilities that a driver may support
#[derive(Debug, Clone)]
pub struct DriverCapabilities {
    /// Whether the backend actually runs SQL. Drivers that do not are only
    /// useful for checking that scripts parse.
    pub executes_sql: bool,
    /// Supports views
    pub supports_views: bool,
    /// Accepts `CASCADE` on `DROP TABLE` / `DROP VIEW`
    pub supports_drop_cascade: bool,
}

impl Default for DriverCapabilities {
    fn default() -> Self {
        Self {
            executes_sql: true,
            supports_views: true,
            supports_drop_cascade: false,
        }
    }
}

/// Core driver trait that all backends must implement
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Short registration name (e.g., "postgres", "sqlite", "none")
    fn name(&self) -> &'static str;

    /// Human-readable name (e.g., "PostgreSQL", "SQLite")
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Engine name matched by `skipif` / `onlyif` conditions in test scripts
    fn dialect_id(&self) -> &'static str {
        self.name()
    }

    /// Supported features/capabilities
    fn capabilities(&self) -> DriverCapabilities;

    /// Create a new connection
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;

    /// Backend-specific compatibility adjustment run right after connecting
    async fn on_connect(&self, _conn: &dyn Connection) -> Result<()> {
        Ok(())
    }

    /// Connection target for logs and error messages; never includes the
    /// password
    fn build_connection_string(&self, config: &ConnectionConfig) -> String;
}

/// Connection configuration
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Driver name (e.g., "postgres", "sqlite")
    pub driver: String,
    /// Host address (empty for file-based databases)
    pub host: String,
    /// Port number (0 for default or file-based)
    pub port: u16,
    /// Database name or file path
    pub database: Option<String>,
    /// Username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Additional connection parameters
    pub params: HashMap<String, String>,
}

impl ConnectionConfig {
    /// Create a new configuration with default values
    pub fn new(driver: &str) -> Self {
        Self {
            driver: driver.to_string(),
            ..Self::default()
        }
    }

    /// Create a SQLite configuration
    pub fn new_sqlite(database_path: &str) -> Self {
        let mut config = Self::new("sqlite");
        config.database = Some(database_path.to_string());
        config
    }

    /// Create a PostgreSQL configuration
    pub fn new_postgres(host: &str, port: u16, database: &str, username: &str) -> Self {
        let mut config = Self::new("postgres");
        config.host = host.to_string();
        config.port = port;
        config.database = Some(database.to_string());
        config.username = Some(username.to_string());
        config
    }

    /// Set a connection parameter
    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Get a string parameter
    pub fn get_string(&self, key: &str) -> Option<String> {
        if let Some(val) = self.params.get(key) {
            return Some(val.clone());
        }
        match key {
            "host" if !self.host.is_empty() => Some(self.host.clone()),
            "database" | "path" => self.database.clone(),
            "username" | "user" => self.username.clone(),
            "password" => self.password.clone(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_shadow_fields() {
        let config = ConnectionConfig::new_postgres("db.local", 5432, "slt", "tester")
            .with_param("user", "override");
        assert_eq!(config.get_string("user").as_deref(), Some("override"));
        assert_eq!(config.get_string("username").as_deref(), Some("tester"));
        assert_eq!(config.get_string("host").as_deref(), Some("db.local"));
    }

    #[test]
    fn test_empty_host_is_absent() {
        let config = ConnectionConfig::new_sqlite(":memory:");
        assert_eq!(config.get_string("host"), None);
        assert_eq!(config.get_string("path").as_deref(), Some(":memory:"));
    }
}
