//! PostgreSQL driver implementation

use async_trait::async_trait;
use sqllogic_core::{
    Connection, ConnectionConfig, DatabaseDriver, DriverCapabilities, Result, SltError,
};
use std::sync::Arc;

use crate::PostgresConnection;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5432;
const DEFAULT_DATABASE: &str = "slt";

/// PostgreSQL database driver
pub struct PostgresDriver;

impl PostgresDriver {
    /// Create a new PostgreSQL driver instance
    pub fn new() -> Self {
        tracing::debug!("PostgreSQL driver initialized");
        Self
    }

    fn endpoint(config: &ConnectionConfig) -> (String, u16, String) {
        let host = config
            .get_string("host")
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = if config.port > 0 {
            config.port
        } else {
            DEFAULT_PORT
        };
        let database = config
            .get_string("database")
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        (host, port, database)
    }
}

impl Default for PostgresDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for PostgresDriver {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn display_name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn dialect_id(&self) -> &'static str {
        "postgresql"
    }

    fn capabilities(&self) -> DriverCapabilities {
        DriverCapabilities {
            executes_sql: true,
            supports_views: true,
            supports_drop_cascade: true,
        }
    }

    #[tracing::instrument(skip(self, config), fields(host = config.get_string("host").as_deref(), database = config.get_string("database").as_deref()))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let (host, port, database) = Self::endpoint(config);
        let user = config
            .get_string("user")
            .or_else(|| config.get_string("username"));
        let password = config.get_string("password");

        let conn = PostgresConnection::connect(
            &host,
            port,
            &database,
            user.as_deref(),
            password.as_deref(),
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to connect to PostgreSQL database");
            SltError::Connection(format!("Failed to connect to PostgreSQL database: {}", e))
        })?;

        tracing::info!(host = %host, port = %port, database = %database, "PostgreSQL connection created");
        Ok(Arc::new(conn))
    }

    /// Keeps NOTICE chatter from the cascading drops out of the log.
    async fn on_connect(&self, conn: &dyn Connection) -> Result<()> {
        conn.execute("SET client_min_messages TO WARNING").await?;
        Ok(())
    }

    fn build_connection_string(&self, config: &ConnectionConfig) -> String {
        let (host, port, database) = Self::endpoint(config);
        let user = config
            .get_string("user")
            .or_else(|| config.get_string("username"));

        let mut conn_str = "postgresql://".to_string();
        if let Some(u) = user {
            conn_str.push_str(&u);
            conn_str.push('@');
        }
        conn_str.push_str(&format!("{}:{}/{}", host, port, database));
        conn_str
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_string_defaults() {
        let driver = PostgresDriver::new();
        let config = ConnectionConfig::new("postgres");
        assert_eq!(
            driver.build_connection_string(&config),
            "postgresql://localhost:5432/slt"
        );
    }

    #[test]
    fn test_connection_string_omits_password() {
        let driver = PostgresDriver::new();
        let mut config = ConnectionConfig::new_postgres("db.internal", 6543, "conformance", "runner");
        config.password = Some("secret".into());
        assert_eq!(
            driver.build_connection_string(&config),
            "postgresql://runner@db.internal:6543/conformance"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_connection_error() {
        let driver = PostgresDriver::new();
        let config = ConnectionConfig::new_postgres("127.0.0.1", 1, "slt", "nobody");
        match driver.connect(&config).await {
            Err(SltError::Connection(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("port 1 should refuse connections"),
        }
    }
}
