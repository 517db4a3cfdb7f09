//! PostgreSQL connection implementation
//!
//! Queries go through the simple query protocol, so every value arrives as
//! the server's text rendering. The runner canonicalizes values from their
//! declared column type anyway, and the text form avoids decoding binary
//! NUMERIC and friends.

use async_trait::async_trait;
use sqllogic_core::{
    ColumnMeta, Connection, QueryResult, Result, Row, SchemaIntrospection, SltError,
    StatementResult, TableInfo, Value, ViewInfo,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

fn format_postgres_error(error: &tokio_postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut message = db_error.message().to_string();

    if let Some(detail) = db_error.detail()
        && !detail.trim().is_empty()
    {
        message.push_str(&format!(" (detail: {})", detail));
    }

    if let Some(hint) = db_error.hint()
        && !hint.trim().is_empty()
    {
        message.push_str(&format!(" (hint: {})", hint));
    }

    format!("{} (code: {})", message, db_error.code().code())
}

/// PostgreSQL connection wrapper
pub struct PostgresConnection {
    client: Mutex<Client>,
    closed: AtomicBool,
}

impl PostgresConnection {
    /// Connect to a PostgreSQL database
    pub async fn connect(
        host: &str,
        port: u16,
        database: &str,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self> {
        tracing::debug!(
            host = %host,
            port = %port,
            database = %database,
            "connecting to PostgreSQL database"
        );

        let mut config = tokio_postgres::Config::new();
        config.host(host).port(port).dbname(database);

        if let Some(u) = user {
            config.user(u);
        }
        if let Some(p) = password {
            config.password(p);
        }

        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|e| SltError::Connection(format!("Failed to connect to PostgreSQL: {}", e)))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "PostgreSQL connection error");
            }
        });

        Ok(Self {
            client: Mutex::new(client),
            closed: AtomicBool::new(false),
        })
    }

    /// Run a catalog query whose first two columns are name and schema
    async fn list_catalog(&self, sql: &str) -> Result<Vec<(String, Option<String>)>> {
        let result = self.query(sql).await?;
        Ok(result
            .rows
            .iter()
            .filter_map(|row| {
                let name = row.get(0).and_then(|v| v.as_str())?.to_string();
                let schema = row.get(1).and_then(|v| v.as_str()).map(str::to_string);
                Some((name, schema))
            })
            .collect())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SltError::Connection("Connection is closed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    fn driver_name(&self) -> &str {
        "postgres"
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str) -> Result<StatementResult> {
        self.ensure_open()?;
        let client = self.client.lock().await;

        let messages = client.simple_query(sql).await.map_err(|e| {
            let message = format_postgres_error(&e);
            SltError::Query(format!("Failed to execute statement: {}", message))
        })?;

        let affected_rows = messages
            .iter()
            .map(|message| match message {
                SimpleQueryMessage::CommandComplete(count) => *count,
                _ => 0,
            })
            .sum();

        tracing::trace!(affected_rows = affected_rows, "statement executed");
        Ok(StatementResult { affected_rows })
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str) -> Result<QueryResult> {
        self.ensure_open()?;
        let start_time = std::time::Instant::now();

        let client = self.client.lock().await;
        let messages = client.simple_query(sql).await.map_err(|e| {
            let message = format_postgres_error(&e);
            SltError::Query(format!("Failed to execute query: {}", message))
        })?;

        let mut columns: Vec<ColumnMeta> = Vec::new();
        let mut rows = Vec::new();
        for message in messages {
            let SimpleQueryMessage::Row(pg_row) = message else {
                continue;
            };
            if columns.is_empty() {
                columns = pg_row
                    .columns()
                    .iter()
                    .map(|col| ColumnMeta {
                        name: col.name().to_string(),
                        data_type: "text".to_string(),
                    })
                    .collect();
            }
            let values = (0..pg_row.len())
                .map(|idx| match pg_row.get(idx) {
                    Some(text) => Value::String(text.to_string()),
                    None => Value::Null,
                })
                .collect();
            rows.push(Row::new(values));
        }

        tracing::trace!(
            row_count = rows.len(),
            execution_time_ms = start_time.elapsed().as_millis() as u64,
            "query executed successfully"
        );

        Ok(QueryResult {
            columns,
            rows,
        })
    }

    async fn close(&self) -> Result<()> {
        tracing::debug!("closing PostgreSQL connection");
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
impl SchemaIntrospection for PostgresConnection {
    #[tracing::instrument(skip(self))]
    async fn list_tables(&self) -> Result<Vec<TableInfo>> {
        let tables = self
            .list_catalog(
                "SELECT tablename, schemaname FROM pg_catalog.pg_tables \
                 WHERE schemaname NOT IN ('information_schema', 'pg_catalog') \
                 ORDER BY tablename",
            )
            .await?;
        Ok(tables
            .into_iter()
            .map(|(name, schema)| TableInfo { name, schema })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn list_views(&self) -> Result<Vec<ViewInfo>> {
        let views = self
            .list_catalog(
                "SELECT table_name, table_schema FROM information_schema.views \
                 WHERE table_schema NOT IN ('information_schema', 'pg_catalog') \
                 ORDER BY table_name",
            )
            .await?;
        Ok(views
            .into_iter()
            .map(|(name, schema)| ViewInfo {
                name,
                schema,
            })
            .collect())
    }
}
