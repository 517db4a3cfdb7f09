//! SQLite connection implementation

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection as RusqliteConnection, OpenFlags};
use sqllogic_core::{
    ColumnMeta, Connection, QueryResult, Result, Row, SchemaIntrospection, SltError,
    StatementResult, TableInfo, Value, ViewInfo,
};
use std::sync::atomic::{AtomicBool, Ordering};

/// SQLite connection wrapper
pub struct SqliteConnection {
    conn: Mutex<RusqliteConnection>,
    closed: AtomicBool,
}

impl SqliteConnection {
    /// Open a SQLite database
    pub fn open(path: &str) -> Result<Self> {
        tracing::debug!(path = %path, "opening SQLite database");
        let expanded_path = Self::expand_path(path)?;

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = if path == ":memory:" {
            RusqliteConnection::open_in_memory().map_err(|e| {
                SltError::Connection(format!("Failed to open in-memory database: {}", e))
            })?
        } else {
            if !expanded_path.starts_with("file:") {
                let file_path = std::path::Path::new(&expanded_path);
                if let Some(parent) = file_path.parent()
                    && !parent.exists()
                {
                    return Err(SltError::Connection(format!(
                        "Parent directory does not exist: {}",
                        parent.display()
                    )));
                }
            }

            RusqliteConnection::open_with_flags(&expanded_path, flags).map_err(|e| {
                SltError::Connection(format!(
                    "Failed to open SQLite database at '{}': {}",
                    expanded_path, e
                ))
            })?
        };

        Ok(Self {
            conn: Mutex::new(conn),
            closed: AtomicBool::new(false),
        })
    }

    /// Expand `~/` and make relative paths absolute
    fn expand_path(path: &str) -> Result<String> {
        if path == ":memory:" || path.starts_with("file:") {
            return Ok(path.to_string());
        }

        let expanded = if let Some(rest) = path.strip_prefix("~/") {
            match std::env::var_os("HOME") {
                Some(home) => std::path::PathBuf::from(home)
                    .join(rest)
                    .to_string_lossy()
                    .to_string(),
                None => {
                    return Err(SltError::Configuration(
                        "Unable to determine HOME directory".into(),
                    ));
                }
            }
        } else {
            path.to_string()
        };

        let path_buf = std::path::PathBuf::from(&expanded);
        if path_buf.is_relative() {
            Ok(std::env::current_dir()?
                .join(path_buf)
                .to_string_lossy()
                .to_string())
        } else {
            Ok(expanded)
        }
    }

    async fn list_names(&self, object_type: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT name FROM sqlite_master WHERE type = '{}' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            object_type
        );
        let result = self.query(&sql).await?;
        Ok(result
            .rows
            .iter()
            .filter_map(|row| row.get(0).and_then(|v| v.as_str()).map(str::to_string))
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
impl Connection for SqliteConnection {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str) -> Result<StatementResult> {
        self.ensure_open()?;
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| SltError::Query(format!("Failed to prepare statement: {}", e)))?;

        // Row-returning statements (SELECT, most PRAGMAs) are run to completion
        // and their rows discarded.
        let rows_affected = if stmt.column_count() == 0 {
            stmt.execute([])
                .map_err(|e| SltError::Query(format!("Failed to execute statement: {}", e)))?
        } else {
            let mut rows = stmt
                .query([])
                .map_err(|e| SltError::Query(format!("Failed to execute statement: {}", e)))?;
            while rows
                .next()
                .map_err(|e| SltError::Query(format!("Failed to fetch row: {}", e)))?
                .is_some()
            {}
            0
        };

        tracing::trace!(affected_rows = rows_affected, "statement executed");
        Ok(StatementResult {
            affected_rows: rows_affected as u64,
        })
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str) -> Result<QueryResult> {
        self.ensure_open()?;
        let start_time = std::time::Instant::now();

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| SltError::Query(format!("Failed to prepare query: {}", e)))?;

        let columns: Vec<ColumnMeta> = stmt
            .columns()
            .iter()
            .map(|col| ColumnMeta {
                name: col.name().to_string(),
                data_type: col.decl_type().unwrap_or("DYNAMIC").to_string(),
            })
            .collect();

        let mut rows = Vec::new();
        let mut query_rows = stmt
            .query([])
            .map_err(|e| SltError::Query(format!("Failed to execute query: {}", e)))?;

        while let Some(row) = query_rows
            .next()
            .map_err(|e| SltError::Query(format!("Failed to fetch row: {}", e)))?
        {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(rusqlite_to_value(row, i)?);
            }
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
        tracing::debug!("closing SQLite connection");
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
impl SchemaIntrospection for SqliteConnection {
    #[tracing::instrument(skip(self))]
    async fn list_tables(&self) -> Result<Vec<TableInfo>> {
        let names = self.list_names("table").await?;
        tracing::debug!(table_count = names.len(), "tables listed");
        Ok(names
            .into_iter()
            .map(|name| TableInfo {
                name,
                schema: Some("main".to_string()),
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn list_views(&self) -> Result<Vec<ViewInfo>> {
        let names = self.list_names("view").await?;
        Ok(names
            .into_iter()
            .map(|name| ViewInfo {
                name,
                schema: Some("main".to_string()),
            })
            .collect())
    }
}

/// Convert rusqlite row value to our Value type
fn rusqlite_to_value(row: &rusqlite::Row, idx: usize) -> Result<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row
        .get_ref(idx)
        .map_err(|e| SltError::Query(e.to_string()))?;

    let value = match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => match std::str::from_utf8(b) {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => Value::Bytes(b.to_vec()),
        },
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_keep_storage_class() {
        let conn = SqliteConnection::open(":memory:").unwrap();
        let result = conn
            .query("SELECT 1, 2.5, 'x', NULL")
            .await
            .unwrap();
        assert_eq!(
            result.rows[0].values,
            vec![
                Value::Int64(1),
                Value::Float64(2.5),
                Value::String("x".into()),
                Value::Null
            ]
        );
    }

    #[tokio::test]
    async fn test_lists_tables_and_views_separately() {
        let conn = SqliteConnection::open(":memory:").unwrap();
        conn.execute("CREATE TABLE t2 (a INTEGER)").await.unwrap();
        conn.execute("CREATE TABLE t1 (a INTEGER)").await.unwrap();
        conn.execute("CREATE VIEW v1 AS SELECT a FROM t1").await.unwrap();

        let tables = conn.list_tables().await.unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["t1", "t2"]);

        let views = conn.list_views().await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].name, "v1");
    }

    #[tokio::test]
    async fn test_execute_accepts_row_returning_statements() {
        let conn = SqliteConnection::open(":memory:").unwrap();
        conn.execute("CREATE TABLE t1 (a INTEGER)").await.unwrap();
        conn.execute("PRAGMA table_info(t1)").await.unwrap();
        conn.execute("SELECT * FROM t1").await.unwrap();

        let inserted = conn.execute("INSERT INTO t1 VALUES (1), (2)").await.unwrap();
        assert_eq!(inserted.affected_rows, 2);
        assert!(conn.execute("SELECT * FROM missing").await.is_err());
    }

    #[tokio::test]
    async fn test_closed_connection_rejects_work() {
        let conn = SqliteConnection::open(":memory:").unwrap();
        conn.close().await.unwrap();
        assert!(conn.is_closed());
        assert!(conn.query("SELECT 1").await.is_err());
    }

    #[tokio::test]
    async fn test_file_database_in_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slt.db");
        let conn = SqliteConnection::open(path.to_str().unwrap()).unwrap();
        conn.execute("CREATE TABLE t (a TEXT)").await.unwrap();
        assert!(path.exists());
    }
}
