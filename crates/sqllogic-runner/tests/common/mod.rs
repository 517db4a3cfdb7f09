//! Common test utilities and a scripted backend

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use sqllogic_core::{
    Connection, ConnectionConfig, DatabaseDriver, DriverCapabilities, QueryResult, Result, Row,
    SchemaIntrospection, SltError, StatementResult, TableInfo, Value, ViewInfo,
};
use sqllogic_runner::{SltOperation, SltTestFile, parse_script};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn initialize_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("sqllogic_runner=debug".parse().unwrap()),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// What the scripted backend answers
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Rows returned for an exact query text; anything else returns no rows
    pub results: HashMap<String, Vec<Row>>,
    /// SQL texts that raise an error
    pub failing: HashSet<String>,
    pub tables: Vec<String>,
    pub views: Vec<String>,
}

impl Script {
    pub fn with_rows(mut self, sql: &str, rows: Vec<Vec<Value>>) -> Self {
        self.results
            .insert(sql.to_string(), rows.into_iter().map(Row::new).collect());
        self
    }

    pub fn with_failure(mut self, sql: &str) -> Self {
        self.failing.insert(sql.to_string());
        self
    }

    pub fn with_table(mut self, name: &str) -> Self {
        self.tables.push(name.to_string());
        self
    }

    pub fn with_view(mut self, name: &str) -> Self {
        self.views.push(name.to_string());
        self
    }
}

/// Driver whose connections follow a [`Script`] and log every SQL text
pub struct MockDriver {
    script: Script,
    capabilities: DriverCapabilities,
    log: Arc<Mutex<Vec<String>>>,
    connects: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl MockDriver {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            capabilities: DriverCapabilities::default(),
            log: Arc::new(Mutex::new(Vec::new())),
            connects: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_cascade(mut self) -> Self {
        self.capabilities.supports_drop_cascade = true;
        self
    }

    pub fn sql_log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn was_sent(&self, sql: &str) -> bool {
        self.log.lock().iter().any(|s| s == sql)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseDriver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn capabilities(&self) -> DriverCapabilities {
        self.capabilities.clone()
    }

    async fn connect(&self, _config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockConnection {
            script: self.script.clone(),
            log: self.log.clone(),
            closes: self.closes.clone(),
        }))
    }

    fn build_connection_string(&self, _config: &ConnectionConfig) -> String {
        "mock://".to_string()
    }
}

pub struct MockConnection {
    script: Script,
    log: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl MockConnection {
    fn record(&self, sql: &str) -> Result<()> {
        self.log.lock().push(sql.to_string());
        if self.script.failing.contains(sql) {
            return Err(SltError::Query(format!("scripted failure: {}", sql)));
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, sql: &str) -> Result<StatementResult> {
        self.record(sql)?;
        Ok(StatementResult::default())
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        self.record(sql)?;
        Ok(QueryResult {
            rows: self.script.results.get(sql).cloned().unwrap_or_default(),
            ..Default::default()
        })
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }

    fn as_schema_introspection(&self) -> Option<&dyn SchemaIntrospection> {
        Some(self)
    }
}

#[async_trait]
impl SchemaIntrospection for MockConnection {
    async fn list_tables(&self) -> Result<Vec<TableInfo>> {
        Ok(self
            .script
            .tables
            .iter()
            .map(|name| TableInfo {
                name: name.clone(),
                schema: None,
            })
            .collect())
    }

    async fn list_views(&self) -> Result<Vec<ViewInfo>> {
        Ok(self
            .script
            .views
            .iter()
            .map(|name| ViewInfo {
                name: name.clone(),
                schema: None,
            })
            .collect())
    }
}

/// Parse an inline script for the `mock` engine
pub fn test_file(contents: &str) -> SltTestFile {
    SltTestFile {
        path: "inline.test".into(),
        operations: parse_script("inline.test", contents, "mock").unwrap(),
    }
}

pub fn query_count(file: &SltTestFile) -> usize {
    file.operations
        .iter()
        .filter(|op| matches!(op, SltOperation::Query(_)))
        .count()
}
