//! Per-file execution protocol
//!
//! ```text
//! connect → on_connect → drop tables → operations → drop views → drop tables → close
//! ```
//!
//! A should-succeed statement that fails ends the operations phase early,
//! but teardown and close still run.

use crate::{
    FailureRecord, RunSession, RunStatistics, RunnerError, RunnerResult, SkipSet, SltOperation,
    SltQuery, SltStatement, SltTestFile, Verdict, normalize_result, validate,
};
use itertools::Itertools;
use sqllogic_core::{Connection, ConnectionConfig, DatabaseDriver, SchemaIntrospection};
use std::sync::Arc;

/// How the operations phase of a file ended
#[derive(Debug)]
enum FileOutcome {
    Completed,
    /// Stopped after the first recorded failure
    Stopped,
    /// A statement that had to succeed failed
    StatementFailed,
    /// The runner hit one of its own invariants
    Aborted(RunnerError),
}

/// What to do after one operation
enum Step {
    Continue,
    Stop(FileOutcome),
}

/// Runs parsed scripts against one backend
pub struct SltExecutor {
    driver: Arc<dyn DatabaseDriver>,
    connection: ConnectionConfig,
    skip_set: SkipSet,
    stop_at_first_error: bool,
    do_not_execute: bool,
}

impl SltExecutor {
    pub fn new(driver: Arc<dyn DatabaseDriver>, connection: ConnectionConfig) -> Self {
        let do_not_execute = !driver.capabilities().executes_sql;
        if do_not_execute {
            tracing::info!(executor = driver.name(), "backend does not execute SQL; parsing only");
        }
        Self {
            driver,
            connection,
            skip_set: SkipSet::default(),
            stop_at_first_error: false,
            do_not_execute,
        }
    }

    pub fn with_skip_set(mut self, skip_set: SkipSet) -> Self {
        self.skip_set = skip_set;
        self
    }

    pub fn stop_at_first_error(mut self, stop: bool) -> Self {
        self.stop_at_first_error = stop;
        self
    }

    /// Parse-only mode. Cannot be turned off for backends that do not
    /// execute SQL.
    pub fn do_not_execute(mut self, parse_only: bool) -> Self {
        self.do_not_execute = parse_only || !self.driver.capabilities().executes_sql;
        self
    }

    pub fn driver(&self) -> &Arc<dyn DatabaseDriver> {
        &self.driver
    }

    /// Run one file on a fresh connection.
    ///
    /// Failing to connect or to reset the schema up front is an error for the
    /// whole run; everything that goes wrong later is reflected in the
    /// returned statistics.
    #[tracing::instrument(skip_all, fields(file = %file.path.display()))]
    pub async fn execute_file(
        &self,
        file: &SltTestFile,
        session: &mut RunSession,
    ) -> RunnerResult<RunStatistics> {
        let timer = session.start_file();
        tracing::debug!(
            backend = %self.driver.build_connection_string(&self.connection),
            "connecting"
        );
        let conn = self.driver.connect(&self.connection).await?;

        if let Err(e) = self.prepare(conn.as_ref()).await {
            self.release(conn.as_ref()).await;
            return Err(e);
        }

        let mut stats = RunStatistics::new(self.stop_at_first_error);
        stats.files_processed = 1;

        let outcome = self.run_operations(conn.as_ref(), file, &mut stats).await;
        match &outcome {
            FileOutcome::Completed => {}
            FileOutcome::Stopped => {
                tracing::info!("stopping file after first failure");
            }
            FileOutcome::StatementFailed => stats.files_not_parsed += 1,
            FileOutcome::Aborted(e) => {
                tracing::error!(error = %e, "aborting file");
            }
        }

        if let Err(e) = self.teardown(conn.as_ref()).await {
            tracing::error!(error = %e, "failed to clean up after file");
        }
        self.release(conn.as_ref()).await;

        tracing::info!("{}", session.finish_file(timer, file.test_count()));

        match outcome {
            FileOutcome::Aborted(e) => Err(e),
            _ => Ok(stats),
        }
    }

    async fn prepare(&self, conn: &dyn Connection) -> RunnerResult<()> {
        self.driver.on_connect(conn).await?;
        self.drop_all_tables(conn).await
    }

    async fn teardown(&self, conn: &dyn Connection) -> RunnerResult<()> {
        self.drop_all_views(conn).await?;
        self.drop_all_tables(conn).await
    }

    async fn release(&self, conn: &dyn Connection) {
        if let Err(e) = conn.close().await {
            tracing::warn!(error = %e, "failed to close connection");
        }
    }

    async fn run_operations(
        &self,
        conn: &dyn Connection,
        file: &SltTestFile,
        stats: &mut RunStatistics,
    ) -> FileOutcome {
        for operation in &file.operations {
            let step = match operation {
                SltOperation::Statement(statement) => self.run_statement(conn, statement).await,
                SltOperation::Query(query) => self.run_query(conn, query, stats).await,
            };
            if let Step::Stop(outcome) = step {
                return outcome;
            }
        }
        FileOutcome::Completed
    }

    async fn run_statement(&self, conn: &dyn Connection, statement: &SltStatement) -> Step {
        if self.do_not_execute || self.skip_set.contains(&statement.sql) {
            tracing::debug!(line = statement.line, sql = %statement.sql, "skipping statement");
            return Step::Continue;
        }

        let sql = self.rewrite_drop_view(&statement.sql);
        tracing::debug!(line = statement.line, sql = %sql, "statement");

        match conn.execute(&sql).await {
            Ok(_) if !statement.expect_success => {
                tracing::warn!(line = statement.line, sql = %sql, "statement should have failed");
                Step::Continue
            }
            Ok(_) => Step::Continue,
            Err(e) if statement.expect_success => {
                tracing::error!(
                    line = statement.line,
                    sql = %sql,
                    error = %e,
                    "statement failed; skipping rest of file"
                );
                Step::Stop(FileOutcome::StatementFailed)
            }
            Err(e) => {
                tracing::trace!(line = statement.line, error = %e, "statement failed as expected");
                Step::Continue
            }
        }
    }

    async fn run_query(
        &self,
        conn: &dyn Connection,
        query: &SltQuery,
        stats: &mut RunStatistics,
    ) -> Step {
        if self.do_not_execute || self.skip_set.contains(&query.sql) {
            tracing::debug!(line = query.line, sql = %query.sql, "skipping query");
            stats.record_ignored();
            return Step::Continue;
        }

        let failure = match self.check_query(conn, query).await {
            Ok(Verdict::Pass) => {
                stats.record_pass();
                None
            }
            Ok(Verdict::Fail { message, detail }) => {
                Some(FailureRecord::new(query, message, detail))
            }
            Err(e) if e.is_invariant_violation() => {
                return Step::Stop(FileOutcome::Aborted(e));
            }
            Err(e) => {
                tracing::debug!(line = query.line, error = %e, "query raised an error");
                Some(FailureRecord::from_error(query, &e))
            }
        };
        tracing::trace!(tests = stats.total_tests(), line = query.line, "query checked");

        match failure {
            Some(record) => {
                tracing::debug!(line = query.line, message = %record.message, "query failed");
                if stats.add_failure(record) {
                    Step::Stop(FileOutcome::Stopped)
                } else {
                    Step::Continue
                }
            }
            None => Step::Continue,
        }
    }

    async fn check_query(&self, conn: &dyn Connection, query: &SltQuery) -> RunnerResult<Verdict> {
        let result = conn.query(&query.sql).await?;
        tracing::trace!(
            line = query.line,
            columns = %result
                .columns
                .iter()
                .map(|c| format!("{} {}", c.name, c.data_type))
                .join(", "),
            "query returned"
        );
        let rows = normalize_result(&result, &query.output.column_types)?;
        validate(&query.output, rows)
    }

    /// `DROP VIEW v` becomes `DROP VIEW IF EXISTS v [CASCADE]`.
    fn rewrite_drop_view(&self, sql: &str) -> String {
        const DROP_VIEW: &str = "drop view";

        let Some(head) = sql.get(..DROP_VIEW.len()) else {
            return sql.to_string();
        };
        if !head.eq_ignore_ascii_case(DROP_VIEW) {
            return sql.to_string();
        }
        let rest = &sql[DROP_VIEW.len()..];
        if !rest.starts_with(char::is_whitespace) {
            return sql.to_string();
        }

        let lower = sql.to_ascii_lowercase();
        let mut rewritten = if lower.contains("if exists") {
            sql.to_string()
        } else {
            format!("{} IF EXISTS {}", head, rest.trim_start())
        };
        if self.driver.capabilities().supports_drop_cascade && !lower.contains("cascade") {
            rewritten.push_str(" CASCADE");
        }
        rewritten
    }

    fn schema<'a>(&self, conn: &'a dyn Connection) -> Option<&'a dyn SchemaIntrospection> {
        let schema = conn.as_schema_introspection();
        if schema.is_none() {
            tracing::warn!(
                driver = conn.driver_name(),
                "connection cannot list its tables; schema is not reset"
            );
        }
        schema
    }

    async fn drop_all_tables(&self, conn: &dyn Connection) -> RunnerResult<()> {
        let Some(schema) = self.schema(conn) else {
            return Ok(());
        };
        for table in schema.list_tables().await? {
            let sql = format!(
                "DROP TABLE {}{}",
                qualified_name(table.schema.as_deref(), &table.name),
                self.cascade()
            );
            tracing::debug!(sql = %sql, "dropping table");
            conn.execute(&sql).await?;
        }
        Ok(())
    }

    async fn drop_all_views(&self, conn: &dyn Connection) -> RunnerResult<()> {
        if !self.driver.capabilities().supports_views {
            return Ok(());
        }
        let Some(schema) = self.schema(conn) else {
            return Ok(());
        };
        for view in schema.list_views().await? {
            let sql = format!(
                "DROP VIEW IF EXISTS {}{}",
                qualified_name(view.schema.as_deref(), &view.name),
                self.cascade()
            );
            tracing::debug!(sql = %sql, "dropping view");
            conn.execute(&sql).await?;
        }
        Ok(())
    }

    fn cascade(&self) -> &'static str {
        if self.driver.capabilities().supports_drop_cascade {
            " CASCADE"
        } else {
            ""
        }
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn qualified_name(schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(schema) => format!("{}.{}", quote_identifier(schema), quote_identifier(name)),
        None => quote_identifier(name),
    }
}
