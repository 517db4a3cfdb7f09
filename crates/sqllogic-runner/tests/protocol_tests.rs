//! Execution protocol against a scripted backend

mod common;

use common::{MockDriver, Script, initialize_logging, query_count, test_file};
use indoc::indoc;
use pretty_assertions::assert_eq;
use sqllogic_core::{ConnectionConfig, Value};
use sqllogic_runner::{RunSession, SkipSet, SltExecutor};
use std::sync::Arc;

fn executor(driver: &Arc<MockDriver>) -> SltExecutor {
    SltExecutor::new(driver.clone(), ConnectionConfig::new("mock"))
}

#[tokio::test]
async fn test_phases_run_in_order() {
    initialize_logging();
    let driver = Arc::new(MockDriver::new(
        Script::default()
            .with_table("t1")
            .with_view("v1")
            .with_rows("SELECT a FROM t1", vec![vec![Value::Int64(1)]]),
    ));
    let file = test_file(indoc! {"
        statement ok
        INSERT INTO t1 VALUES(1)

        query I nosort
        SELECT a FROM t1
        ----
        1
    "});

    let stats = executor(&driver)
        .execute_file(&file, &mut RunSession::new())
        .await
        .unwrap();

    assert_eq!(
        driver.sql_log(),
        vec![
            "DROP TABLE \"t1\"",
            "INSERT INTO t1 VALUES(1)",
            "SELECT a FROM t1",
            "DROP VIEW IF EXISTS \"v1\"",
            "DROP TABLE \"t1\"",
        ]
    );
    assert_eq!(stats.files_processed, 1);
    assert_eq!(stats.passed, 1);
    assert_eq!(driver.connects(), 1);
    assert_eq!(driver.closes(), 1);
}

#[tokio::test]
async fn test_cascade_follows_capabilities() {
    let driver = Arc::new(
        MockDriver::new(Script::default().with_table("t1").with_view("v1")).with_cascade(),
    );
    let file = test_file("statement ok\nDROP VIEW v9\n");

    executor(&driver)
        .execute_file(&file, &mut RunSession::new())
        .await
        .unwrap();

    assert_eq!(
        driver.sql_log(),
        vec![
            "DROP TABLE \"t1\" CASCADE",
            "DROP VIEW IF EXISTS v9 CASCADE",
            "DROP VIEW IF EXISTS \"v1\" CASCADE",
            "DROP TABLE \"t1\" CASCADE",
        ]
    );
}

#[tokio::test]
async fn test_mixed_types_are_normalized_before_comparison() {
    let driver = Arc::new(MockDriver::new(Script::default().with_rows(
        "SELECT * FROM t",
        vec![vec![
            Value::Int64(42),
            Value::Float64(3.14159),
            Value::String("hi\tthere".into()),
        ]],
    )));
    let file = test_file(indoc! {"
        query IRT nosort
        SELECT * FROM t
        ----
        42
        3.142
        hi@there
    "});

    let stats = executor(&driver)
        .execute_file(&file, &mut RunSession::new())
        .await
        .unwrap();
    assert_eq!(stats.passed, 1);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn test_size_mismatch_is_recorded() {
    let driver = Arc::new(MockDriver::new(Script::default().with_rows(
        "SELECT a, b, c FROM t",
        vec![vec![Value::Int64(1), Value::Int64(2), Value::Int64(3)]],
    )));
    let file = test_file(indoc! {"
        query III nosort
        SELECT a, b, c FROM t
        ----
        6 values hashing to 00000000000000000000000000000000
    "});

    let stats = executor(&driver)
        .execute_file(&file, &mut RunSession::new())
        .await
        .unwrap();
    assert_eq!(stats.failed, 1);
    let failure = &stats.failures()[0];
    assert_eq!(failure.message, "Expected 6 rows, got 3");
    assert_eq!(failure.file, "inline.test");
    assert_eq!(failure.line, 1);
    assert_eq!(failure.query, "SELECT a, b, c FROM t");
}

#[tokio::test]
async fn test_skip_listed_query_is_ignored_and_never_sent() {
    let driver = Arc::new(MockDriver::new(Script::default()));
    let file = test_file(indoc! {"
        statement ok
        CREATE TABLE broken(x INTEGER)

        query I nosort
        SELECT x FROM broken
        ----

        query I nosort
        SELECT 1
        ----
    "});
    let mut skip = SkipSet::new();
    skip.insert("SELECT x FROM broken");
    skip.insert("CREATE TABLE broken(x INTEGER)");

    let stats = executor(&driver)
        .with_skip_set(skip)
        .execute_file(&file, &mut RunSession::new())
        .await
        .unwrap();

    assert!(!driver.was_sent("SELECT x FROM broken"));
    assert!(!driver.was_sent("CREATE TABLE broken(x INTEGER)"));
    assert!(driver.was_sent("SELECT 1"));
    assert_eq!(stats.ignored, 1);
    // "SELECT 1" returns no rows here, matching the empty expectation.
    assert_eq!(stats.passed, 1);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn test_stop_at_first_failure_skips_rest_of_file() {
    let driver = Arc::new(MockDriver::new(
        Script::default()
            .with_rows("SELECT 1", vec![vec![Value::Int64(1)]])
            .with_rows("SELECT 2", vec![vec![Value::Int64(99)]])
            .with_rows("SELECT 3", vec![vec![Value::Int64(3)]])
            .with_rows("SELECT 4", vec![vec![Value::Int64(4)]])
            .with_rows("SELECT 5", vec![vec![Value::Int64(5)]]),
    ));
    let file = test_file(indoc! {"
        query I nosort
        SELECT 1
        ----
        1

        query I nosort
        SELECT 2
        ----
        2

        query I nosort
        SELECT 3
        ----
        3

        query I nosort
        SELECT 4
        ----
        4

        query I nosort
        SELECT 5
        ----
        5
    "});
    assert_eq!(query_count(&file), 5);

    let stats = executor(&driver)
        .stop_at_first_error(true)
        .execute_file(&file, &mut RunSession::new())
        .await
        .unwrap();

    assert_eq!(stats.failures().len(), 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.passed, 1);
    assert_eq!(stats.ignored, 0);
    for sql in ["SELECT 3", "SELECT 4", "SELECT 5"] {
        assert!(!driver.was_sent(sql), "{sql} should not run");
    }
    assert_eq!(driver.closes(), 1);
}

#[tokio::test]
async fn test_failures_continue_without_stop_flag() {
    let driver = Arc::new(MockDriver::new(
        Script::default()
            .with_failure("SELECT broken")
            .with_rows("SELECT 2", vec![vec![Value::Int64(2)]]),
    ));
    let file = test_file(indoc! {"
        query I nosort
        SELECT broken
        ----
        1

        query I nosort
        SELECT 2
        ----
        2
    "});

    let stats = executor(&driver)
        .execute_file(&file, &mut RunSession::new())
        .await
        .unwrap();

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.passed, 1);
    let failure = &stats.failures()[0];
    assert!(failure.message.contains("scripted failure: SELECT broken"));
    assert!(failure.cause.is_some());
}

#[tokio::test]
async fn test_failed_statement_aborts_file_but_still_cleans_up() {
    let driver = Arc::new(MockDriver::new(
        Script::default()
            .with_table("t1")
            .with_failure("CREATE TABLE t1(a INTEGER)"),
    ));
    let file = test_file(indoc! {"
        statement ok
        CREATE TABLE t1(a INTEGER)

        statement ok
        INSERT INTO t1 VALUES(1)

        query I nosort
        SELECT a FROM t1
        ----
        1
    "});

    let stats = executor(&driver)
        .execute_file(&file, &mut RunSession::new())
        .await
        .unwrap();

    assert_eq!(stats.files_processed, 1);
    assert_eq!(stats.files_not_parsed, 1);
    assert_eq!(stats.total_tests(), 0);
    assert!(!driver.was_sent("INSERT INTO t1 VALUES(1)"));
    assert!(!driver.was_sent("SELECT a FROM t1"));
    assert_eq!(
        driver.sql_log().last().map(String::as_str),
        Some("DROP TABLE \"t1\"")
    );
    assert_eq!(driver.closes(), 1);
}

#[tokio::test]
async fn test_expected_statement_errors_are_tolerated() {
    let driver = Arc::new(MockDriver::new(
        Script::default().with_failure("INSERT INTO missing VALUES(1)"),
    ));
    let file = test_file(indoc! {"
        statement error
        INSERT INTO missing VALUES(1)

        statement error
        SELECT 'this one succeeds'

        query I nosort
        SELECT 1
        ----
    "});

    let stats = executor(&driver)
        .execute_file(&file, &mut RunSession::new())
        .await
        .unwrap();

    assert_eq!(stats.files_not_parsed, 0);
    assert_eq!(stats.passed, 1);
    assert!(driver.was_sent("SELECT 1"));
}

#[tokio::test]
async fn test_parse_only_executes_nothing() {
    let driver = Arc::new(MockDriver::new(Script::default()));
    let file = test_file(indoc! {"
        statement ok
        CREATE TABLE t1(a INTEGER)

        query I nosort
        SELECT a FROM t1
        ----
        1

        query I nosort
        SELECT a FROM t1 WHERE a > 0
        ----
        1
    "});

    let stats = executor(&driver)
        .do_not_execute(true)
        .execute_file(&file, &mut RunSession::new())
        .await
        .unwrap();

    assert_eq!(stats.ignored, 2);
    assert_eq!(stats.passed + stats.failed, 0);
    assert!(driver.sql_log().is_empty());
}

#[tokio::test]
async fn test_session_accumulates_test_counts() {
    let driver = Arc::new(MockDriver::new(Script::default()));
    let file = test_file("query I nosort\nSELECT 1\n----\n");
    let executor = executor(&driver);
    let mut session = RunSession::new();

    executor.execute_file(&file, &mut session).await.unwrap();
    executor.execute_file(&file, &mut session).await.unwrap();

    assert_eq!(session.files(), 2);
    assert_eq!(session.total_tests(), 2);
    assert_eq!(driver.connects(), 2);
    assert_eq!(driver.closes(), 2);
}
