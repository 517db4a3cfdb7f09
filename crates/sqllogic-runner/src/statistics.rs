//! Pass/fail accounting and the end-of-run report

use crate::SltQuery;
use std::fmt;

/// A query that did not produce the expected output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub file: String,
    pub line: usize,
    pub query: String,
    pub message: String,
    /// Both renderings for output mismatches, the hashes for hash mismatches
    pub detail: String,
    /// Debug rendering of the underlying error, if the query raised one
    pub cause: Option<String>,
}

impl FailureRecord {
    pub fn new(query: &SltQuery, message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            file: query.file.clone(),
            line: query.line,
            query: query.sql.clone(),
            message: message.into(),
            detail: detail.into(),
            cause: None,
        }
    }

    /// Record an error raised while running or checking the query
    pub fn from_error<E>(query: &SltQuery, error: &E) -> Self
    where
        E: std::error::Error,
    {
        let mut record = Self::new(query, error.to_string(), String::new());
        record.cause = Some(format!("{:?}", error));
        record
    }
}

impl fmt::Display for FailureRecord {
    /// The alternate form (`{:#}`) adds the detail and cause.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;
        writeln!(f, "\t{}:{}", self.file, self.line)?;
        writeln!(f, "\t{}", self.query)?;
        if f.alternate() {
            if !self.detail.is_empty() {
                write!(f, "{}", self.detail)?;
            }
            if let Some(cause) = &self.cause {
                writeln!(f, "{}", cause)?;
            }
        }
        Ok(())
    }
}

/// Counters for one file or a whole run.
///
/// Per-file statistics are merged into the run total with [`add`](Self::add).
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    pub files_processed: usize,
    pub files_not_parsed: usize,
    pub passed: usize,
    pub failed: usize,
    pub ignored: usize,
    failures: Vec<FailureRecord>,
    stop_at_first_failure: bool,
}

impl RunStatistics {
    pub fn new(stop_at_first_failure: bool) -> Self {
        Self {
            stop_at_first_failure,
            ..Default::default()
        }
    }

    pub fn record_pass(&mut self) {
        self.passed += 1;
    }

    pub fn record_ignored(&mut self) {
        self.ignored += 1;
    }

    /// Record a failure. Returns `true` when the current file must stop.
    pub fn add_failure(&mut self, failure: FailureRecord) -> bool {
        self.failures.push(failure);
        self.failed += 1;
        self.stop_at_first_failure
    }

    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    pub fn stop_at_first_failure(&self) -> bool {
        self.stop_at_first_failure
    }

    /// Fold another set of counters into this one
    pub fn add(&mut self, other: RunStatistics) {
        self.files_processed += other.files_processed;
        self.files_not_parsed += other.files_not_parsed;
        self.passed += other.passed;
        self.failed += other.failed;
        self.ignored += other.ignored;
        self.failures.extend(other.failures);
    }

    pub fn total_tests(&self) -> usize {
        self.passed + self.failed + self.ignored
    }
}

impl fmt::Display for RunStatistics {
    /// The alternate form (`{:#}`) is passed down to each failure.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Files processed: {}", group_digits(self.files_processed))?;
        writeln!(f, "Files not parsed: {}", group_digits(self.files_not_parsed))?;
        writeln!(f, "Passed: {}", group_digits(self.passed))?;
        writeln!(f, "Failed: {}", group_digits(self.failed))?;
        writeln!(f, "Ignored: {}", group_digits(self.ignored))?;
        if !self.failures.is_empty() {
            writeln!(f, "{} failures:", group_digits(self.failures.len()))?;
        }
        for failure in &self.failures {
            if f.alternate() {
                write!(f, "{:#}", failure)?;
            } else {
                write!(f, "{}", failure)?;
            }
        }
        Ok(())
    }
}

/// `1234567` → `1,234,567`
pub(crate) fn group_digits(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
