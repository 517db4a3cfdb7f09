//! Known-bad statements and queries

use crate::{RunnerError, RunnerResult};
use std::collections::HashSet;
use std::path::Path;

const COMMENT_PREFIX: &str = "//";

/// SQL texts that are not sent to the backend.
///
/// Skipped statements are not counted; skipped queries count as ignored.
#[derive(Debug, Clone, Default)]
pub struct SkipSet {
    entries: HashSet<String>,
}

impl SkipSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a skip file: one SQL text per line, `//` starts a comment line
    pub fn load(path: &Path) -> RunnerResult<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| RunnerError::io(path, source))?;
        let set = Self::parse(&contents);
        tracing::info!(path = %path.display(), entries = set.len(), "skip list loaded");
        Ok(set)
    }

    pub fn parse(contents: &str) -> Self {
        contents
            .lines()
            .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_PREFIX))
            .map(str::to_string)
            .collect()
    }

    pub fn insert(&mut self, sql: impl Into<String>) {
        self.entries.insert(sql.into());
    }

    pub fn contains(&self, sql: &str) -> bool {
        self.entries.contains(sql)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<String> for SkipSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
