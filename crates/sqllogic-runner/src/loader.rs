//! Discovery and sequential execution of script files

use crate::{RunSession, RunStatistics, RunnerError, RunnerResult, SltExecutor, parse_file};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const TEST_EXTENSION: &str = "test";

/// All `*.test` files under `root` (or `root` itself), in path order
pub fn collect_test_files(root: &Path) -> RunnerResult<Vec<PathBuf>> {
    if !root.exists() {
        return Err(RunnerError::Configuration(format!(
            "{} does not exist",
            root.display()
        )));
    }
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            match e.into_io_error() {
                Some(source) => RunnerError::io(path, source),
                None => RunnerError::Configuration(format!(
                    "filesystem loop at {}",
                    path.display()
                )),
            }
        })?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().is_some_and(|ext| ext == TEST_EXTENSION)
        {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// Parses and runs files one after another, accumulating the totals
pub struct TestLoader {
    executor: SltExecutor,
    engine: String,
    session: RunSession,
    statistics: RunStatistics,
}

impl TestLoader {
    /// `engine` is matched against `skipif`/`onlyif` conditions
    pub fn new(executor: SltExecutor, engine: impl Into<String>, stop_at_first_error: bool) -> Self {
        Self {
            executor: executor.stop_at_first_error(stop_at_first_error),
            engine: engine.into(),
            session: RunSession::new(),
            statistics: RunStatistics::new(stop_at_first_error),
        }
    }

    /// Run every test file under `root`
    pub async fn run_path(&mut self, root: &Path) -> RunnerResult<()> {
        for path in collect_test_files(root)? {
            self.run_file(&path).await?;
        }
        Ok(())
    }

    /// Parse and run one file. Parse errors are counted, not returned.
    #[tracing::instrument(skip(self))]
    pub async fn run_file(&mut self, path: &Path) -> RunnerResult<()> {
        tracing::info!(path = %path.display(), "running");
        let file = match parse_file(path, &self.engine) {
            Ok(file) => file,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "could not parse test file");
                self.statistics.files_not_parsed += 1;
                return Ok(());
            }
        };
        let stats = self.executor.execute_file(&file, &mut self.session).await?;
        self.statistics.add(stats);
        Ok(())
    }

    pub fn statistics(&self) -> &RunStatistics {
        &self.statistics
    }

    pub fn session(&self) -> &RunSession {
        &self.session
    }

    pub fn into_statistics(self) -> RunStatistics {
        self.statistics
    }
}
