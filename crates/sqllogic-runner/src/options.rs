//! Options that shape a run

use crate::{RunnerError, RunnerResult};
use serde::{Deserialize, Serialize};
use sqllogic_core::ConnectionConfig;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXECUTOR: &str = "sqlite";

/// Everything a run needs besides the scripts themselves.
///
/// Can be read from a TOML file; the command line overrides individual
/// fields afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    /// Registered backend name
    pub executor: String,
    /// Root of the test suite
    pub directory: Option<PathBuf>,
    /// Files or directories to run, relative to `directory`
    pub tests: Vec<PathBuf>,
    pub stop_at_first_error: bool,
    /// Parse scripts without running anything
    pub do_not_execute: bool,
    /// Skip list file
    pub bugs_file: Option<PathBuf>,
    pub verbosity: u8,
    /// Engine name for `skipif`/`onlyif`; defaults to the backend's dialect
    pub engine_name: Option<String>,
    pub connection: ConnectionOptions,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            executor: DEFAULT_EXECUTOR.to_string(),
            directory: None,
            tests: Vec::new(),
            stop_at_first_error: false,
            do_not_execute: false,
            bugs_file: None,
            verbosity: 0,
            engine_name: None,
            connection: ConnectionOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl ExecutionOptions {
    pub fn load(path: &Path) -> RunnerResult<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| RunnerError::io(path, source))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            RunnerError::Configuration(message) => {
                RunnerError::Configuration(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    pub fn from_toml_str(contents: &str) -> RunnerResult<Self> {
        toml::from_str(contents).map_err(|e| RunnerError::Configuration(e.to_string()))
    }

    /// Connection settings for the selected executor
    pub fn connection_config(&self) -> ConnectionConfig {
        let mut config = ConnectionConfig::new(&self.executor);
        if let Some(host) = &self.connection.host {
            config.host = host.clone();
        }
        config.port = self.connection.port.unwrap_or(0);
        config.database = self.connection.database.clone();
        config.username = self.connection.user.clone();
        config.password = self.connection.password.clone();
        config
    }

    /// Paths to walk: each entry of `tests` under `directory`, or the
    /// directory itself when no tests are named
    pub fn test_roots(&self) -> RunnerResult<Vec<PathBuf>> {
        match (&self.directory, self.tests.is_empty()) {
            (Some(directory), true) => Ok(vec![directory.clone()]),
            (Some(directory), false) => Ok(self.tests.iter().map(|t| directory.join(t)).collect()),
            (None, false) => Ok(self.tests.clone()),
            (None, true) => Err(RunnerError::Configuration(
                "No test directory or test files given".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_toml_overrides_defaults() {
        let options = ExecutionOptions::from_toml_str(indoc! {r#"
            executor = "postgres"
            directory = "/srv/slt"
            tests = ["select1.test", "index"]
            stop_at_first_error = true

            [connection]
            user = "slt"
            port = 5433
        "#})
        .unwrap();

        assert_eq!(options.executor, "postgres");
        assert!(options.stop_at_first_error);
        assert!(!options.do_not_execute);
        assert_eq!(
            options.test_roots().unwrap(),
            vec![
                PathBuf::from("/srv/slt/select1.test"),
                PathBuf::from("/srv/slt/index")
            ]
        );

        let config = options.connection_config();
        assert_eq!(config.driver, "postgres");
        assert_eq!(config.port, 5433);
        assert_eq!(config.get_string("user").as_deref(), Some("slt"));
        assert_eq!(config.get_string("host"), None);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(
            ExecutionOptions::from_toml_str("").unwrap(),
            ExecutionOptions::default()
        );
    }

    #[test]
    fn test_unknown_field_type_is_a_configuration_error() {
        let err = ExecutionOptions::from_toml_str("verbosity = \"loud\"").unwrap_err();
        assert!(matches!(err, RunnerError::Configuration(_)));
    }

    #[test]
    fn test_roots_require_something_to_run() {
        assert!(ExecutionOptions::default().test_roots().is_err());
    }
}
