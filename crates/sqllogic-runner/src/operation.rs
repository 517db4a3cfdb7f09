//! Parsed test operations

use crate::RunnerError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Declared type of one result column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// `I`
    Integer,
    /// `R`
    Real,
    /// `T`
    Text,
}

impl ColumnType {
    pub fn code(self) -> char {
        match self {
            ColumnType::Integer => 'I',
            ColumnType::Real => 'R',
            ColumnType::Text => 'T',
        }
    }
}

impl TryFrom<char> for ColumnType {
    type Error = RunnerError;

    fn try_from(code: char) -> Result<Self, Self::Error> {
        match code {
            'I' => Ok(ColumnType::Integer),
            'R' => Ok(ColumnType::Real),
            'T' => Ok(ColumnType::Text),
            other => Err(RunnerError::UnknownColumnType(other)),
        }
    }
}

/// How query output is ordered before it is compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Keep the backend's order (`nosort`)
    #[default]
    None,
    /// Sort whole rows (`rowsort`)
    Row,
    /// Sort individual values, discarding row structure (`valuesort`)
    Value,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nosort" => Ok(SortOrder::None),
            "rowsort" => Ok(SortOrder::Row),
            "valuesort" => Ok(SortOrder::Value),
            other => Err(format!("Unknown sort order '{}'", other)),
        }
    }
}

/// What a query is expected to produce
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputDescription {
    /// One type code per column, e.g. `"IRT"`
    pub column_types: String,
    pub sort_order: SortOrder,
    /// Total number of values (rows × columns) the query should return
    pub value_count: usize,
    /// Expected values, one per line, when the script lists them
    pub literal_rows: Option<Vec<String>>,
    /// Lowercase hex MD5 of the canonical output, when the script gives one
    pub hash: Option<String>,
}

impl OutputDescription {
    pub fn column_count(&self) -> usize {
        self.column_types.chars().count()
    }

    /// Number of rows implied by the value count
    pub fn expected_row_count(&self) -> usize {
        match self.column_count() {
            0 => 0,
            columns => self.value_count / columns,
        }
    }
}

/// A statement whose only observable outcome is success or failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SltStatement {
    pub sql: String,
    pub expect_success: bool,
    pub line: usize,
}

/// A query together with its expected output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SltQuery {
    pub sql: String,
    pub file: String,
    pub line: usize,
    /// Optional label from the `query` header
    pub name: Option<String>,
    pub output: OutputDescription,
}

impl fmt::Display for SltQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SltOperation {
    Statement(SltStatement),
    Query(SltQuery),
}

/// A parsed script
#[derive(Debug, Clone, Default)]
pub struct SltTestFile {
    pub path: PathBuf,
    pub operations: Vec<SltOperation>,
}

impl SltTestFile {
    /// Number of queries in the file
    pub fn test_count(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, SltOperation::Query(_)))
            .count()
    }
}
