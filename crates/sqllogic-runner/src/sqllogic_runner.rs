//! sqllogic runner - executes sqllogictest scripts against a backend
//!
//! A script is parsed into an ordered list of [`SltOperation`]s. Each file
//! is then run by [`SltExecutor`] over one exclusive connection:
//!
//! ```text
//! connect → on_connect hook → drop tables → operations → drop views → drop tables → close
//! ```
//!
//! Every query result goes through the same pipeline before a verdict is
//! recorded in [`RunStatistics`]:
//!
//! ```text
//! raw rows → normalize (per column type) → sort (nosort/rowsort/valuesort) → validate
//! ```
//!
//! [`TestLoader`] walks directories of `.test` files and accumulates the
//! per-file statistics for the final report.

mod error;
mod executor;
mod loader;
mod normalize;
mod operation;
mod options;
mod parser;
mod session;
mod skip_list;
mod sort;
mod statistics;
mod validate;

pub use error::{ParseError, RunnerError, RunnerResult};
pub use executor::SltExecutor;
pub use loader::{TestLoader, collect_test_files};
pub use normalize::{CanonicalRow, normalize_result, normalize_row};
pub use operation::{
    ColumnType, OutputDescription, SltOperation, SltQuery, SltStatement, SltTestFile, SortOrder,
};
pub use options::{ConnectionOptions, ExecutionOptions};
pub use parser::{parse_file, parse_script};
pub use session::{FileTimer, RunSession};
pub use skip_list::SkipSet;
pub use sort::sort_rows;
pub use statistics::{FailureRecord, RunStatistics};
pub use validate::{Verdict, result_hash, validate};
