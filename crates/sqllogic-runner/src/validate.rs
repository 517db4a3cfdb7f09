//! Comparison of canonical query output with the script's expectation

use crate::{CanonicalRow, OutputDescription, RunnerResult, sort_rows};
use itertools::Itertools;
use md5::{Digest, Md5};

/// Outcome of checking one query's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail { message: String, detail: String },
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// Check normalized rows against `output`.
///
/// The checks run in order and stop at the first mismatch: value count,
/// then (after sorting) the literal values, then the hash.
pub fn validate(output: &OutputDescription, rows: Vec<CanonicalRow>) -> RunnerResult<Verdict> {
    let actual = rows.len() * output.column_count();
    if actual != output.value_count {
        return Ok(Verdict::Fail {
            message: format!("Expected {} rows, got {}", output.value_count, actual),
            detail: String::new(),
        });
    }

    let rows = sort_rows(rows, output.sort_order)?;

    if let Some(expected) = &output.literal_rows {
        let computed = render(&rows);
        let expected = expected.join("\n");
        if computed != expected {
            return Ok(Verdict::Fail {
                message: "Output differs from expected value".to_string(),
                detail: format!("computed\n{}\nExpected:\n{}\n", computed, expected),
            });
        }
    }

    if let Some(expected) = &output.hash {
        let computed = result_hash(&rows);
        if *expected != computed {
            return Ok(Verdict::Fail {
                message: "Hash of data does not match expected value".to_string(),
                detail: format!("expected:{} computed: {}\n", expected, computed),
            });
        }
    }

    if output.literal_rows.is_none() && output.hash.is_none() {
        tracing::debug!(values = actual, "no expected values or hash; only the count was checked");
    }
    Ok(Verdict::Pass)
}

/// MD5 over every value followed by a newline, as lowercase hex
pub fn result_hash(rows: &[CanonicalRow]) -> String {
    let mut hasher = Md5::new();
    for value in rows.iter().flatten() {
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

fn render(rows: &[CanonicalRow]) -> String {
    rows.iter().flatten().join("\n")
}
