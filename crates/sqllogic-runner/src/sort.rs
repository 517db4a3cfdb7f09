//! Result ordering applied before comparison

use crate::{CanonicalRow, RunnerError, RunnerResult, SortOrder};

/// Order canonical rows as the query's sort mode requires.
///
/// `Value` flattens the result into one single-value row per value, so
/// the output has `rows × columns` rows.
pub fn sort_rows(rows: Vec<CanonicalRow>, order: SortOrder) -> RunnerResult<Vec<CanonicalRow>> {
    match order {
        SortOrder::None => Ok(rows),
        SortOrder::Row => {
            if let Some(first) = rows.first()
                && let Some(other) = rows.iter().find(|row| row.len() != first.len())
            {
                return Err(RunnerError::RowArity {
                    left: first.len(),
                    right: other.len(),
                });
            }
            let mut rows = rows;
            rows.sort();
            Ok(rows)
        }
        SortOrder::Value => {
            let mut values: Vec<CanonicalRow> =
                rows.into_iter().flatten().map(|value| vec![value]).collect();
            values.sort();
            Ok(values)
        }
    }
}
