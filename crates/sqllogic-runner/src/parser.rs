//! sqllogictest script parser
//!
//! Records are separated by blank lines. A record is either
//!
//! ```text
//! statement ok|error
//! <sql lines>
//! ```
//!
//! or
//!
//! ```text
//! query <types> [nosort|rowsort|valuesort] [label]
//! <sql lines>
//! ----
//! <one value per line> | <N> values hashing to <md5>
//! ```
//!
//! and may be preceded by `skipif <engine>` / `onlyif <engine>` lines.

use crate::{
    ColumnType, OutputDescription, ParseError, RunnerError, RunnerResult, SltOperation, SltQuery,
    SltStatement, SltTestFile, SortOrder,
};
use std::path::Path;

const RESULT_SEPARATOR: &str = "----";

/// Read and parse a script, keeping only the records that apply to `engine`
pub fn parse_file(path: &Path, engine: &str) -> RunnerResult<SltTestFile> {
    let contents =
        std::fs::read_to_string(path).map_err(|source| RunnerError::io(path, source))?;
    let operations = parse_script(&path.display().to_string(), &contents, engine)?;
    tracing::debug!(
        path = %path.display(),
        operations = operations.len(),
        "script parsed"
    );
    Ok(SltTestFile {
        path: path.to_path_buf(),
        operations,
    })
}

/// Parse script text. `file` is only used for locations.
pub fn parse_script(
    file: &str,
    input: &str,
    engine: &str,
) -> Result<Vec<SltOperation>, ParseError> {
    let lines: Vec<&str> = input.lines().collect();
    let mut operations = Vec::new();
    let mut pos = 0;
    let mut skip_record = false;

    while pos < lines.len() {
        let line_no = pos + 1;
        let header = strip_comment(lines[pos]).trim();
        pos += 1;

        if header.is_empty() {
            // Conditions only bind to the record right below them.
            if lines[pos - 1].trim().is_empty() {
                skip_record = false;
            }
            continue;
        }

        let mut words = header.split_whitespace();
        let Some(keyword) = words.next() else {
            continue;
        };
        let error = |message: String| ParseError::new(file, line_no, message);

        match keyword {
            "skipif" | "onlyif" => {
                let target = words
                    .next()
                    .ok_or_else(|| error(format!("'{}' needs an engine name", keyword)))?;
                let matches = target.eq_ignore_ascii_case(engine);
                if (keyword == "skipif") == matches {
                    skip_record = true;
                }
            }
            "statement" => {
                let expect_success = match words.next() {
                    Some("ok") => true,
                    Some("error") => false,
                    Some(other) => {
                        return Err(error(format!(
                            "Expected 'ok' or 'error' after 'statement', found '{}'",
                            other
                        )));
                    }
                    None => return Err(error("Expected 'ok' or 'error' after 'statement'".into())),
                };
                let sql = take_block(&lines, &mut pos).join("\n");
                if sql.trim().is_empty() {
                    return Err(error("Statement has no SQL".into()));
                }
                if !skip_record {
                    operations.push(SltOperation::Statement(SltStatement {
                        sql,
                        expect_success,
                        line: line_no,
                    }));
                }
                skip_record = false;
            }
            "query" => {
                let column_types = words
                    .next()
                    .ok_or_else(|| error("Query has no column types".into()))?;
                for code in column_types.chars() {
                    ColumnType::try_from(code).map_err(|e| error(e.to_string()))?;
                }
                let sort_order = match words.next() {
                    Some(word) => word.parse::<SortOrder>().map_err(error)?,
                    None => SortOrder::None,
                };
                let name = words.next().map(str::to_string);

                let mut sql_lines = Vec::new();
                let mut has_results = false;
                while let Some(line) = lines.get(pos) {
                    if line.trim().is_empty() {
                        break;
                    }
                    pos += 1;
                    if line.trim_end() == RESULT_SEPARATOR {
                        has_results = true;
                        break;
                    }
                    sql_lines.push(*line);
                }
                if sql_lines.is_empty() {
                    return Err(error("Query has no SQL".into()));
                }
                let results = if has_results {
                    take_block(&lines, &mut pos)
                } else {
                    Vec::new()
                };
                let output = expected_output(column_types, sort_order, &results)
                    .map_err(|message| ParseError::new(file, line_no, message))?;

                if !skip_record {
                    operations.push(SltOperation::Query(SltQuery {
                        sql: sql_lines.join("\n"),
                        file: file.to_string(),
                        line: line_no,
                        name,
                        output,
                    }));
                }
                skip_record = false;
            }
            "hash-threshold" => {
                words
                    .next()
                    .and_then(|n| n.parse::<u64>().ok())
                    .ok_or_else(|| error("'hash-threshold' needs a number".into()))?;
            }
            "halt" => {
                if !skip_record {
                    tracing::debug!(file = %file, line = line_no, "halt");
                    break;
                }
                skip_record = false;
            }
            other => return Err(error(format!("Unexpected directive '{}'", other))),
        }
    }

    Ok(operations)
}

fn strip_comment(line: &str) -> &str {
    match line.trim_start().starts_with('#') {
        true => "",
        false => line.split(" #").next().unwrap_or(line),
    }
}

/// Lines up to (not including) the next blank line
fn take_block<'a>(lines: &[&'a str], pos: &mut usize) -> Vec<&'a str> {
    let start = *pos;
    while lines.get(*pos).is_some_and(|line| !line.trim().is_empty()) {
        *pos += 1;
    }
    lines[start..*pos].to_vec()
}

fn expected_output(
    column_types: &str,
    sort_order: SortOrder,
    results: &[&str],
) -> Result<OutputDescription, String> {
    let mut output = OutputDescription {
        column_types: column_types.to_string(),
        sort_order,
        ..Default::default()
    };

    if let [line] = results
        && let Some((count, hash)) = parse_hash_line(line)
    {
        output.value_count = count;
        output.hash = Some(hash.to_string());
        return Ok(output);
    }

    output.value_count = results.len();
    output.literal_rows = Some(results.iter().map(|line| line.to_string()).collect());
    Ok(output)
}

/// `<N> values hashing to <md5>`
fn parse_hash_line(line: &str) -> Option<(usize, &str)> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        [count, "values", "hashing", "to", hash] => Some((count.parse().ok()?, *hash)),
        _ => None,
    }
}
