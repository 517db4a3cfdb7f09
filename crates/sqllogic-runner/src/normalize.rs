//! Conversion of raw backend values into comparable strings
//!
//! Every value is rendered according to the type code declared for its
//! column, not the type the backend happened to return:
//!
//! - `I`: decimal integer. Values that cannot be read as an integer become
//!   `"0"` instead of failing the row.
//! - `R`: fixed point with three fractional digits.
//! - `T`: the text, with every character outside `' '..='~'` replaced by `@`.
//!
//! `NULL` renders as `"NULL"` for all three.

use crate::{ColumnType, RunnerError, RunnerResult};
use sqllogic_core::{QueryResult, Row, Value};

/// One row of canonical values, in column order
pub type CanonicalRow = Vec<String>;

const NULL: &str = "NULL";

/// Normalize every row of a query result.
///
/// When the backend reports its columns, their count must match the declared
/// types even if no rows came back.
pub fn normalize_result(result: &QueryResult, column_types: &str) -> RunnerResult<Vec<CanonicalRow>> {
    let types = parse_types(column_types)?;
    let reported = result.column_count();
    if reported > 0 && reported != types.len() {
        return Err(RunnerError::ColumnCount {
            expected: types.len(),
            actual: reported,
        });
    }
    result
        .rows
        .iter()
        .map(|row| normalize_typed(row, &types))
        .collect()
}

/// Normalize one row against a type string such as `"IRT"`
pub fn normalize_row(row: &Row, column_types: &str) -> RunnerResult<CanonicalRow> {
    normalize_typed(row, &parse_types(column_types)?)
}

fn parse_types(column_types: &str) -> RunnerResult<Vec<ColumnType>> {
    column_types.chars().map(ColumnType::try_from).collect()
}

fn normalize_typed(row: &Row, types: &[ColumnType]) -> RunnerResult<CanonicalRow> {
    if row.len() != types.len() {
        return Err(RunnerError::ColumnCount {
            expected: types.len(),
            actual: row.len(),
        });
    }
    row.values
        .iter()
        .zip(types)
        .enumerate()
        .map(|(column, (value, column_type))| normalize_value(value, *column_type, column))
        .collect()
}

fn normalize_value(value: &Value, column_type: ColumnType, column: usize) -> RunnerResult<String> {
    if value.is_null() {
        return Ok(NULL.to_string());
    }
    match column_type {
        ColumnType::Integer => Ok(integer_value(value).unwrap_or(0).to_string()),
        ColumnType::Real => real_value(value)
            .map(format_real)
            .ok_or_else(|| RunnerError::Normalization {
                column,
                value: value.to_string(),
                expected: "a real number",
            }),
        ColumnType::Text => Ok(printable(&text_value(value))),
    }
}

fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Float32(f) => truncate(*f as f64),
        Value::Float64(f) => truncate(*f),
        Value::String(s) | Value::Decimal(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                let prefix = numeric_prefix(s);
                prefix
                    .parse::<i64>()
                    .ok()
                    .or_else(|| prefix.parse::<f64>().ok().and_then(truncate))
            })
        }
        Value::Bytes(b) => std::str::from_utf8(b)
            .ok()
            .and_then(|s| integer_value(&Value::String(s.to_string()))),
        other => other.as_i64(),
    }
}

/// Longest leading numeric literal of `s`, read the way SQLite converts
/// text to a number (`"12abc"` → `"12"`, `"abc"` → `""`)
fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        let mut end = start;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
        end
    };

    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let mut end = digits_from(sign);
    let mut mantissa = end - sign;
    if bytes.get(end) == Some(&b'.') {
        let fraction_end = digits_from(end + 1);
        mantissa += fraction_end - (end + 1);
        if mantissa > 0 {
            end = fraction_end;
        }
    }
    if mantissa == 0 {
        return "";
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let exponent = end + 1 + usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exponent_end = digits_from(exponent);
        if exponent_end > exponent {
            end = exponent_end;
        }
    }
    &s[..end]
}

fn truncate(f: f64) -> Option<i64> {
    let t = f.trunc();
    (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}

fn real_value(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Bytes(b) => std::str::from_utf8(b).ok()?.trim().parse().ok(),
        other => other.as_f64(),
    }
}

/// `%.3f`, with exact halves rounded away from zero
pub(crate) fn format_real(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    // Only multiples of 1/16 sit exactly halfway between two thousandths, and
    // both products below are exact for them.
    let scaled = f * 1000.0;
    if (f * 16.0).fract() == 0.0 && scaled.fract().abs() == 0.5 {
        return format!("{:.3}", scaled.round() / 1000.0);
    }
    format!("{:.3}", f)
}

fn text_value(value: &Value) -> String {
    match value {
        Value::String(s) | Value::Decimal(s) => s.clone(),
        Value::Float32(f) => float_text(*f as f64),
        Value::Float64(f) => float_text(*f),
        other => other.to_string(),
    }
}

fn float_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

/// Replace everything outside printable ASCII with `@`, one per UTF-16 unit
fn printable(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if (' '..='~').contains(&c) {
            out.push(c);
        } else {
            out.extend(std::iter::repeat_n('@', c.len_utf16()));
        }
    }
    out
}
