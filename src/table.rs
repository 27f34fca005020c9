use crate::error::Result;
use lazy_static::lazy_static;
use polars::prelude::*;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Lowercase, trim, and replace internal whitespace runs with a single underscore.
pub fn normalize_name(name: &str) -> String {
    WHITESPACE
        .replace_all(name.trim(), "_")
        .to_lowercase()
}

/// Copy of `df` with every column name normalized.
///
/// Names that collide after normalization get a numeric suffix (`name_1`, `name_2`, ...), first
/// occurrence keeps the plain name.
pub fn normalize_column_names(df: &DataFrame) -> Result<DataFrame> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(df.width());

    for original in df.get_column_names() {
        let base = normalize_name(original);
        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        seen.insert(candidate.clone());
        names.push(candidate);
    }

    let mut result = df.clone();
    result.set_column_names(names.as_slice())?;
    Ok(result)
}

pub fn is_numeric(series: &Series) -> bool {
    series.dtype().is_numeric()
}

pub fn is_text(series: &Series) -> bool {
    matches!(series.dtype(), DataType::String)
}

/// Names of numeric columns, in column order.
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|s| is_numeric(s))
        .map(|s| s.name().to_string())
        .collect()
}

/// Names of string columns, in column order.
pub fn text_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|s| is_text(s))
        .map(|s| s.name().to_string())
        .collect()
}

pub fn float_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let casted = series.cast(&DataType::Float64)?;
    let values = casted.f64()?.into_iter().collect();
    Ok(values)
}

pub fn text_values(series: &Series) -> Result<Vec<Option<String>>> {
    let casted = series.cast(&DataType::String)?;
    let values = casted
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    Ok(values)
}

/// True when every column has exactly `df.height()` values.
pub fn is_consistent(df: &DataFrame) -> bool {
    let height = df.height();
    df.get_columns().iter().all(|s| s.len() == height)
}

/// Convert a table to a JSON array with one object per row.
pub fn to_records(df: &DataFrame) -> Value {
    let columns = df.get_columns();
    let mut rows = Vec::with_capacity(df.height());

    for idx in 0..df.height() {
        let mut row = Map::new();
        for series in columns {
            let value = series.get(idx).map(any_value_to_json).unwrap_or(Value::Null);
            row.insert(series.name().to_string(), value);
        }
        rows.push(Value::Object(row));
    }

    Value::Array(rows)
}

fn any_value_to_json(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::Int8(v) => Value::from(v),
        AnyValue::Int16(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt8(v) => Value::from(v),
        AnyValue::UInt16(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => float_to_json(v as f64),
        AnyValue::Float64(v) => float_to_json(v),
        other => Value::String(other.to_string()),
    }
}

fn float_to_json(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}
