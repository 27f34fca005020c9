//! Ingestion: uploaded file bytes to a table.
//!
//! Only comma-separated files are decoded, through the polars CSV reader with schema inference
//! over the first rows. Empty cells are null.

use crate::error::{ForgeError, Result};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

const INFER_SCHEMA_ROWS: usize = 1000;

fn extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Decode `bytes` according to the extension of `file_name`.
pub fn read_table(bytes: &[u8], file_name: &str) -> Result<DataFrame> {
    match extension(file_name).as_str() {
        "csv" => read_csv(bytes),
        "xlsx" | "xls" => Err(ForgeError::UnsupportedFormat(format!(
            "spreadsheet files are not supported: {}",
            file_name
        ))),
        other => Err(ForgeError::UnsupportedFormat(format!(
            "unrecognized extension '{}' for {}",
            other, file_name
        ))),
    }
}

fn read_csv(bytes: &[u8]) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()?;

    let df = type_empty_columns(df)?;
    info!("Loaded CSV: {} rows x {} columns", df.height(), df.width());
    Ok(df)
}

/// Columns without a single value come back as strings; type them as Float64 so numeric
/// operations still see them.
fn type_empty_columns(mut df: DataFrame) -> Result<DataFrame> {
    if df.height() == 0 {
        return Ok(df);
    }
    let empty: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|s| s.null_count() == s.len())
        .map(|s| s.name().to_string())
        .collect();

    for name in empty {
        debug!("Column '{}' has no values, typing it as Float64", name);
        let typed = df.column(&name)?.cast(&DataType::Float64)?;
        df.with_column(typed)?;
    }
    Ok(df)
}
