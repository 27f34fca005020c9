//! Date-ops stage: string-to-datetime conversion and processing timestamps.

use super::{with_new_series, with_series, Operation, Outcome, Stage};
use crate::error::Result;
use crate::matchers;
use crate::resolver::ColumnResolver;
use crate::table;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;
use tracing::debug;

pub const TIMESTAMP_COLUMN: &str = "timestamp";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// Month-first for slashed dates.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Parse a cell into a naive UTC datetime, `None` when no known format fits.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Unparseable cells become null.
pub struct ConvertDates;

impl Operation for ConvertDates {
    fn name(&self) -> &'static str {
        "convert_dates"
    }

    fn stage(&self) -> Stage {
        Stage::DateOps
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        let capture = match matchers::match_date_convert(instruction) {
            Some(c) => c,
            None => return Ok(Outcome::skipped("no date directive")),
        };
        let column = match ColumnResolver::for_table(df).resolve_first(&capture.column) {
            Some(c) => c,
            None => return Ok(Outcome::skipped(format!("column '{}' not found", capture.column))),
        };

        let series = df.column(&column)?;
        if !table::is_text(series) {
            debug!("Column '{}' is {:?}, not converting", column, series.dtype());
            return Ok(Outcome::skipped(format!("column '{}' is not text", column)));
        }

        let millis: Vec<Option<i64>> = table::text_values(series)?
            .iter()
            .map(|v| {
                v.as_deref()
                    .and_then(parse_datetime)
                    .map(|dt| dt.and_utc().timestamp_millis())
            })
            .collect();
        let converted = Series::new(&column, millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

        Ok(Outcome::Applied(with_series(df, converted)?))
    }
}

pub struct AddTimestamp;

impl Operation for AddTimestamp {
    fn name(&self) -> &'static str {
        "add_timestamp"
    }

    fn stage(&self) -> Stage {
        Stage::DateOps
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        if !matchers::match_timestamp(instruction) {
            return Ok(Outcome::skipped("no timestamp directive"));
        }
        let now = Utc::now().to_rfc3339();
        let stamps = vec![now; df.height()];
        with_new_series(df, Series::new(TIMESTAMP_COLUMN, stamps))
    }
}
