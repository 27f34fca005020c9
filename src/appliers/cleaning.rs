//! Cleaning stage: null handling, text cleanup and case conversion.

use super::{with_series, Operation, Outcome, Stage};
use crate::error::Result;
use crate::matchers::{self, CaseMode};
use crate::resolver::ColumnResolver;
use crate::table;
use polars::prelude::*;

pub const UNKNOWN_TEXT: &str = "Unknown";

/// Trim, collapse whitespace and put every word in proper case.
pub fn proper_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => format!(
                    "{}{}",
                    first.to_uppercase(),
                    chars.as_str().to_lowercase()
                ),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct DropNulls;

impl Operation for DropNulls {
    fn name(&self) -> &'static str {
        "drop_nulls"
    }

    fn stage(&self) -> Stage {
        Stage::Cleaning
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        if !matchers::match_drop_null(instruction) {
            return Ok(Outcome::skipped("no drop-null directive"));
        }
        Ok(Outcome::Applied(df.drop_nulls::<String>(None)?))
    }
}

pub struct FillNulls;

impl Operation for FillNulls {
    fn name(&self) -> &'static str {
        "fill_nulls"
    }

    fn stage(&self) -> Stage {
        Stage::Cleaning
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        let capture = match matchers::match_fill_null(instruction) {
            Some(c) => c,
            None => return Ok(Outcome::skipped("no fill-null directive")),
        };

        let mut exprs = Vec::new();
        for series in df.get_columns() {
            let name = series.name();
            if table::is_numeric(series) {
                let fill = if capture.use_mean {
                    col(name).mean()
                } else {
                    lit(0)
                };
                exprs.push(col(name).fill_null(fill).alias(name));
            } else if table::is_text(series) {
                exprs.push(col(name).fill_null(lit(UNKNOWN_TEXT)).alias(name));
            }
        }

        if exprs.is_empty() {
            return Ok(Outcome::skipped("no numeric or text columns"));
        }

        let filled = df.clone().lazy().with_columns(exprs).collect()?;
        Ok(Outcome::Applied(filled))
    }
}

/// Applies [`proper_case`] to every text column.
pub struct CleanText;

impl Operation for CleanText {
    fn name(&self) -> &'static str {
        "clean_text"
    }

    fn stage(&self) -> Stage {
        Stage::Cleaning
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        if !matchers::match_cleaning(instruction) {
            return Ok(Outcome::skipped("no cleaning directive"));
        }

        let columns = table::text_columns(df);
        if columns.is_empty() {
            return Ok(Outcome::skipped("no text columns"));
        }

        let mut result = df.clone();
        for name in &columns {
            let cleaned: Vec<Option<String>> = table::text_values(result.column(name)?)?
                .into_iter()
                .map(|v| v.map(|s| proper_case(&s)))
                .collect();
            result.with_column(Series::new(name, cleaned))?;
        }
        Ok(Outcome::Applied(result))
    }
}

pub struct ConvertCase;

impl Operation for ConvertCase {
    fn name(&self) -> &'static str {
        "convert_case"
    }

    fn stage(&self) -> Stage {
        Stage::Cleaning
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        let capture = match matchers::match_case(instruction) {
            Some(c) => c,
            None => return Ok(Outcome::skipped("no case directive")),
        };
        let column = match ColumnResolver::for_table(df).resolve_first(&capture.column) {
            Some(c) => c,
            None => return Ok(Outcome::skipped(format!("column '{}' not found", capture.column))),
        };

        let converted: Vec<Option<String>> = table::text_values(df.column(&column)?)?
            .into_iter()
            .map(|v| {
                v.map(|s| match capture.mode {
                    CaseMode::Upper => s.to_uppercase(),
                    CaseMode::Lower => s.to_lowercase(),
                })
            })
            .collect();
        Ok(Outcome::Applied(with_series(df, Series::new(&column, converted))?))
    }
}
