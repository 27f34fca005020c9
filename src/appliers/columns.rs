//! Column-ops stage: renames, full-name derivation and categorical binning.

use super::{has_column, with_new_series, with_series, Operation, Outcome, Stage};
use crate::error::Result;
use crate::matchers;
use crate::resolver::ColumnResolver;
use crate::table;
use crate::vocabulary::ColumnRole;
use polars::prelude::*;
use tracing::warn;

pub const FULL_NAME_COLUMN: &str = "full_name";
pub const PERFORMANCE_COLUMN: &str = "performance_category";
pub const STOCK_COLUMN: &str = "stock_category";

const LOW_STOCK_THRESHOLD: f64 = 100.0;

/// Bins (0, 3.5], (3.5, 4.0], (4.0, 5.0] with the lowest edge inclusive.
pub fn performance_label(value: f64) -> Option<&'static str> {
    if (0.0..=3.5).contains(&value) {
        Some("Needs Improvement")
    } else if value > 3.5 && value <= 4.0 {
        Some("Good")
    } else if value > 4.0 && value <= 5.0 {
        Some("Excellent")
    } else {
        None
    }
}

pub fn stock_label(value: f64) -> &'static str {
    if value < LOW_STOCK_THRESHOLD {
        "Low Stock"
    } else {
        "Normal Stock"
    }
}

pub struct RenameColumn;

impl Operation for RenameColumn {
    fn name(&self) -> &'static str {
        "rename_column"
    }

    fn stage(&self) -> Stage {
        Stage::ColumnOps
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        let capture = match matchers::match_rename(instruction) {
            Some(c) => c,
            None => return Ok(Outcome::skipped("no rename directive")),
        };
        let old = match ColumnResolver::for_table(df).resolve_first(&capture.from) {
            Some(c) => c,
            None => return Ok(Outcome::skipped(format!("column '{}' not found", capture.from))),
        };

        let new = table::normalize_name(&capture.to);
        if new == old {
            return Ok(Outcome::skipped("column already has that name"));
        }
        if df.get_column_names().iter().any(|c| *c == new) {
            warn!("Cannot rename '{}' to '{}': column already exists", old, new);
            return Ok(Outcome::skipped(format!("column '{}' already exists", new)));
        }

        let mut result = df.clone();
        result.rename(&old, &new)?;
        Ok(Outcome::Applied(result))
    }
}

/// `full_name` = first + " " + last; one missing side leaves the other alone.
pub struct FullName;

impl Operation for FullName {
    fn name(&self) -> &'static str {
        "full_name"
    }

    fn stage(&self) -> Stage {
        Stage::ColumnOps
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        if !matchers::match_full_name(instruction) {
            return Ok(Outcome::skipped("no full-name directive"));
        }

        let resolver = ColumnResolver::for_table(df);
        let (first, last) = match (
            resolver.resolve_role_first(ColumnRole::FirstName),
            resolver.resolve_role_first(ColumnRole::LastName),
        ) {
            (Some(f), Some(l)) if f != l => (f, l),
            _ => return Ok(Outcome::skipped("first/last name columns not found")),
        };

        let firsts = table::text_values(df.column(&first)?)?;
        let lasts = table::text_values(df.column(&last)?)?;
        let combined: Vec<Option<String>> = firsts
            .into_iter()
            .zip(lasts)
            .map(|pair| match pair {
                (Some(f), Some(l)) => Some(format!("{} {}", f.trim(), l.trim())),
                (Some(only), None) | (None, Some(only)) => Some(only.trim().to_string()),
                (None, None) => None,
            })
            .collect();

        with_new_series(df, Series::new(FULL_NAME_COLUMN, combined))
    }
}

pub struct CategoryBins;

impl CategoryBins {
    fn bin<F>(df: &DataFrame, column: &str, output: &str, label: F) -> Result<DataFrame>
    where
        F: Fn(f64) -> Option<&'static str>,
    {
        let labels: Vec<Option<&str>> = table::float_values(df.column(column)?)?
            .into_iter()
            .map(|v| v.and_then(&label))
            .collect();
        with_series(df, Series::new(output, labels))
    }
}

impl Operation for CategoryBins {
    fn name(&self) -> &'static str {
        "category_bins"
    }

    fn stage(&self) -> Stage {
        Stage::ColumnOps
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        let capture = match matchers::match_category(instruction) {
            Some(c) => c,
            None => return Ok(Outcome::skipped("no category directive")),
        };

        let mut result = df.clone();
        let mut binned = false;

        if capture.performance && !has_column(&result, PERFORMANCE_COLUMN) {
            let numeric = ColumnResolver::new(table::numeric_columns(&result));
            if let Some(column) = numeric.resolve_role_first(ColumnRole::Performance) {
                result = Self::bin(&result, &column, PERFORMANCE_COLUMN, performance_label)?;
                binned = true;
            }
        }

        if capture.inventory && !has_column(&result, STOCK_COLUMN) {
            let numeric = ColumnResolver::new(table::numeric_columns(&result));
            if let Some(column) = numeric.resolve_role_first(ColumnRole::Stock) {
                result = Self::bin(&result, &column, STOCK_COLUMN, |v| Some(stock_label(v)))?;
                binned = true;
            }
        }

        if binned {
            Ok(Outcome::Applied(result))
        } else {
            Ok(Outcome::skipped("no column to categorize"))
        }
    }
}
