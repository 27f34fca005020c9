//! Sorting stage.

use super::{Operation, Outcome, Stage};
use crate::error::Result;
use crate::matchers;
use crate::resolver::ColumnResolver;
use polars::prelude::*;

/// Stable sort, nulls last. Ascending unless the instruction says desc/descending.
pub struct SortRows;

impl Operation for SortRows {
    fn name(&self) -> &'static str {
        "sort_rows"
    }

    fn stage(&self) -> Stage {
        Stage::Sorting
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        let capture = match matchers::match_sort(instruction) {
            Some(c) => c,
            None => return Ok(Outcome::skipped("no sort directive")),
        };
        let column = match ColumnResolver::for_table(df).resolve_first(&capture.column) {
            Some(c) => c,
            None => return Ok(Outcome::skipped(format!("column '{}' not found", capture.column))),
        };

        let options = SortMultipleOptions::default()
            .with_order_descending(capture.descending)
            .with_nulls_last(true)
            .with_maintain_order(true);
        let sorted = df.sort([column.as_str()], options)?;
        Ok(Outcome::Applied(sorted))
    }
}
