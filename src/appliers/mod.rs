//! Operation appliers.
//!
//! Each applier pairs one recognizer from [`crate::matchers`] with the table mutation it implies.
//! An applier re-runs its matcher on the instruction, resolves the columns it needs and returns
//! either a fresh table or the reason it did nothing. Returning `Err` means something
//! unexpected went wrong; the pipeline rolls the whole stage back in that case.

pub mod cleaning;
pub mod columns;
pub mod dates;
pub mod derive;
pub mod filtering;
pub mod grouping;
pub mod sorting;

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    CleanNames,
    MathDerive,
    Cleaning,
    Filtering,
    ColumnOps,
    DateOps,
    Grouping,
    Sorting,
    ResetIndex,
}

impl Stage {
    /// Stages that run registered operations, in order. `CleanNames` and `ResetIndex` are
    /// handled by the pipeline itself.
    pub const OPERATION_STAGES: [Stage; 7] = [
        Stage::MathDerive,
        Stage::Cleaning,
        Stage::Filtering,
        Stage::ColumnOps,
        Stage::DateOps,
        Stage::Grouping,
        Stage::Sorting,
    ];
}

/// Result of a single applier.
#[derive(Debug, Clone)]
pub enum Outcome {
    Applied(DataFrame),
    Skipped(String),
}

impl Outcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Outcome::Skipped(reason.into())
    }
}

/// Recognizer + applier for one instruction category.
pub trait Operation: Send + Sync {
    fn name(&self) -> &'static str;

    fn stage(&self) -> Stage;

    /// Apply to `df` given the lowercased instruction. `df` is never modified.
    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome>;
}

/// Returns a copy of `df` with `series` added, or replacing the column of the same name.
pub(crate) fn with_series(df: &DataFrame, series: Series) -> Result<DataFrame> {
    let mut result = df.clone();
    result.with_column(series)?;
    Ok(result)
}

pub(crate) fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| *c == name)
}

/// Adds a derived column. Never overwrites: when `series` is named after an existing column the
/// table is left alone and the derive is skipped.
pub(crate) fn with_new_series(df: &DataFrame, series: Series) -> Result<Outcome> {
    if has_column(df, series.name()) {
        debug!("Column '{}' already exists, not deriving it", series.name());
        return Ok(Outcome::skipped(format!(
            "column '{}' already exists",
            series.name()
        )));
    }
    Ok(Outcome::Applied(with_series(df, series)?))
}
