//! Filtering stage: `filter <col> <op> <value>` predicates and the active-records shortcut.

use super::{Operation, Outcome, Stage};
use crate::error::Result;
use crate::matchers::{self, CompareOp};
use crate::resolver::ColumnResolver;
use crate::table;
use crate::vocabulary::ColumnRole;
use polars::prelude::*;
use tracing::warn;

/// Keep rows whose text value satisfies `keep`. Nulls are dropped.
fn filter_text<F>(df: &DataFrame, column: &str, keep: F) -> Result<DataFrame>
where
    F: Fn(&str) -> bool,
{
    let mask: Vec<bool> = table::text_values(df.column(column)?)?
        .iter()
        .map(|v| v.as_deref().map_or(false, |s| keep(s)))
        .collect();
    Ok(df.filter(&BooleanChunked::new("mask", mask.as_slice()))?)
}

fn numeric_predicate(column: &str, op: CompareOp, value: f64) -> Expr {
    let target = col(column).cast(DataType::Float64);
    match op {
        CompareOp::Gt => target.gt(lit(value)),
        CompareOp::Lt => target.lt(lit(value)),
        CompareOp::GtEq => target.gt_eq(lit(value)),
        CompareOp::LtEq => target.lt_eq(lit(value)),
        CompareOp::Eq => target.eq(lit(value)),
        CompareOp::NotEq => target.neq(lit(value)),
    }
}

/// Numeric columns compare numerically, everything else compares as lowercase text.
pub struct PredicateFilter;

impl Operation for PredicateFilter {
    fn name(&self) -> &'static str {
        "predicate_filter"
    }

    fn stage(&self) -> Stage {
        Stage::Filtering
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        let capture = match matchers::match_filter(instruction) {
            Some(c) => c,
            None => return Ok(Outcome::skipped("no filter directive")),
        };
        let op = match capture.op() {
            Some(op) => op,
            None => {
                warn!("Unsupported filter operator '{}'", capture.operator);
                return Ok(Outcome::skipped(format!(
                    "unsupported operator '{}'",
                    capture.operator
                )));
            }
        };
        let column = match ColumnResolver::for_table(df).resolve_first(&capture.column) {
            Some(c) => c,
            None => return Ok(Outcome::skipped(format!("column '{}' not found", capture.column))),
        };

        if table::is_numeric(df.column(&column)?) {
            let value: f64 = match capture.value.parse() {
                Ok(v) => v,
                Err(_) => {
                    warn!(
                        "Filter on numeric column '{}' with non-numeric value '{}' ignored",
                        column, capture.value
                    );
                    return Ok(Outcome::skipped("non-numeric literal for numeric column"));
                }
            };
            let filtered = df
                .clone()
                .lazy()
                .filter(numeric_predicate(&column, op, value))
                .collect()?;
            return Ok(Outcome::Applied(filtered));
        }

        let needle = capture.value.to_lowercase();
        let filtered = filter_text(df, &column, |v| {
            op.holds(v.to_lowercase().as_str(), needle.as_str())
        })?;
        Ok(Outcome::Applied(filtered))
    }
}

/// Keeps rows whose status column reads "active".
pub struct ActiveOnlyFilter;

impl Operation for ActiveOnlyFilter {
    fn name(&self) -> &'static str {
        "active_only_filter"
    }

    fn stage(&self) -> Stage {
        Stage::Filtering
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        if !matchers::match_active_only(instruction) {
            return Ok(Outcome::skipped("no active-only directive"));
        }
        let column = match ColumnResolver::for_table(df).resolve_role_first(ColumnRole::Status) {
            Some(c) => c,
            None => return Ok(Outcome::skipped("no status column")),
        };

        let filtered = filter_text(df, &column, |v| v.trim().eq_ignore_ascii_case("active"))?;
        Ok(Outcome::Applied(filtered))
    }
}
