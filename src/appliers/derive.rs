//! Math-derive stage: row-wise sum/mean, revenue and explicit `calculate x = a op b` columns.

use super::{with_new_series, with_series, Operation, Outcome, Stage};
use crate::error::Result;
use crate::matchers::{self, ArithmeticOp};
use crate::resolver::ColumnResolver;
use crate::table;
use crate::vocabulary::ColumnRole;
use polars::prelude::*;
use tracing::warn;

pub const SUM_COLUMN: &str = "total";
pub const MEAN_COLUMN: &str = "average";
pub const REVENUE_COLUMN: &str = "revenue";

/// Reduce the given numeric columns row by row. `reduce` only sees the non-null values.
fn row_wise<F>(df: &DataFrame, columns: &[String], reduce: F) -> Result<Vec<Option<f64>>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let values = columns
        .iter()
        .map(|name| table::float_values(df.column(name)?))
        .collect::<Result<Vec<_>>>()?;

    Ok((0..df.height())
        .map(|row| {
            let present: Vec<f64> = values.iter().filter_map(|column| column[row]).collect();
            reduce(&present)
        })
        .collect())
}

/// Element-wise `left op right`; nulls and division by zero give null.
fn combine(df: &DataFrame, left: &str, right: &str, op: ArithmeticOp) -> Result<Vec<Option<f64>>> {
    let lhs = table::float_values(df.column(left)?)?;
    let rhs = table::float_values(df.column(right)?)?;
    Ok(lhs
        .into_iter()
        .zip(rhs)
        .map(|pair| match pair {
            (Some(a), Some(b)) => op.apply(a, b),
            _ => None,
        })
        .collect())
}

pub struct SumDerive;

impl Operation for SumDerive {
    fn name(&self) -> &'static str {
        "sum_derive"
    }

    fn stage(&self) -> Stage {
        Stage::MathDerive
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        if !matchers::match_sum_derive(instruction) {
            return Ok(Outcome::skipped("no sum directive"));
        }

        let numeric = table::numeric_columns(df);
        match numeric.len() {
            0 => Ok(Outcome::skipped("no numeric columns")),
            1 => {
                let mut copy = df.column(&numeric[0])?.clone();
                copy.rename(SUM_COLUMN);
                with_new_series(df, copy)
            }
            _ => {
                let sums = row_wise(df, &numeric, |values| Some(values.iter().sum()))?;
                with_new_series(df, Series::new(SUM_COLUMN, sums))
            }
        }
    }
}

pub struct MeanDerive;

impl Operation for MeanDerive {
    fn name(&self) -> &'static str {
        "mean_derive"
    }

    fn stage(&self) -> Stage {
        Stage::MathDerive
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        if !matchers::match_mean_derive(instruction) {
            return Ok(Outcome::skipped("no mean directive"));
        }

        let numeric = table::numeric_columns(df);
        if numeric.len() < 2 {
            return Ok(Outcome::skipped("mean needs at least two numeric columns"));
        }

        let means = row_wise(df, &numeric, |values| {
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        })?;
        with_new_series(df, Series::new(MEAN_COLUMN, means))
    }
}

/// Multiplies the first quantity-like column by the first price-like column.
pub struct RevenueDerive;

impl Operation for RevenueDerive {
    fn name(&self) -> &'static str {
        "revenue_derive"
    }

    fn stage(&self) -> Stage {
        Stage::MathDerive
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        if !matchers::match_revenue_derive(instruction) {
            return Ok(Outcome::skipped("no revenue directive"));
        }

        let numeric = table::numeric_columns(df);
        let resolver = ColumnResolver::new(numeric);

        let quantity = match resolver.resolve_role_first(ColumnRole::Quantity) {
            Some(c) => c,
            None => return Ok(Outcome::skipped("no quantity column")),
        };
        let price = match resolver
            .resolve_role(ColumnRole::Price)
            .into_iter()
            .find(|c| *c != quantity)
        {
            Some(c) => c,
            None => return Ok(Outcome::skipped("no price column")),
        };

        let revenue = combine(df, &quantity, &price, ArithmeticOp::Multiply)?;
        with_new_series(df, Series::new(REVENUE_COLUMN, revenue))
    }
}

pub struct ArithmeticDerive;

impl Operation for ArithmeticDerive {
    fn name(&self) -> &'static str {
        "arithmetic_derive"
    }

    fn stage(&self) -> Stage {
        Stage::MathDerive
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        let capture = match matchers::match_arithmetic(instruction) {
            Some(c) => c,
            None => return Ok(Outcome::skipped("no calculate directive")),
        };

        let resolver = ColumnResolver::for_table(df);
        let (left, right) = match (
            resolver.resolve_first(&capture.left),
            resolver.resolve_first(&capture.right),
        ) {
            (Some(l), Some(r)) => (l, r),
            _ => return Ok(Outcome::skipped("operand column not found")),
        };

        for operand in [&left, &right] {
            if !table::is_numeric(df.column(operand)?) {
                warn!(
                    "Cannot calculate '{}': column '{}' is not numeric",
                    capture.target, operand
                );
                return Ok(Outcome::skipped(format!("column '{}' is not numeric", operand)));
            }
        }

        let target = table::normalize_name(&capture.target);
        let values = combine(df, &left, &right, capture.op)?;
        Ok(Outcome::Applied(with_series(df, Series::new(&target, values))?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applied(outcome: Outcome) -> DataFrame {
        match outcome {
            Outcome::Applied(df) => df,
            Outcome::Skipped(reason) => panic!("expected applied, skipped: {}", reason),
        }
    }

    fn floats(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        table::float_values(df.column(name).unwrap()).unwrap()
    }

    #[test]
    fn test_sum_derive_across_numeric_columns() {
        let df = df! [
            "name" => ["a", "b"],
            "q1" => [Some(1.0), None],
            "q2" => [Some(2i64), Some(5)]
        ]
        .unwrap();
        let out = applied(SumDerive.apply(&df, "show the total").unwrap());
        assert_eq!(floats(&out, "total"), vec![Some(3.0), Some(5.0)]);
    }

    #[test]
    fn test_sum_derive_single_column_is_copy() {
        let df = df! [
            "name" => ["a", "b"],
            "q1" => [Some(1.0), None]
        ]
        .unwrap();
        let out = applied(SumDerive.apply(&df, "sum it").unwrap());
        assert_eq!(floats(&out, "total"), vec![Some(1.0), None]);
    }

    #[test]
    fn test_existing_output_columns_are_never_overwritten() {
        let df = df! [
            "region" => ["a", "b"],
            "total" => [5.0, 9.0],
            "average" => [1.0, 2.0],
            "qty" => [100i64, 0],
            "price" => [2.0, 3.0],
            "revenue" => [7.0, 8.0]
        ]
        .unwrap();
        for outcome in [
            SumDerive.apply(&df, "add the total").unwrap(),
            MeanDerive.apply(&df, "add the average").unwrap(),
            RevenueDerive.apply(&df, "compute revenue").unwrap(),
        ] {
            assert!(matches!(outcome, Outcome::Skipped(_)));
        }
    }

    #[test]
    fn test_mean_derive_needs_two_columns() {
        let df = df! [
            "q1" => [1.0, 3.0]
        ]
        .unwrap();
        assert!(matches!(
            MeanDerive.apply(&df, "average").unwrap(),
            Outcome::Skipped(_)
        ));

        let df = df! [
            "q1" => [1.0, 3.0],
            "q2" => [3.0, 5.0]
        ]
        .unwrap();
        let out = applied(MeanDerive.apply(&df, "avg please").unwrap());
        assert_eq!(floats(&out, "average"), vec![Some(2.0), Some(4.0)]);
    }

    #[test]
    fn test_revenue_derive() {
        let df = df! [
            "units" => [2i64, 3],
            "unit_price" => [1.5, 2.0]
        ]
        .unwrap();
        let out = applied(RevenueDerive.apply(&df, "compute revenue").unwrap());
        assert_eq!(floats(&out, "revenue"), vec![Some(3.0), Some(6.0)]);
    }

    #[test]
    fn test_arithmetic_division_by_zero_is_null() {
        let df = df! [
            "amount" => [10.0, 4.0],
            "parts" => [2.0, 0.0]
        ]
        .unwrap();
        let out = applied(
            ArithmeticDerive
                .apply(&df, "calculate share = amount / parts")
                .unwrap(),
        );
        assert_eq!(floats(&out, "share"), vec![Some(5.0), None]);
    }

    #[test]
    fn test_arithmetic_requires_numeric_operands() {
        let df = df! [
            "price" => ["cheap", "dear"],
            "qty" => [1i64, 2]
        ]
        .unwrap();
        assert!(matches!(
            ArithmeticDerive
                .apply(&df, "calculate total = price * qty")
                .unwrap(),
            Outcome::Skipped(_)
        ));
    }
}
