//! Grouping stage: `group by <col>` with one aggregate, or a per-group row count.

use super::{Operation, Outcome, Stage};
use crate::error::Result;
use crate::matchers::{self, AggFunction};
use crate::resolver::ColumnResolver;
use crate::table;
use polars::prelude::*;
use tracing::warn;

pub const COUNT_COLUMN: &str = "count";

fn aggregate_expr(func: AggFunction, column: &str) -> Expr {
    let alias = format!("{}_{}", func.name(), column);
    let expr = match func {
        AggFunction::Sum => col(column).sum(),
        AggFunction::Mean => col(column).mean(),
        AggFunction::Count => col(column).count(),
        AggFunction::Max => col(column).max(),
        AggFunction::Min => col(column).min(),
    };
    expr.alias(&alias)
}

/// `group by <col> [fn <col>]`. Groups keep the order in which they first appear.
pub struct GroupAggregate;

impl Operation for GroupAggregate {
    fn name(&self) -> &'static str {
        "group_aggregate"
    }

    fn stage(&self) -> Stage {
        Stage::Grouping
    }

    fn apply(&self, df: &DataFrame, instruction: &str) -> Result<Outcome> {
        let capture = match matchers::match_group(instruction) {
            Some(c) => c,
            None => return Ok(Outcome::skipped("no group directive")),
        };
        let resolver = ColumnResolver::for_table(df);
        let group = match resolver.resolve_first(&capture.group) {
            Some(c) => c,
            None => return Ok(Outcome::skipped(format!("column '{}' not found", capture.group))),
        };

        let agg = match &capture.aggregate {
            None => len().alias(COUNT_COLUMN),
            Some((func, token)) => {
                let column = match resolver.resolve_first(token) {
                    Some(c) => c,
                    None => return Ok(Outcome::skipped(format!("column '{}' not found", token))),
                };
                if column == group {
                    return Ok(Outcome::skipped("cannot aggregate the grouping column"));
                }
                let numeric_only = matches!(func, AggFunction::Sum | AggFunction::Mean);
                if numeric_only && !table::is_numeric(df.column(&column)?) {
                    warn!(
                        "Cannot {} non-numeric column '{}', grouping ignored",
                        func.name(),
                        column
                    );
                    return Ok(Outcome::skipped(format!("column '{}' is not numeric", column)));
                }
                aggregate_expr(*func, &column)
            }
        };

        let grouped = df
            .clone()
            .lazy()
            .group_by_stable([col(&group)])
            .agg([agg])
            .collect()?;
        Ok(Outcome::Applied(grouped))
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

    fn staff() -> DataFrame {
        df! [
            "department" => ["eng", "ops", "eng"],
            "salary" => [100.0, 50.0, 120.0]
        ]
        .unwrap()
    }

    #[test]
    fn test_group_sum() {
        let out = applied(
            GroupAggregate
                .apply(&staff(), "group by department and sum salary")
                .unwrap(),
        );
        assert_eq!(out.get_column_names(), vec!["department", "sum_salary"]);
        assert_eq!(
            table::text_values(out.column("department").unwrap()).unwrap(),
            vec![Some("eng".to_string()), Some("ops".to_string())]
        );
        assert_eq!(
            table::float_values(out.column("sum_salary").unwrap()).unwrap(),
            vec![Some(220.0), Some(50.0)]
        );
    }

    #[test]
    fn test_group_average_maps_to_mean() {
        let out = applied(
            GroupAggregate
                .apply(&staff(), "group by department average salary")
                .unwrap(),
        );
        assert_eq!(
            table::float_values(out.column("mean_salary").unwrap()).unwrap(),
            vec![Some(110.0), Some(50.0)]
        );
    }

    #[test]
    fn test_group_only_counts_rows() {
        let out = applied(GroupAggregate.apply(&staff(), "group by department").unwrap());
        assert_eq!(
            table::float_values(out.column(COUNT_COLUMN).unwrap()).unwrap(),
            vec![Some(2.0), Some(1.0)]
        );
    }

    #[test]
    fn test_unresolved_aggregate_column_is_skipped() {
        assert!(matches!(
            GroupAggregate
                .apply(&staff(), "group by department and sum bonus")
                .unwrap(),
            Outcome::Skipped(_)
        ));
    }
}
