//! Pipeline Orchestrator
//!
//! Runs the registered operations over a table in a fixed stage order:
//!
//! Clean-Names -> Math-Derive -> Cleaning -> Filtering -> Column-Ops -> Date-Ops -> Grouping
//! -> Sorting -> Reset-Index
//!
//! Every stage starts from the previous stage's table and produces a new one. When an operation
//! inside a stage fails, the stage is rolled back to its input and the pipeline moves on, so a
//! partially applied stage is never visible in the result. A panic anywhere in the stages returns
//! the input table (with normalized column names).

use crate::appliers::cleaning::{CleanText, ConvertCase, DropNulls, FillNulls};
use crate::appliers::columns::{CategoryBins, FullName, RenameColumn};
use crate::appliers::dates::{AddTimestamp, ConvertDates};
use crate::appliers::derive::{ArithmeticDerive, MeanDerive, RevenueDerive, SumDerive};
use crate::appliers::filtering::{ActiveOnlyFilter, PredicateFilter};
use crate::appliers::grouping::GroupAggregate;
use crate::appliers::sorting::SortRows;
use crate::appliers::{Operation, Outcome, Stage};
use crate::table;
use polars::prelude::*;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

/// What happened in one stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub applied: Vec<&'static str>,
    pub skipped: Vec<(&'static str, String)>,
    pub rolled_back: bool,
    pub error: Option<String>,
}

impl StageReport {
    fn new(stage: Stage) -> Self {
        Self {
            stage,
            applied: Vec::new(),
            skipped: Vec::new(),
            rolled_back: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TransformReport {
    pub stages: Vec<StageReport>,
    /// Set when the run panicked and the input table was returned.
    pub fell_back: bool,
}

impl TransformReport {
    /// Names of every operation that changed the table, in the order they ran.
    pub fn applied(&self) -> Vec<&'static str> {
        self.stages
            .iter()
            .flat_map(|s| s.applied.iter().copied())
            .collect()
    }

    pub fn rolled_back_stages(&self) -> Vec<Stage> {
        self.stages
            .iter()
            .filter(|s| s.rolled_back)
            .map(|s| s.stage)
            .collect()
    }
}

pub struct Pipeline {
    operations: Vec<Box<dyn Operation>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl Pipeline {
    pub fn new(operations: Vec<Box<dyn Operation>>) -> Self {
        Self { operations }
    }

    /// The full operation catalog in priority order.
    pub fn standard() -> Self {
        let operations: Vec<Box<dyn Operation>> = vec![
            // Math-Derive
            Box::new(SumDerive),
            Box::new(MeanDerive),
            Box::new(RevenueDerive),
            Box::new(ArithmeticDerive),
            // Cleaning
            Box::new(DropNulls),
            Box::new(FillNulls),
            Box::new(CleanText),
            Box::new(ConvertCase),
            // Filtering
            Box::new(PredicateFilter),
            Box::new(ActiveOnlyFilter),
            // Column-Ops
            Box::new(RenameColumn),
            Box::new(FullName),
            Box::new(CategoryBins),
            // Date-Ops
            Box::new(ConvertDates),
            Box::new(AddTimestamp),
            // Grouping
            Box::new(GroupAggregate),
            // Sorting
            Box::new(SortRows),
        ];
        Self::new(operations)
    }

    pub fn operations(&self) -> impl Iterator<Item = &dyn Operation> {
        self.operations.iter().map(|op| op.as_ref())
    }

    pub fn run(&self, df: &DataFrame, instruction: &str) -> DataFrame {
        self.run_with_report(df, instruction).0
    }

    pub fn run_with_report(&self, df: &DataFrame, instruction: &str) -> (DataFrame, TransformReport) {
        let mut report = TransformReport::default();

        if df.height() == 0 || df.width() == 0 {
            debug!("Empty input table, nothing to transform");
            return (DataFrame::empty(), report);
        }

        // Clean-Names
        let mut clean_names = StageReport::new(Stage::CleanNames);
        let normalized = match table::normalize_column_names(df) {
            Ok(normalized) => {
                clean_names.applied.push("normalize_column_names");
                normalized
            }
            Err(e) => {
                error!("Column name normalization failed: {}", e);
                clean_names.rolled_back = true;
                clean_names.error = Some(e.to_string());
                df.clone()
            }
        };
        report.stages.push(clean_names);

        let instruction = instruction.to_lowercase();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_stages(&normalized, &instruction)
        }));

        match result {
            Ok((table, stages)) => {
                report.stages.extend(stages);
                info!(
                    "Transformed table: {} rows x {} columns -> {} rows x {} columns",
                    df.height(),
                    df.width(),
                    table.height(),
                    table.width()
                );
                (table, report)
            }
            Err(_) => {
                error!("Transformation panicked, returning the untransformed table");
                report.fell_back = true;
                (normalized, report)
            }
        }
    }

    fn run_stages(&self, input: &DataFrame, instruction: &str) -> (DataFrame, Vec<StageReport>) {
        let mut current = input.clone();
        let mut reports = Vec::new();

        for stage in Stage::OPERATION_STAGES {
            let (next, stage_report) = self.run_stage(stage, &current, instruction);
            current = next;
            reports.push(stage_report);
        }

        // Reset-Index: frames have no row index; compact into contiguous columns instead.
        current.as_single_chunk();
        let mut reset = StageReport::new(Stage::ResetIndex);
        reset.applied.push("as_single_chunk");
        reports.push(reset);

        (current, reports)
    }

    fn run_stage(&self, stage: Stage, input: &DataFrame, instruction: &str) -> (DataFrame, StageReport) {
        let mut report = StageReport::new(stage);
        let mut working = input.clone();

        for op in self.operations.iter().filter(|op| op.stage() == stage) {
            match op.apply(&working, instruction) {
                Ok(Outcome::Applied(next)) => {
                    info!("{:?}: applied {}", stage, op.name());
                    report.applied.push(op.name());
                    working = next;
                }
                Ok(Outcome::Skipped(reason)) => {
                    debug!("{:?}: skipped {} ({})", stage, op.name(), reason);
                    report.skipped.push((op.name(), reason));
                }
                Err(e) => {
                    error!("{:?}: {} failed, rolling back stage: {}", stage, op.name(), e);
                    report.rolled_back = true;
                    report.applied.clear();
                    report.error = Some(format!("{}: {}", op.name(), e));
                    return (input.clone(), report);
                }
            }
        }

        if !table::is_consistent(&working) {
            warn!("{:?}: produced columns of unequal length, rolling back stage", stage);
            report.rolled_back = true;
            report.applied.clear();
            report.error = Some("inconsistent column lengths".to_string());
            return (input.clone(), report);
        }

        (working, report)
    }
}
