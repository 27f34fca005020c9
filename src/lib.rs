//! etl-forge: free-text workflow descriptions to table operations.
//!
//! `transform` runs the fixed-order operation pipeline over a table, `describe` renders the
//! workflow configuration document and `diagram` the linear step graph. All three are pure and
//! never fail.

pub mod appliers;
pub mod assistant;
pub mod config;
pub mod error;
pub mod ingest;
pub mod matchers;
pub mod pipeline;
pub mod resolver;
pub mod table;
pub mod vocabulary;
pub mod workflow;

pub use appliers::{Operation, Outcome, Stage};
pub use assistant::{FixSuggester, NoopSuggester, OpenAiSuggester};
pub use config::Settings;
pub use error::{ForgeError, Result};
pub use pipeline::{Pipeline, StageReport, TransformReport};
pub use workflow::{OutputFormat, StepAction, WorkflowDocument, WorkflowStep};

use lazy_static::lazy_static;
use polars::prelude::DataFrame;

lazy_static! {
    static ref STANDARD_PIPELINE: Pipeline = Pipeline::standard();
}

/// Apply every operation recognized in `instruction` to a copy of `df`.
pub fn transform(df: &DataFrame, instruction: &str) -> DataFrame {
    STANDARD_PIPELINE.run(df, instruction)
}

/// Like [`transform`], also reporting what each stage did.
pub fn transform_with_report(df: &DataFrame, instruction: &str) -> (DataFrame, TransformReport) {
    STANDARD_PIPELINE.run_with_report(df, instruction)
}

pub fn describe(instruction: &str, format: OutputFormat) -> String {
    workflow::describe(instruction, format)
}

pub fn diagram(instruction: &str) -> String {
    workflow::diagram(instruction)
}
