///! Config/DAG Generator
///!
///! Turns an instruction into an ordered list of workflow steps by splitting on delimiter words,
///! classifies each step as extract / transform / load, and renders the result either as a
///! structured document (JSON or YAML) or as a linear `graph TD` diagram.
///!
///! The steps produced here are independent of the table pipeline.

use crate::error::{ForgeError, Result};
use crate::vocabulary::{EXTRACT_KEYWORDS, LOAD_KEYWORDS, TRANSFORM_KEYWORDS};
use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_WORKFLOW_NAME: &str = "Generated Workflow";
pub const DOCUMENT_VERSION: &str = "1.0";

lazy_static! {
    static ref WORKFLOW_NAME: Regex =
        Regex::new(r"(?i)^\s*workflow\s+(.+?)\s*(?:\bthen\b|,|$)").expect("valid regex");
    static ref STEP_DELIMITER: Regex = Regex::new(
        r"(?i),|\bthen\b|\band\b|\bnext\b|\bafter\b|\bfollowed\s+by\b|\bto\b"
    )
    .expect("valid regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(ForgeError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    Extract,
    Transform,
    Load,
    Unknown,
}

impl StepAction {
    /// First matching keyword group wins: extract, then transform, then load.
    pub fn classify(step: &str) -> Self {
        let step = step.to_lowercase();
        let contains_any = |words: &[&str]| words.iter().any(|w| step.contains(w));
        if contains_any(EXTRACT_KEYWORDS) {
            StepAction::Extract
        } else if contains_any(TRANSFORM_KEYWORDS) {
            StepAction::Transform
        } else if contains_any(LOAD_KEYWORDS) {
            StepAction::Load
        } else {
            StepAction::Unknown
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: usize,
    pub description: String,
    pub action: StepAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub description: String,
    pub steps: Vec<WorkflowStep>,
    pub created: String,
    pub version: String,
}

/// Top-level configuration document: `{ "workflow": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub workflow: Workflow,
}

/// Split off a leading `workflow <name> then|,` prefix.
///
/// Returns the workflow name (or the default) and the part of the instruction that holds the
/// steps.
pub fn extract_name(instruction: &str) -> (String, &str) {
    match WORKFLOW_NAME.captures(instruction) {
        Some(caps) => {
            let name = caps[1].trim().to_string();
            let end = caps.get(0).map_or(instruction.len(), |m| m.end());
            (name, &instruction[end..])
        }
        None => (DEFAULT_WORKFLOW_NAME.to_string(), instruction),
    }
}

/// Non-empty, trimmed fragments between delimiters.
pub fn split_steps(text: &str) -> Vec<String> {
    STEP_DELIMITER
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ordered steps with ids starting at 1.
pub fn steps(instruction: &str) -> Vec<WorkflowStep> {
    let (_, body) = extract_name(instruction);
    split_steps(body)
        .into_iter()
        .enumerate()
        .map(|(idx, description)| WorkflowStep {
            id: idx + 1,
            action: StepAction::classify(&description),
            description,
        })
        .collect()
}

impl WorkflowDocument {
    pub fn from_instruction(instruction: &str) -> Self {
        let (name, _) = extract_name(instruction);
        Self {
            workflow: Workflow {
                name,
                description: instruction.to_string(),
                steps: steps(instruction),
                created: Utc::now()
                    .naive_utc()
                    .format("%Y-%m-%dT%H:%M:%S%.6f")
                    .to_string(),
                version: DOCUMENT_VERSION.to_string(),
            },
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(self)?),
        }
    }
}

/// Serialized workflow document for `instruction`.
pub fn describe(instruction: &str, format: OutputFormat) -> String {
    WorkflowDocument::from_instruction(instruction)
        .render(format)
        .unwrap_or_else(|e| {
            warn!("Failed to render workflow document as {}: {}", format, e);
            String::new()
        })
}

fn node_label(description: &str) -> String {
    description
        .chars()
        .map(|c| match c {
            '[' | ']' | ';' | '\n' | '\r' => ' ',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Linear `graph TD` chain: Start -> Step1 -> ... -> StepN -> Finish.
pub fn diagram(instruction: &str) -> String {
    let steps = steps(instruction);
    let mut lines = vec!["graph TD".to_string()];

    match steps.first() {
        Some(first) => lines.push(format!("    Start-->Step{};", first.id)),
        None => lines.push("    Start-->Finish;".to_string()),
    }

    for (idx, step) in steps.iter().enumerate() {
        lines.push(format!("    Step{}[{}];", step.id, node_label(&step.description)));
        match steps.get(idx + 1) {
            Some(next) => lines.push(format!("    Step{}-->Step{};", step.id, next.id)),
            None => lines.push(format!("    Step{}-->Finish;", step.id)),
        }
    }

    lines.push("    Finish[Finish];".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALES: &str = "workflow Sales Report then extract then clean then load";

    #[test]
    fn test_named_workflow() {
        let doc = WorkflowDocument::from_instruction(SALES);
        assert_eq!(doc.workflow.name, "Sales Report");
        assert_eq!(doc.workflow.description, SALES);
        assert_eq!(doc.workflow.version, "1.0");
        let actions: Vec<StepAction> = doc.workflow.steps.iter().map(|s| s.action).collect();
        assert_eq!(
            actions,
            vec![StepAction::Extract, StepAction::Transform, StepAction::Load]
        );
        let ids: Vec<usize> = doc.workflow.steps.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_default_name_and_delimiters() {
        let (name, body) = extract_name("read orders, filter rows and save");
        assert_eq!(name, DEFAULT_WORKFLOW_NAME);
        assert_eq!(body, "read orders, filter rows and save");
        assert_eq!(
            split_steps("read orders, filter rows and save followed by export"),
            vec!["read orders", "filter rows", "save", "export"]
        );
        // delimiters only count as whole words
        assert_eq!(split_steps("store totals"), vec!["store totals"]);
        assert!(split_steps("").is_empty());
        assert!(split_steps(" , then and ").is_empty());
    }

    #[test]
    fn test_classification_priority() {
        assert_eq!(StepAction::classify("Fetch and clean"), StepAction::Extract);
        assert_eq!(StepAction::classify("aggregate sales"), StepAction::Transform);
        assert_eq!(StepAction::classify("write parquet"), StepAction::Load);
        assert_eq!(StepAction::classify("celebrate"), StepAction::Unknown);
    }

    #[test]
    fn test_json_round_trip() {
        let json = describe("extract orders then clean then load warehouse", OutputFormat::Json);
        let parsed: WorkflowDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.workflow.steps.len(), 3);
        assert_eq!(parsed.workflow.name, DEFAULT_WORKFLOW_NAME);
    }

    #[test]
    fn test_yaml_render() {
        let yaml = describe(SALES, OutputFormat::Yaml);
        let parsed: WorkflowDocument = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.workflow.steps[2].action, StepAction::Load);
        assert!(yaml.contains("action: extract"));
    }

    #[test]
    fn test_diagram_chain() {
        let expected = "graph TD\n    Start-->Step1;\n    Step1[extract];\n    Step1-->Step2;\n    Step2[clean];\n    Step2-->Step3;\n    Step3[load];\n    Step3-->Finish;\n    Finish[Finish];";
        assert_eq!(diagram(SALES), expected);
    }

    #[test]
    fn test_diagram_empty_instruction() {
        assert_eq!(diagram(""), "graph TD\n    Start-->Finish;\n    Finish[Finish];");
        assert!(describe("", OutputFormat::Json).contains("Generated Workflow"));
    }

    #[test]
    fn test_diagram_labels_keep_grammar() {
        let out = diagram("load [raw]; data");
        assert!(out.contains("Step1[load  raw   data];"));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("yml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
