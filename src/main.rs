use etl_forge::{assistant, ingest, table, OutputFormat, Settings};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use polars::prelude::DataFrame;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "etl-forge")]
#[command(about = "Turn a plain-language workflow description into an ETL config, a DAG and a transformed table")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the workflow config and DAG, and transform an optional CSV file
    Generate {
        /// Workflow description in natural language
        #[arg(short, long)]
        prompt: String,

        /// CSV file to transform
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Config document format: json or yaml
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// Ask the assistant how to fix an error message
    Fix {
        /// The error message
        error: String,

        /// OpenAI API key (or set OPENAI_API_KEY env var)
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // stdout carries the JSON result, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Generate { prompt, file, format } => generate(prompt, file, format),
        Commands::Fix { error, api_key } => fix(error, api_key).await,
    }
}

fn load_table(path: &PathBuf) -> Result<DataFrame> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let df = ingest::read_table(&bytes, file_name)?;
    Ok(df)
}

fn generate(prompt: String, file: Option<PathBuf>, format: String) -> Result<()> {
    let format: OutputFormat = format.parse()?;

    let transformed = match &file {
        Some(path) => {
            let df = load_table(path)?;
            let (out, report) = etl_forge::transform_with_report(&df, &prompt);
            info!("Applied operations: {:?}", report.applied());
            table::to_records(&out)
        }
        None => serde_json::Value::Array(Vec::new()),
    };

    let response = serde_json::json!({
        "config": etl_forge::describe(&prompt, format),
        "dag": etl_forge::diagram(&prompt),
        "transformed_data": transformed,
    });
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn fix(error: String, api_key: Option<String>) -> Result<()> {
    let settings = Settings::from_env().with_api_key(api_key);
    let suggester = assistant::from_settings(&settings);
    if !suggester.is_available() {
        info!("No API key configured, using the offline suggester");
    }

    let suggestion = suggester.suggest(&error).await;
    let response = serde_json::json!({ "fix_suggestion": suggestion });
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
