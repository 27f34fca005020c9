use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Polars error: {0}")]
    Polars(String),

    #[error("Transform error: {0}")]
    Transform(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<polars::error::PolarsError> for ForgeError {
    fn from(err: polars::error::PolarsError) -> Self {
        ForgeError::Polars(err.to_string())
    }
}

impl From<reqwest::Error> for ForgeError {
    fn from(err: reqwest::Error) -> Self {
        ForgeError::Llm(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;
