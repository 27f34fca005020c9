//! Remediation suggestions for pipeline errors.
//!
//! The table pipeline never calls into this module. Callers pick a `FixSuggester` and pass it
//! where suggestions are wanted; `NoopSuggester` is used whenever no API key is configured.

use crate::config::Settings;
use crate::error::{ForgeError, Result};
use async_trait::async_trait;
use tracing::{info, warn};

pub const UNAVAILABLE_MESSAGE: &str = "AI suggestions unavailable: no API key configured";

const SYSTEM_PROMPT: &str = "You are an ETL assistant.";
const MAX_TOKENS: u32 = 100;

#[async_trait]
pub trait FixSuggester: Send + Sync {
    fn is_available(&self) -> bool;

    /// Never fails; problems talking to the backend are reported in the returned text.
    async fn suggest(&self, error: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSuggester;

#[async_trait]
impl FixSuggester for NoopSuggester {
    fn is_available(&self) -> bool {
        false
    }

    async fn suggest(&self, _error: &str) -> String {
        UNAVAILABLE_MESSAGE.to_string()
    }
}

/// Chat-completions client for any OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiSuggester {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiSuggester {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn call_llm(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "max_tokens": MAX_TOKENS,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ForgeError::Llm(format!(
                "LLM API error ({}): {}",
                status, error_text
            )));
        }

        let response_json: serde_json::Value = response.json().await?;
        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ForgeError::Llm("No content in LLM response".to_string()))?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl FixSuggester for OpenAiSuggester {
    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn suggest(&self, error: &str) -> String {
        let prompt = format!("Fix suggestion for error: {}", error);
        match self.call_llm(&prompt).await {
            Ok(suggestion) => {
                info!("Received fix suggestion ({} chars)", suggestion.len());
                suggestion
            }
            Err(e) => {
                warn!("Fix suggestion request failed: {}", e);
                format!("Failed to generate fix: {}", e)
            }
        }
    }
}

/// The OpenAI-backed suggester when an API key is configured, otherwise the no-op one.
pub fn from_settings(settings: &Settings) -> Box<dyn FixSuggester> {
    match &settings.openai_api_key {
        Some(key) => Box::new(OpenAiSuggester::new(
            key.clone(),
            settings.openai_model.clone(),
            settings.openai_base_url.clone(),
        )),
        None => Box::new(NoopSuggester),
    }
}
