use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MODEL: &str = "gemini-2.0-flash";

static MARKUP_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*#_]{2,}").expect("static markup regex"));
static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("static newline regex"));

/// Deterministic cleanup applied to every generator response before it
/// reaches callers: strip runs of emphasis/heading markup, collapse 3+
/// newlines to 2, trim.
pub fn clean_generated_text(text: &str) -> String {
    let stripped = MARKUP_RUNS.replace_all(text, "");
    let collapsed = EXCESS_NEWLINES.replace_all(&stripped, "\n\n");
    collapsed.trim().to_string()
}

/// External text-generation boundary.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Sends a prompt and returns the cleaned response text. Fails with
    /// GeneratorUnavailable when unconfigured or on provider error.
    async fn generate(&self, prompt: &str, system_instruction: &str) -> AppResult<String>;
}

/// Gemini-backed generator client.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            base_url,
        })
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, system_instruction: &str) -> AppResult<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, MODEL);

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "systemInstruction": { "parts": [{ "text": system_instruction }] }
        });

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::GeneratorUnavailable(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::GeneratorUnavailable(format!(
                "Gemini returned status {}",
                status
            )));
        }

        let data: Value = response.json().await.map_err(|e| {
            AppError::GeneratorUnavailable(format!("invalid Gemini response: {}", e))
        })?;

        let text = data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                AppError::GeneratorUnavailable("Gemini response contained no text".to_string())
            })?;

        tracing::debug!(chars = text.len(), provider = "gemini", "Generation completed");

        Ok(clean_generated_text(text))
    }
}

/// Stand-in used when no generator API key is configured; every call fails
/// with GeneratorUnavailable so the rest of the API keeps working.
#[derive(Clone, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl ContentGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str, _system_instruction: &str) -> AppResult<String> {
        Err(AppError::GeneratorUnavailable(
            "generator API key not configured".to_string(),
        ))
    }
}
