//! Prompt → completion.
//!
//! [`GeminiGenerator`] calls `models/{model}:generateContent` and returns the
//! concatenated text parts of the first candidate. Transient failures
//! (timeouts, connect errors, 429, 5xx) are retried up to
//! [`GenerationConfig::retries`] times with doubling backoff; with the
//! default of zero retries the first failure is final.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::GenerationConfig;
use crate::error::GenerationError;
use crate::http::{build_client, check_status};

pub trait Generator: Send + Sync + 'static {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    client: Client,
    config: GenerationConfig,
}

impl GeminiGenerator {
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let client = build_client(config.timeout)?;
        Ok(Self { client, config })
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&GenerateRequest {
                contents: [Content {
                    role: "user",
                    parts: [Part { text: prompt }],
                }],
            })
            .send()
            .await?;

        let resp = check_status(resp)
            .await
            .map_err(|(status, body)| GenerationError::Status { status, body })?;
        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(text)
    }
}

/// Upper bound on a single backoff sleep.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

fn next_delay(delay: Duration) -> Duration {
    delay.saturating_mul(2).min(MAX_RETRY_DELAY)
}

impl Generator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let mut delay = self.config.retry_delay;
        let mut attempt = 0;
        loop {
            match self.generate_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.config.retries && e.is_transient() => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = self.config.retries,
                        error = %e,
                        "generation failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = next_delay(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
