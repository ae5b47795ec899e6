//! Chat-completion client for Groq's OpenAI-compatible API.
//!
//! Requests are non-streaming with a single user message. Failures on the
//! transport, `429` and `5xx` responses are retried `max_retries` times with
//! exponential backoff; any other non-success status fails immediately.

use crate::config::LlmConfig;
use crate::traits::AnswerGenerator;
use crate::ProviderError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const BACKEND: &str = "groq";

pub struct GroqClient {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
    max_retries: u32,
    initial_backoff: Duration,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl GroqClient {
    pub fn new(config: &LlmConfig) -> Result<Self, ProviderError> {
        let base = url::Url::parse(config.base_url.trim())?;
        let client = Client::builder().timeout(config.timeout).build()?;

        info!(
            model = %config.model,
            timeout_secs = config.timeout.as_secs(),
            max_retries = config.max_retries,
            "llm client initialized"
        );

        Ok(Self {
            client,
            url: format!("{}/chat/completions", base.as_str().trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff,
            api_key: config.api_key.clone(),
        })
    }

    async fn attempt(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let details = response.text().await.unwrap_or_default();
            return Err(ProviderError::BackendResponse {
                backend: BACKEND.to_string(),
                status: status.as_u16(),
                details,
            });
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        first_content(parsed)
    }
}

fn first_content(parsed: ChatCompletionResponse) -> Result<String, ProviderError> {
    parsed
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::Request("completion returned no choices".to_string()))
}

fn is_retryable(error: &ProviderError) -> bool {
    match error {
        ProviderError::Http(_) => true,
        ProviderError::BackendResponse { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
        }
        _ => false,
    }
}

fn backoff_delay(initial: Duration, attempt: u32) -> Duration {
    initial.saturating_mul(2u32.saturating_pow(attempt))
}

#[async_trait]
impl AnswerGenerator for GroqClient {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let started = Instant::now();
        let mut attempt = 0u32;

        loop {
            debug!(model = %self.model, attempt, prompt_len = prompt.len(), "POST {}", self.url);
            match self.attempt(prompt).await {
                Ok(content) => {
                    info!(
                        model = %self.model,
                        latency_ms = started.elapsed().as_millis(),
                        "chat completion completed"
                    );
                    return Ok(content);
                }
                Err(err) if attempt < self.max_retries && is_retryable(&err) => {
                    let delay = backoff_delay(self.initial_backoff, attempt);
                    warn!(error = %err, attempt, delay_ms = delay.as_millis(), "retrying chat completion");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!(error = %err, attempt, model = %self.model, "chat completion failed");
                    return Err(err);
                }
            }
        }
    }
}
