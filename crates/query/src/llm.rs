use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use graph::GraphContext;

use crate::prompt::build_prompt;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("LLM generation disabled: no API key configured")]
    Disabled,

    #[error("error calling Gemini API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("error parsing response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("empty response from Gemini")]
    EmptyResponse,
}

/// Turns a question plus its graph context into an answer.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str, context: &GraphContext) -> Result<String, GenerationError>;
}

#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key,
            timeout: Duration::from_secs(30),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// Send a raw prompt and return the first candidate's first text part.
    pub async fn complete(&self, prompt: String) -> Result<String, GenerationError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or(GenerationError::EmptyResponse)
    }
}

#[async_trait]
impl AnswerGenerator for GeminiClient {
    async fn generate(&self, question: &str, context: &GraphContext) -> Result<String, GenerationError> {
        let prompt = build_prompt(question, context);
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "Calling Gemini");

        self.complete(prompt).await
    }
}
