//! LLM Client: the single point of entry for text-generation calls.
//!
//! Speaks the OpenAI chat-completions wire format, which Groq also serves, so one
//! client covers both providers. Retries transport failures, timeouts, 429 and 5xx
//! responses with exponential backoff; other 4xx responses fail immediately.
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::{LlmProvider, LlmSettings};

pub mod extract;
pub mod prompts;
pub mod retry;

use extract::extract_json_object;
use retry::{with_retry, RetryPolicy};

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 1500;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        raw: String,
    },

    #[error("no JSON object in response")]
    NoJsonObject { raw: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Http(e)
        }
    }

    /// Transport failures, timeouts, 429 and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(_) | LlmError::Timeout => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// The model's raw output, when the failure was in reading it.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            LlmError::Parse { raw, .. } | LlmError::NoJsonObject { raw } => Some(raw),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    provider: LlmProvider,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

impl LlmClient {
    pub fn new(settings: &LlmSettings) -> Self {
        Self {
            client: Client::builder()
                .timeout(settings.timeout)
                .build()
                .expect("Failed to build HTTP client"),
            provider: settings.provider,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            retry: RetryPolicy {
                max_attempts: settings.max_attempts,
                initial_backoff: settings.initial_backoff,
            },
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Calls the chat-completions endpoint and returns the message text.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        with_retry(self.retry, LlmError::is_retryable, move |_| {
            self.call_once(prompt, system)
        })
        .await
    }

    /// Calls the model and parses the first JSON object in its reply.
    pub async fn call_json(&self, prompt: &str, system: &str) -> Result<Value, LlmError> {
        let text = self.call(prompt, system).await?;
        parse_json_reply(&text)
    }

    async fn call_once(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(self.provider.base_url())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(LlmError::from_transport)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = serde_json::from_str(&body).map_err(|source| LlmError::Parse {
            source,
            raw: body.clone(),
        })?;

        if let Some(usage) = &chat.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}

/// Extracts and parses the JSON object in a model reply.
pub fn parse_json_reply(text: &str) -> Result<Value, LlmError> {
    let json = extract_json_object(text).ok_or_else(|| LlmError::NoJsonObject {
        raw: text.to_string(),
    })?;
    serde_json::from_str(json).map_err(|source| LlmError::Parse {
        source,
        raw: text.to_string(),
    })
}
