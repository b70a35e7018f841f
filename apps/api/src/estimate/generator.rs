//! Estimate generator: pluggable source of raw (untrusted) estimate JSON.
//!
//! Default: `LlmClient` (OpenAI or Groq chat completions).
//! `AppState` holds an `Arc<dyn EstimateGenerator>` so tests can stub the model.

use async_trait::async_trait;
use serde_json::Value;

use crate::llm_client::{LlmClient, LlmError};

#[async_trait]
pub trait EstimateGenerator: Send + Sync {
    /// Returns the first JSON object the model produced, unvalidated.
    async fn generate(&self, prompt: &str, system: &str) -> Result<Value, LlmError>;
}

#[async_trait]
impl EstimateGenerator for LlmClient {
    async fn generate(&self, prompt: &str, system: &str) -> Result<Value, LlmError> {
        self.call_json(prompt, system).await
    }
}
