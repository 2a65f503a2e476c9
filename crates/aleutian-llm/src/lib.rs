// ABOUTME: LLM provider trait and message/config types
// ABOUTME: used as a best-effort oracle by C2 conceptual resolution and C3 refinement

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type for LLM operations.
pub type LlmResult<T> = anyhow::Result<T>;

/// A message in the conversation sent to the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Generation parameters for a single LLM call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: Option<usize>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: Some(1024),
        }
    }
}

/// Response from the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub total_tokens: Option<usize>,
}

/// Every LLM call made by this crate family is best-effort: a failure or
/// malformed output falls back to the deterministic path silently. No
/// control flow depends on LLM correctness (spec.md §9).
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> LlmResult<LlmResponse> {
        let messages = vec![Message {
            role: MessageRole::User,
            content: prompt.to_string(),
        }];
        self.generate_chat(&messages, &GenerationConfig::default())
            .await
    }

    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> LlmResult<LlmResponse>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

/// Deterministic test double: echoes back a fixed response, or the first
/// candidate it's asked to choose among, with no network calls. Used by C2's
/// conceptual-resolution tests and C3's refinement-hook fallback tests.
pub struct MockLLMProvider {
    pub fixed_response: String,
}

impl MockLLMProvider {
    pub fn new(fixed_response: impl Into<String>) -> Self {
        Self {
            fixed_response: fixed_response.into(),
        }
    }

    pub fn failing() -> FailingLLMProvider {
        FailingLLMProvider
    }
}

#[async_trait]
impl LLMProvider for MockLLMProvider {
    async fn generate_chat(
        &self,
        _messages: &[Message],
        _config: &GenerationConfig,
    ) -> LlmResult<LlmResponse> {
        Ok(LlmResponse {
            content: self.fixed_response.clone(),
            total_tokens: Some(self.fixed_response.len() / 4),
        })
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-deterministic"
    }
}

/// Test double that always errors, for exercising the silent-fallback paths.
pub struct FailingLLMProvider;

#[async_trait]
impl LLMProvider for FailingLLMProvider {
    async fn generate_chat(
        &self,
        _messages: &[Message],
        _config: &GenerationConfig,
    ) -> LlmResult<LlmResponse> {
        anyhow::bail!("llm provider unavailable")
    }

    fn provider_name(&self) -> &str {
        "failing"
    }

    fn model_name(&self) -> &str {
        "none"
    }
}
