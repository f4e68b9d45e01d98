//! Provider for any OpenAI-compatible chat completions endpoint.
//!
//! Covers OpenAI itself and self-hosted gateways (Ollama, vLLM, LiteLLM)
//! through a configurable base URL.

pub mod types;

use secrecy::{ExposeSecret, SecretString};

use curio_core::llm::provider::LlmProvider;
use curio_types::llm::{CompletionRequest, CompletionResponse, LlmError, MessageRole, Usage};

use self::types::{ChatMessage, ChatRequest, ChatResponse};

/// Default base URL when none is configured.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible provider. Does not implement `Debug`.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(api_key: SecretString, model: String, base_url: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: super::http_client()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: MessageRole::System.to_string(),
                content: system.clone(),
            });
        }
        messages.extend(request.messages.iter().map(|m| ChatMessage {
            role: m.role.to_string(),
            content: m.content.clone(),
        }));

        ChatRequest {
            model: if request.model.is_empty() {
                self.model.clone()
            } else {
                request.model.clone()
            },
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.build_request(request);
        let http = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body);

        let resp: ChatResponse = super::send_json(http).await?;

        let content = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Deserialization("response has no choices".to_string()))?;
        let usage = resp.usage.unwrap_or_default();

        Ok(CompletionResponse {
            id: resp.id,
            content,
            model: resp.model,
            usage: Usage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
        })
    }
}
