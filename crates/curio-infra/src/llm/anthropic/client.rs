//! AnthropicProvider -- [`LlmProvider`] for the Anthropic Messages API.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building the request headers.

use secrecy::{ExposeSecret, SecretString};

use curio_core::llm::provider::LlmProvider;
use curio_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

use super::types::{AnthropicContentBlock, AnthropicMessage, AnthropicRequest, AnthropicResponse};

/// Anthropic Claude provider.
///
/// Does not implement `Debug`, so the key cannot leak through formatting.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl AnthropicProvider {
    const API_VERSION: &'static str = "2023-06-01";

    pub fn new(api_key: SecretString, model: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: crate::llm::http_client()?,
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
            model,
        })
    }

    /// Override the base URL (proxies, tests).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn to_anthropic_request(&self, request: &CompletionRequest) -> AnthropicRequest {
        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };
        AnthropicRequest {
            model,
            max_tokens: request.max_tokens,
            messages: request
                .messages
                .iter()
                .map(|m| AnthropicMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            system: request.system.clone(),
            temperature: request.temperature,
        }
    }
}

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.to_anthropic_request(request);
        let http = self
            .client
            .post(self.url("/v1/messages"))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", Self::API_VERSION)
            .json(&body);

        let resp: AnthropicResponse = crate::llm::send_json(http).await?;

        let content = resp
            .content
            .iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text.as_str()),
                AnthropicContentBlock::Other => None,
            })
            .collect::<String>();

        Ok(CompletionResponse {
            id: resp.id,
            content,
            model: resp.model,
            usage: Usage {
                input_tokens: resp.usage.input_tokens,
                output_tokens: resp.usage.output_tokens,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use curio_types::llm::Message;

    use super::*;
    use crate::llm::test_server::serve_once;

    fn make_provider() -> AnthropicProvider {
        AnthropicProvider::new(
            SecretString::from("test-key-not-real"),
            "claude-3-5-haiku-latest".to_string(),
        )
        .unwrap()
    }

    fn request(model: &str) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            messages: vec![Message::user("learn react hooks")],
            system: Some("Classify the query".to_string()),
            max_tokens: 256,
            temperature: Some(0.0),
        }
    }

    #[test]
    fn test_empty_model_uses_configured_default() {
        let provider = make_provider();
        assert_eq!(
            provider.to_anthropic_request(&request("")).model,
            "claude-3-5-haiku-latest"
        );
        assert_eq!(provider.to_anthropic_request(&request("other")).model, "other");
    }

    #[test]
    fn test_base_url_override_trims_slash() {
        let provider = make_provider().with_base_url("http://localhost:8080/".to_string());
        assert_eq!(provider.url("/v1/messages"), "http://localhost:8080/v1/messages");
    }

    #[tokio::test]
    async fn test_complete_sends_headers_and_joins_text() {
        let (url, captured) = serve_once(
            200,
            "",
            r#"{"id":"msg_1","model":"claude-3-5-haiku-latest","content":[{"type":"text","text":"{\"intent\":"},{"type":"text","text":"\"learn\"}"}],"usage":{"input_tokens":10,"output_tokens":4}}"#,
        )
        .await;

        let provider = make_provider().with_base_url(url);
        let resp = provider.complete(&request("")).await.unwrap();
        assert_eq!(resp.content, r#"{"intent":"learn"}"#);
        assert_eq!(resp.usage.input_tokens, 10);

        let captured = captured.await.unwrap();
        let head = captured.head.to_lowercase();
        assert!(head.starts_with("post /v1/messages"));
        assert!(head.contains("x-api-key: test-key-not-real"));
        assert!(head.contains("anthropic-version: 2023-06-01"));
        assert!(captured.body.contains("\"system\":\"Classify the query\""));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_authentication_failed() {
        let (url, _captured) = serve_once(401, "", r#"{"error":"invalid x-api-key"}"#).await;
        let provider = make_provider().with_base_url(url);
        let err = provider.complete(&request("")).await.unwrap_err();
        assert_eq!(err, LlmError::AuthenticationFailed);
    }

    #[tokio::test]
    async fn test_rate_limit_reads_retry_after() {
        let (url, _captured) = serve_once(429, "retry-after: 12\r\n", "{}").await;
        let provider = make_provider().with_base_url(url);
        let err = provider.complete(&request("")).await.unwrap_err();
        assert_eq!(
            err,
            LlmError::RateLimited {
                retry_after_ms: Some(12_000)
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_deserialization_error() {
        let (url, _captured) = serve_once(200, "", r#"{"unexpected":true}"#).await;
        let provider = make_provider().with_base_url(url);
        let err = provider.complete(&request("")).await.unwrap_err();
        assert!(matches!(err, LlmError::Deserialization(_)));
    }
}
