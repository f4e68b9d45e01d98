//! LLM provider implementations.
//!
//! Concrete implementations of the [`LlmProvider`] trait defined in
//! `curio-core`, plus [`HttpProviderFactory`], which the gateway uses to
//! build one client per resolved API key.
//!
//! [`LlmProvider`]: curio_core::llm::provider::LlmProvider

pub mod anthropic;
pub mod openai_compat;

use std::time::Duration;

use secrecy::SecretString;

use curio_core::llm::box_provider::BoxLlmProvider;
use curio_core::llm::factory::ProviderFactory;
use curio_types::config::LlmSettings;
use curio_types::llm::{LlmError, ProviderType};
use curio_types::secret::ResolvedApiKey;

use self::anthropic::AnthropicProvider;
use self::openai_compat::OpenAiCompatibleProvider;

/// Upper bound on a single HTTP exchange. The gateway applies the tighter
/// analysis timeout on top of this.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds HTTP provider clients from the `[llm]` config section.
#[derive(Debug, Clone)]
pub struct HttpProviderFactory {
    provider: ProviderType,
    model: String,
    base_url: Option<String>,
}

impl HttpProviderFactory {
    pub fn new(settings: &LlmSettings) -> Self {
        Self {
            provider: settings.provider,
            model: settings.model.clone(),
            base_url: settings.base_url.clone(),
        }
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn build(&self, api_key: &ResolvedApiKey) -> Result<BoxLlmProvider, LlmError> {
        let key = api_key.key.expose();
        if key.trim().is_empty() {
            return Err(LlmError::NoApiKey);
        }
        let secret = SecretString::from(key.to_string());

        match self.provider {
            ProviderType::Anthropic => {
                let mut provider = AnthropicProvider::new(secret, self.model.clone())?;
                if let Some(base_url) = &self.base_url {
                    provider = provider.with_base_url(base_url.clone());
                }
                Ok(BoxLlmProvider::new(provider))
            }
            ProviderType::OpenAiCompatible => {
                let base_url = self
                    .base_url
                    .clone()
                    .unwrap_or_else(|| openai_compat::OPENAI_BASE_URL.to_string());
                let provider = OpenAiCompatibleProvider::new(secret, self.model.clone(), base_url)?;
                Ok(BoxLlmProvider::new(provider))
            }
        }
    }
}

/// Shared reqwest client construction for the providers.
fn http_client() -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| LlmError::Provider {
            message: format!("failed to create HTTP client: {e}"),
        })
}

/// Map a non-success HTTP status to an [`LlmError`].
///
/// `body` is the provider's error payload; it never contains the request's
/// API key.
fn status_error(status: reqwest::StatusCode, retry_after: Option<u64>, body: String) -> LlmError {
    match status.as_u16() {
        400 | 404 | 422 => LlmError::InvalidRequest(body),
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: retry_after.map(|secs| secs * 1000),
        },
        503 | 529 => LlmError::Overloaded(body),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

/// Seconds from a `retry-after` header, when present and numeric.
fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Send a prepared request and decode a JSON body, mapping transport and
/// status failures.
async fn send_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, LlmError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            LlmError::Timeout {
                timeout_ms: HTTP_TIMEOUT.as_millis() as u64,
            }
        } else {
            LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            }
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let retry_after = retry_after_secs(response.headers());
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, retry_after, body));
    }

    response
        .json()
        .await
        .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))
}
