//! Provider factory port.

use curio_types::llm::LlmError;
use curio_types::secret::ResolvedApiKey;

use super::box_provider::BoxLlmProvider;

/// Builds a provider client bound to one API key.
///
/// The gateway calls this once per user and keeps the result in its client
/// pool, so construction may be moderately expensive (HTTP client setup).
pub trait ProviderFactory: Send + Sync {
    fn build(&self, api_key: &ResolvedApiKey) -> Result<BoxLlmProvider, LlmError>;
}
