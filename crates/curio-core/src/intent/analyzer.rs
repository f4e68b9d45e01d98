//! IntentAnalyzer: LLM classification with a bounded timeout.
//!
//! Any failure on the LLM path (timeout, non-2xx, quota exhaustion, open
//! circuit, missing key, malformed output) falls back to
//! [`heuristic::classify`]. The analyzer has no side effects beyond the
//! quota reservation the gateway makes; callers own caching.

use std::sync::Arc;

use serde::Deserialize;

use curio_types::identity::UserId;
use curio_types::intent::{Intent, IntentSource, IntentType, ProjectContext};

use super::heuristic::{self, MAX_KEYWORDS};
use crate::llm::factory::ProviderFactory;
use crate::llm::gateway::LlmGateway;
use crate::repository::counter::CounterStore;
use crate::repository::user_key::UserKeyStore;

const SYSTEM_PROMPT: &str = "You classify requests for saved learning and development content. \
Reply with a single JSON object and nothing else: \
{\"intent\": \"learn\" | \"build\" | \"research\" | \"unknown\", \
\"confidence\": number between 0 and 1, \
\"keywords\": [technology or topic keywords, lowercase, at most 12]}. \
learn = wants to understand a topic; build = working on an implementation; \
research = comparing or surveying options.";

#[derive(Debug, Deserialize)]
struct IntentPayload {
    intent: String,
    confidence: f64,
    #[serde(default)]
    keywords: Vec<String>,
}

pub struct IntentAnalyzer<Q: CounterStore, K: UserKeyStore, F: ProviderFactory> {
    gateway: Arc<LlmGateway<Q, K, F>>,
}

impl<Q: CounterStore, K: UserKeyStore, F: ProviderFactory> IntentAnalyzer<Q, K, F> {
    pub fn new(gateway: Arc<LlmGateway<Q, K, F>>) -> Self {
        Self { gateway }
    }

    /// Classify the request. Never fails and never waits longer than the
    /// gateway's LLM timeout.
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn analyze(
        &self,
        user_id: &UserId,
        query_text: &str,
        context: Option<&ProjectContext>,
    ) -> Intent {
        if query_text.trim().is_empty() && context.is_none() {
            return Intent::unknown(IntentSource::HeuristicFallback);
        }

        let prompt = build_prompt(query_text, context);
        let reply = match self.gateway.complete(user_id, SYSTEM_PROMPT, &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "LLM intent analysis failed, using heuristic");
                return heuristic::classify(query_text, context);
            }
        };

        match parse_reply(&reply) {
            Some(intent) => intent,
            None => {
                tracing::warn!(reply_len = reply.len(), "malformed LLM intent reply, using heuristic");
                heuristic::classify(query_text, context)
            }
        }
    }
}

fn build_prompt(query_text: &str, context: Option<&ProjectContext>) -> String {
    let mut prompt = String::new();
    if !query_text.trim().is_empty() {
        prompt.push_str("Request: ");
        prompt.push_str(query_text.trim());
        prompt.push('\n');
    }
    if let Some(ctx) = context {
        prompt.push_str("Project: ");
        prompt.push_str(&ctx.as_text());
        prompt.push('\n');
    }
    prompt
}

/// Extract and validate the JSON object in an LLM reply.
fn parse_reply(reply: &str) -> Option<Intent> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end <= start {
        return None;
    }
    let payload: IntentPayload = serde_json::from_str(&reply[start..=end]).ok()?;

    let intent_type: IntentType = payload.intent.parse().ok()?;
    if !payload.confidence.is_finite() {
        return None;
    }

    let mut keywords: Vec<String> = Vec::new();
    for kw in payload.keywords {
        let kw = kw.trim().to_lowercase();
        if !kw.is_empty() && !keywords.contains(&kw) && keywords.len() < MAX_KEYWORDS {
            keywords.push(kw);
        }
    }

    Some(Intent {
        intent_type,
        confidence: payload.confidence.clamp(0.0, 1.0),
        keywords,
        source: IntentSource::Llm,
    })
}
