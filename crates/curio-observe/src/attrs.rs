//! Span attribute names for the recommendation pipeline.
//!
//! The operation name follows the OpenTelemetry GenAI semantic conventions;
//! the `curio.*` names cover the recommender itself. Use them as constant
//! field names: `info_span!("recommend", { USER_ID } = %user)`.

// --- Recommendation pipeline ---

/// Opaque user identifier.
pub const USER_ID: &str = "curio.user.id";

/// Engine that produced the final list (e.g., "context_aware").
pub const ENGINE: &str = "curio.engine";

/// Classified intent (e.g., "learn").
pub const INTENT: &str = "curio.intent";

/// Number of recommendations returned.
pub const RESULT_COUNT: &str = "curio.result.count";

/// Whether the response came from the result cache.
pub const CACHE_HIT: &str = "curio.cache.hit";

/// Whether any fallback was taken.
pub const DEGRADED: &str = "curio.degraded";

/// Entries removed by a cache invalidation.
pub const INVALIDATED: &str = "curio.cache.invalidated";

// --- Operation names ---

/// The name of the operation being performed.
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// End-to-end recommendation request.
pub const OP_RECOMMEND: &str = "recommend";
