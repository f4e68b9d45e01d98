use thiserror::Error;

/// The only error `get_recommendations` surfaces to its caller.
///
/// Every other failure is recovered by the fallback chain and shows up as a
/// lower-quality (possibly empty) list instead.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RecommendError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Failures a scoring engine may raise. All are recoverable by falling back.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("analysis store unavailable: {0}")]
    AnalysisStoreUnavailable(String),

    #[error("LLM call timed out")]
    LlmTimeout,

    #[error("quota exceeded (retry after {retry_after_seconds}s)")]
    QuotaExceeded { retry_after_seconds: u64 },

    #[error("candidate store error: {0}")]
    CandidateStore(String),
}

/// Errors from repository operations (used by trait definitions in curio-core).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("operation timed out after {0}ms")]
    Timeout(u64),
}

/// Result-cache failures. Always degraded to a cache miss.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("cache serialization error: {0}")]
    Serialization(String),
}

/// Failures of the quota counter store.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QuotaError {
    #[error("quota store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Errors related to API-key storage.
///
/// Never carries plaintext or key material.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SecretError {
    #[error("secret not found")]
    NotFound,

    #[error("secret provider unavailable")]
    ProviderUnavailable,

    #[error("encryption error")]
    EncryptionError,

    #[error("storage error: {0}")]
    StorageError(String),
}
