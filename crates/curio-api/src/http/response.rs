//! Response envelope shared by every `/api/v1` route.
//!
//! ```json
//! {
//!   "data": { "recommendations": [...], "engine_used": "context_aware", ... },
//!   "meta": { "request_id": "0191...", "timestamp": "...", "response_time_ms": 12 },
//!   "_links": { "self": "/api/v1/recommendations" }
//! }
//! ```
//!
//! Error responses carry `errors` and a null `data` instead (see `AppError`).

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;

/// Per-request bookkeeping: a time-sortable id and the start instant.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub request_id: String,
    started: Instant,
}

impl RequestMeta {
    pub fn start() -> Self {
        Self {
            request_id: uuid::Uuid::now_v7().to_string(),
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn finish(&self) -> ApiMeta {
        ApiMeta {
            request_id: self.request_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            response_time_ms: self.elapsed_ms(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ApiMeta,
    #[serde(rename = "_links", skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<&'static str, String>,
}

#[derive(Debug, Serialize)]
pub struct ApiMeta {
    pub request_id: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub response_time_ms: u64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, meta: &RequestMeta) -> Self {
        Self {
            data,
            meta: meta.finish(),
            links: BTreeMap::new(),
        }
    }

    pub fn with_link(mut self, rel: &'static str, href: impl Into<String>) -> Self {
        self.links.insert(rel, href.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let meta = RequestMeta::start();
        let response = ApiResponse::success(serde_json::json!({"invalidated": 2}), &meta)
            .with_link("self", "/api/v1/users/alice/cache/invalidate");

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["data"]["invalidated"], 2);
        assert_eq!(value["meta"]["request_id"], meta.request_id.as_str());
        assert_eq!(value["_links"]["self"], "/api/v1/users/alice/cache/invalidate");
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn test_links_omitted_when_empty() {
        let response = ApiResponse::success(1, &RequestMeta::start());
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("_links").is_none());
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestMeta::start().request_id, RequestMeta::start().request_id);
    }
}
