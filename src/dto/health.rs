use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Shared cache status ("disabled", "ok" or "unreachable").
    pub cache: String,
}

impl HealthResponse {
    /// Everything reachable; `cache` describes the shared cache.
    pub fn ok(cache: &str) -> Self {
        Self {
            status: "ok".to_string(),
            cache: cache.to_string(),
        }
    }

    /// The shared cache is configured but unreachable.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
            cache: "unreachable".to_string(),
        }
    }
}
