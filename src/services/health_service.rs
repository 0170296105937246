use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

const PROBE_KEY: &str = "dragonscales:healthcheck";

/// Report health, probing the shared cache when one is configured.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let Some(cache) = state.dragon().cache() else {
        return HealthResponse::ok("disabled");
    };

    match cache.get(PROBE_KEY).await {
        Ok(_) => HealthResponse::ok("ok"),
        Err(err) => {
            warn!(error = %err, "cache health check failed");
            HealthResponse::degraded()
        }
    }
}
