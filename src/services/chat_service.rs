use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::chat::{ChatSendResponse, ChatSendRequest},
    error::ServiceError,
    services::expert_service::experts_from_models,
    state::SharedState,
};

/// Reward for a non-empty reply.
const SUCCESS_REWARD: f64 = 1.0;
/// Reward for an error or an empty reply.
const FAILURE_REWARD: f64 = 0.0;

/// Route `request` to the best free model, learn from the outcome and return the reply.
pub async fn send(
    state: &SharedState,
    request: ChatSendRequest,
) -> Result<ChatSendResponse, ServiceError> {
    let request_id = Uuid::new_v4();
    let models = state.dragon().refresh_models(false).await?;
    let experts = experts_from_models(&models);

    let expert_id = {
        let _gate = state.router_gate().lock().await;
        let router = state.open_router(experts.clone()).await?;
        router.select()?.id.clone()
    };

    let started = Instant::now();
    let outcome = state
        .dragon()
        .provider()
        .chat(&expert_id, &request.message)
        .await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let reward = match &outcome {
        Ok(reply) if !reply.trim().is_empty() => SUCCESS_REWARD,
        _ => FAILURE_REWARD,
    };

    {
        let _gate = state.router_gate().lock().await;
        let mut router = state.open_router(experts).await?;
        router.record_reward(&expert_id, reward).await?;
    }

    match outcome {
        Ok(response) => {
            info!(
                event = "chat_send",
                %request_id,
                expert = %expert_id,
                latency_ms,
                reward,
                "chat_send completed"
            );
            Ok(ChatSendResponse {
                request_id,
                selected_expert: expert_id,
                response,
            })
        }
        Err(err) => {
            warn!(
                event = "chat_send",
                %request_id,
                expert = %expert_id,
                latency_ms,
                error = %err,
                "chat_send failed"
            );
            Err(err.into())
        }
    }
}
