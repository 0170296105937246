use axum::{Json, Router, extract::State, routing::post};
use validator::Validate;

use crate::{
    dto::chat::{ChatSendRequest, ChatSendResponse},
    error::AppError,
    services::chat_service,
    state::SharedState,
};

/// Chat routes.
pub fn router() -> Router<SharedState> {
    Router::new().route("/chat/send", post(chat_send))
}

/// Send a message to the expert picked by the router and learn from the outcome.
#[utoipa::path(
    post,
    path = "/chat/send",
    tag = "chat",
    params(("X-API-Key" = String, Header, description = "UI API key")),
    request_body = ChatSendRequest,
    responses(
        (status = 200, description = "Expert reply", body = ChatSendResponse),
        (status = 400, description = "Empty or oversized message"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 502, description = "The selected expert failed to answer")
    )
)]
pub async fn chat_send(
    State(state): State<SharedState>,
    Json(request): Json<ChatSendRequest>,
) -> Result<Json<ChatSendResponse>, AppError> {
    request.validate()?;
    Ok(Json(chat_service::send(&state, request).await?))
}
