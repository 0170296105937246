use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Message to forward to the routed expert.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ChatSendRequest {
    /// User message, 1 to 32000 characters.
    #[validate(length(min = 1, max = 32000))]
    pub message: String,
}

/// Reply from the expert the router picked.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatSendResponse {
    /// Identifier logged with the `chat_send` event.
    pub request_id: Uuid,
    /// Model that answered.
    pub selected_expert: String,
    /// Model reply.
    pub response: String,
}
