use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the DragonScales UI API.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::experts::list_experts,
        crate::routes::experts::select_expert,
        crate::routes::chat::chat_send,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::expert::ExpertSummary,
            crate::dto::expert::SelectionResponse,
            crate::dto::chat::ChatSendRequest,
            crate::dto::chat::ChatSendResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "experts", description = "Free model listing and routing"),
        (name = "chat", description = "Chat routed through the expert bandit"),
    )
)]
pub struct ApiDoc;
