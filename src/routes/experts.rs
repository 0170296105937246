use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::expert::{ExpertSummary, SelectionResponse},
    error::AppError,
    services::expert_service,
    state::SharedState,
};

/// Free model listing and expert selection routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/experts", get(list_experts))
        .route("/select", post(select_expert))
}

/// List the free models currently offered, bypassing any cached listing.
#[utoipa::path(
    get,
    path = "/experts",
    tag = "experts",
    params(("X-API-Key" = String, Header, description = "UI API key")),
    responses(
        (status = 200, description = "Free experts", body = [ExpertSummary]),
        (status = 401, description = "Missing or invalid API key"),
        (status = 502, description = "Model provider unavailable")
    )
)]
pub async fn list_experts(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ExpertSummary>>, AppError> {
    Ok(Json(expert_service::list_experts(&state).await?))
}

/// Ask the router which free expert to call next.
#[utoipa::path(
    post,
    path = "/select",
    tag = "experts",
    params(("X-API-Key" = String, Header, description = "UI API key")),
    responses(
        (status = 200, description = "Recommended expert", body = SelectionResponse),
        (status = 401, description = "Missing or invalid API key"),
        (status = 503, description = "No free experts available")
    )
)]
pub async fn select_expert(
    State(state): State<SharedState>,
) -> Result<Json<SelectionResponse>, AppError> {
    Ok(Json(expert_service::select_expert(&state).await?))
}
