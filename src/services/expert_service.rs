use crate::{
    dto::expert::{ExpertSummary, SelectionResponse},
    error::ServiceError,
    openrouter::Model,
    router::Expert,
    state::SharedState,
};

/// Map free models to router experts, skipping entries without any identifier.
pub fn experts_from_models(models: &[Model]) -> Vec<Expert> {
    models
        .iter()
        .filter_map(|model| model.expert_id().map(Expert::new))
        .collect()
}

/// Fetch a fresh listing of free models.
pub async fn list_experts(state: &SharedState) -> Result<Vec<ExpertSummary>, ServiceError> {
    let models = state.dragon().refresh_models(true).await?;
    Ok(models.iter().map(ExpertSummary::from).collect())
}

/// Ask the router which free model should handle the next request.
pub async fn select_expert(state: &SharedState) -> Result<SelectionResponse, ServiceError> {
    let models = state.dragon().refresh_models(true).await?;
    let experts = experts_from_models(&models);

    let _gate = state.router_gate().lock().await;
    let router = state.open_router(experts).await?;
    let expert = router.select()?;

    Ok(SelectionResponse {
        selected_expert: expert.id.clone(),
    })
}
