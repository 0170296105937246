use serde::Serialize;
use utoipa::ToSchema;

use crate::openrouter::Model;

/// Free model as shown in the UI.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExpertSummary {
    /// Model id, falling back to the canonical slug.
    pub id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Provider description.
    pub description: Option<String>,
}

impl From<&Model> for ExpertSummary {
    fn from(model: &Model) -> Self {
        Self {
            id: model.expert_id().map(str::to_owned),
            name: model.name.clone(),
            description: model.description.clone(),
        }
    }
}

/// Expert recommended by the router.
#[derive(Debug, Serialize, ToSchema)]
pub struct SelectionResponse {
    /// Id of the recommended model.
    pub selected_expert: String,
}
