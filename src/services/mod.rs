/// Chat routing through the expert bandit.
pub mod chat_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Free model listing and expert selection.
pub mod expert_service;
/// Health check service.
pub mod health_service;
