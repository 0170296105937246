//! HTTP routes of the DragonScales UI.

use axum::{Router, middleware};

use crate::state::SharedState;

/// API key middleware.
pub mod auth;
/// Chat endpoint.
pub mod chat;
/// Swagger UI and OpenAPI document.
pub mod docs;
/// Expert listing and selection endpoints.
pub mod experts;
/// Health check endpoint.
pub mod health;
/// Landing page and favicon.
pub mod pages;

/// Compose all route trees; everything except the landing page, health and docs needs the API key.
pub fn router(state: SharedState) -> Router<()> {
    let protected = experts::router()
        .merge(chat::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    let public = pages::router()
        .merge(health::router())
        .merge(docs::router());

    public.merge(protected).with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use futures::future::BoxFuture;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        dragon::Dragon,
        openrouter::{Model, ModelProvider, OpenRouterError, OpenRouterResult},
        router::{CheckpointStorage, LocalFileStorage},
        state::AppState,
    };

    struct FakeProvider {
        reply: Option<String>,
        paid_only: bool,
    }

    impl ModelProvider for FakeProvider {
        fn list_models(&self) -> BoxFuture<'_, OpenRouterResult<Vec<Model>>> {
            let paid_only = self.paid_only;
            Box::pin(async move {
                if paid_only {
                    return Ok(vec![Model::with_id("paid").priced(json!("0.1"), json!("0"))]);
                }
                let mut model = Model::with_id("m1").priced(json!("0"), json!("0"));
                model.name = Some("Model m1".into());
                model.description = Some("desc".into());
                Ok(vec![
                    model,
                    Model::with_id("paid").priced(json!("0.1"), json!("0.1")),
                ])
            })
        }

        fn chat<'a>(
            &'a self,
            _model: &'a str,
            _message: &'a str,
        ) -> BoxFuture<'a, OpenRouterResult<String>> {
            let reply = self.reply.clone();
            Box::pin(async move {
                reply.ok_or_else(|| OpenRouterError::NoChoices {
                    model: "m1".into(),
                })
            })
        }
    }

    fn app_with(reply: Option<&str>, checkpoints: Option<Arc<dyn CheckpointStorage>>) -> Router {
        let provider = Arc::new(FakeProvider {
            reply: reply.map(str::to_owned),
            paid_only: false,
        });
        let dragon = Arc::new(Dragon::new(provider));
        router(AppState::new("secret", dragon, checkpoints))
    }

    fn app() -> Router {
        app_with(Some("hello back"), None)
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn chat_request(message: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat/send")
            .header("X-API-Key", "secret")
            .header("content-type", "application/json")
            .body(Body::from(json!({"message": message}).to_string()))
            .unwrap()
    }

    fn recorded_stats(dir: &tempfile::TempDir) -> Value {
        let raw = std::fs::read(dir.path().join("router_state.json")).unwrap();
        let checkpoint: Value = serde_json::from_slice(&raw).unwrap();
        checkpoint["state"]["m1"].clone()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn landing_page_is_public() {
        let response = app().oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Mixture of Experts"));
    }

    #[tokio::test]
    async fn protected_routes_require_key() {
        let response = app().oneshot(get("/experts")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let wrong = Request::builder()
            .uri("/experts")
            .header("X-API-Key", "nope")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(wrong).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn empty_configured_key_rejects_everyone() {
        let dragon = Arc::new(Dragon::new(Arc::new(FakeProvider {
            reply: None,
            paid_only: false,
        })));
        let app = router(AppState::new("", dragon, None));
        let request = Request::builder()
            .uri("/experts")
            .header("X-API-Key", "")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn lists_free_experts_with_key() {
        let request = Request::builder()
            .uri("/experts")
            .header("X-API-Key", "secret")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!([{"id": "m1", "name": "Model m1", "description": "desc"}])
        );
    }

    #[tokio::test]
    async fn bearer_token_is_accepted() {
        let request = Request::builder()
            .method("POST")
            .uri("/select")
            .header("Authorization", "Bearer secret")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"selected_expert": "m1"}));
    }

    #[tokio::test]
    async fn chat_send_replies_and_records_reward() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn CheckpointStorage> =
            Arc::new(LocalFileStorage::new(dir.path()).unwrap());
        let request = Request::builder()
            .method("POST")
            .uri("/chat/send")
            .header("X-API-Key", "secret")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"message": "Hello"}"#))
            .unwrap();

        let response = app_with(Some("hello back"), Some(storage))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["selected_expert"], "m1");
        assert_eq!(body["response"], "hello back");

        let raw = std::fs::read(dir.path().join("router_state.json")).unwrap();
        let checkpoint: Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(checkpoint["state"]["m1"]["pulls"], 1);
        assert_eq!(checkpoint["state"]["m1"]["reward_sum"], 1.0);
    }

    #[tokio::test]
    async fn chat_send_upstream_failure_is_bad_gateway() {
        let request = Request::builder()
            .method("POST")
            .uri("/chat/send")
            .header("X-API-Key", "secret")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"message": "Hello"}"#))
            .unwrap();

        let response = app_with(None, None).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn chat_send_rejects_empty_message() {
        let request = Request::builder()
            .method("POST")
            .uri("/chat/send")
            .header("X-API-Key", "secret")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"message": ""}"#))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn healthcheck_is_public() {
        let response = app().oneshot(get("/healthcheck")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"status": "ok", "cache": "disabled"})
        );
    }

    #[tokio::test]
    async fn failed_chat_records_zero_reward() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn CheckpointStorage> =
            Arc::new(LocalFileStorage::new(dir.path()).unwrap());

        let response = app_with(None, Some(storage))
            .oneshot(chat_request("Hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(recorded_stats(&dir), json!({"pulls": 1, "reward_sum": 0.0}));
    }

    #[tokio::test]
    async fn blank_reply_records_zero_reward() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn CheckpointStorage> =
            Arc::new(LocalFileStorage::new(dir.path()).unwrap());

        let response = app_with(Some("  \n "), Some(storage))
            .oneshot(chat_request("Hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["response"], "  \n ");
        assert_eq!(recorded_stats(&dir), json!({"pulls": 1, "reward_sum": 0.0}));
    }

    #[tokio::test]
    async fn select_without_free_models_is_unavailable() {
        let provider = Arc::new(FakeProvider {
            reply: None,
            paid_only: true,
        });
        let app = router(AppState::new("secret", Arc::new(Dragon::new(provider)), None));
        let request = Request::builder()
            .method("POST")
            .uri("/select")
            .header("X-API-Key", "secret")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            json_body(response).await,
            json!({"message": "service unavailable: no free experts available"})
        );
    }
}
