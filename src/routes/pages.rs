use axum::{Router, http::StatusCode, response::Html, routing::get};

use crate::state::SharedState;

const INDEX_HTML: &str = include_str!("index.html");

/// Single-page UI listing free experts and chatting through the router.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Configure the public page routes.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/", get(index))
        .route("/favicon.ico", get(favicon))
}
