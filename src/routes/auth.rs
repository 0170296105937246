use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, state::SharedState};

const API_KEY_HEADER: &str = "x-api-key";

/// Reject requests that do not carry the configured API key.
///
/// The key is read from `X-API-Key`, falling back to `Authorization: Bearer <key>`.
pub async fn require_api_key(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let expected = state.api_key();
    if expected.is_empty() {
        return Err(AppError::Unauthorized("UI API key not configured".into()));
    }

    match provided_key(req.headers()) {
        Some(provided) if provided == expected => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized("invalid API key".into())),
        None => Err(AppError::Unauthorized(
            "missing API key header `X-API-Key`".into(),
        )),
    }
}

fn provided_key(headers: &HeaderMap) -> Option<&str> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
    };

    header(API_KEY_HEADER).or_else(|| {
        header(AUTHORIZATION.as_str()).map(|value| value.strip_prefix("Bearer ").unwrap_or(value))
    })
}
