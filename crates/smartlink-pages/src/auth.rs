//! Bearer token guard for the admin API.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::PageError;
use crate::state::AppState;

/// Require a valid Bearer token on admin requests.
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// When `SMARTLINK_API_TOKENS` is empty the admin API is open; deployments
/// that expose it publicly are expected to configure tokens.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, PageError> {
    if state.config.api_tokens.is_empty() {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    match token {
        Some(token) if state.config.api_tokens.contains(token) => Ok(next.run(request).await),
        Some(_) => {
            tracing::debug!("invalid api token");
            Err(PageError::Unauthorized)
        }
        None => {
            tracing::debug!("missing or malformed authorization header");
            Err(PageError::Unauthorized)
        }
    }
}
