//! Access gate: bearer-token middleware for protected routes.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::AppState;
use crate::error::ApiError;

/// Require a verified bearer token before the handler runs.
///
/// The header value is `"<scheme> <token>"`; everything after the first
/// space is handed to verification, so a value without a space fails as
/// an invalid token rather than a malformed header. On success the
/// verified [`Claims`] are inserted into request extensions.
///
/// [`Claims`]: crate::token::Claims
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthenticated)?;

    let token = header.split_once(' ').map(|(_, t)| t).unwrap_or("");

    let claims = state
        .tokens
        .verify(token)
        .map_err(|_| ApiError::InvalidToken)?;

    tracing::debug!(user = %claims.username, "request authenticated");
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
