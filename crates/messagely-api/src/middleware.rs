use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::guard::AuthorizationGuard;
use crate::state::AppState;

/// Extract and validate the bearer token, attaching the caller's
/// `Identity` to the request for handlers downstream.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let identity = AuthorizationGuard::new(&state.tokens).authenticate(auth_header)?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
