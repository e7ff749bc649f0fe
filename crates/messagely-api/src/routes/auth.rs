use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use messagely_types::api::{LoginRequest, RegisterRequest};

use crate::accounts;
use crate::error::Result;
use crate::routes::run_blocking;
use crate::state::AppState;

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    body: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = body?;
    // Argon2 hashing blocks; keep it off the async workers.
    let resp = run_blocking(move || accounts::register(&state, &req)).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = body?;
    let resp = run_blocking(move || accounts::login(&state, &req)).await?;
    Ok(Json(resp))
}
