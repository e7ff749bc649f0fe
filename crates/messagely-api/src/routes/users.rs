use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use messagely_types::api::{ReceivedMessage, SentMessage};

use crate::accounts;
use crate::error::{ApiError, Result};
use crate::guard::{AuthorizationGuard, Identity, Ownership};
use crate::messages;
use crate::routes::messages::summaries;
use crate::routes::run_blocking;
use crate::state::AppState;

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(_identity): Extension<Identity>,
) -> Result<impl IntoResponse> {
    let users = run_blocking(move || accounts::list_users(&state)).await?;
    Ok(Json(json!({ "users": users })))
}

/// GET /users/{username}
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse> {
    let user = run_blocking(move || accounts::get_user(&state, &identity, &username)).await?;
    Ok(Json(json!({ "user": user })))
}

/// GET /users/{username}/from
pub async fn messages_from(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse> {
    AuthorizationGuard::authorize(&identity, Ownership::Account(&username))?;

    let sent = run_blocking(move || {
        let rows = messages::list_from(&state.db, &username)?;
        let users = summaries(&state.db, rows.iter().map(|m| m.to_username.as_str()))?;
        rows.into_iter()
            .map(|m| -> Result<SentMessage> {
                let to_user = users
                    .get(&m.to_username)
                    .cloned()
                    .ok_or_else(|| ApiError::CorruptData("recipient lookup failed".into()))?;
                Ok(SentMessage {
                    id: m.id,
                    to_user,
                    body: m.body,
                    sent_at: m.sent_at,
                    read_at: m.read_at,
                })
            })
            .collect::<Result<Vec<_>>>()
    })
    .await?;

    Ok(Json(json!({ "messages": sent })))
}

/// GET /users/{username}/to
pub async fn messages_to(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse> {
    AuthorizationGuard::authorize(&identity, Ownership::Account(&username))?;

    let received = run_blocking(move || {
        let rows = messages::list_to(&state.db, &username)?;
        let users = summaries(&state.db, rows.iter().map(|m| m.from_username.as_str()))?;
        rows.into_iter()
            .map(|m| -> Result<ReceivedMessage> {
                let from_user = users
                    .get(&m.from_username)
                    .cloned()
                    .ok_or_else(|| ApiError::CorruptData("sender lookup failed".into()))?;
                Ok(ReceivedMessage {
                    id: m.id,
                    from_user,
                    body: m.body,
                    sent_at: m.sent_at,
                    read_at: m.read_at,
                })
            })
            .collect::<Result<Vec<_>>>()
    })
    .await?;

    Ok(Json(json!({ "messages": received })))
}
