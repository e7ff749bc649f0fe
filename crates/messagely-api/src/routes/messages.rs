use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use messagely_db::Database;
use messagely_types::api::{MessageDetail, ReadReceipt, SendMessageRequest};
use messagely_types::models::{Message, User, UserSummary};

use crate::error::{ApiError, Result};
use crate::guard::Identity;
use crate::messages;
use crate::routes::run_blocking;
use crate::state::AppState;

/// Look up each distinct username once. Messages reference users by
/// foreign key, so a miss means the store is inconsistent.
pub(crate) fn summaries<'a>(
    db: &Database,
    usernames: impl IntoIterator<Item = &'a str>,
) -> Result<HashMap<String, UserSummary>> {
    let mut map = HashMap::new();
    for username in usernames {
        if map.contains_key(username) {
            continue;
        }
        let user = db
            .find_user_by_username(username)?
            .ok_or_else(|| ApiError::CorruptData(format!("message references missing user {username}")))?;
        map.insert(username.to_string(), User::from(user).summary());
    }
    Ok(map)
}

fn detail(db: &Database, message: Message) -> Result<MessageDetail> {
    let mut users = summaries(db, [message.from_username.as_str(), message.to_username.as_str()])?;
    // Self-addressed messages share one entry.
    let to_user = users
        .get(&message.to_username)
        .cloned()
        .ok_or_else(|| ApiError::CorruptData("recipient lookup failed".into()))?;
    let from_user = users
        .remove(&message.from_username)
        .ok_or_else(|| ApiError::CorruptData("sender lookup failed".into()))?;

    Ok(MessageDetail {
        id: message.id,
        body: message.body,
        sent_at: message.sent_at,
        read_at: message.read_at,
        from_user,
        to_user,
    })
}

/// POST /messages
pub async fn send_message(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    body: std::result::Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = body?;
    let message = run_blocking(move || {
        let from = req.from_username.as_deref().unwrap_or(&identity.username);
        messages::create(&state.db, &identity, from, &req.to_username, &req.body)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": message }))))
}

/// GET /messages/{id}
pub async fn get_message(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    let message = run_blocking(move || {
        let message = messages::get(&state.db, &identity, id)?;
        detail(&state.db, message)
    })
    .await?;

    Ok(Json(json!({ "message": message })))
}

/// POST /messages/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse> {
    let Path(id) = id?;
    let message = run_blocking(move || messages::mark_read(&state.db, &identity, id)).await?;

    Ok(Json(json!({ "message": ReadReceipt::from(&message) })))
}
