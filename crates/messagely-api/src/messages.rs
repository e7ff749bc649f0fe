//! Message lifecycle: `Unread` on creation, `Read` once the recipient marks
//! it. Every operation checks the caller against the message's ownership
//! rule before touching state.

use chrono::Utc;
use tracing::{debug, info};

use messagely_db::Database;
use messagely_db::models::NewMessage;
use messagely_types::models::{Message, MessageState};

use crate::error::{ApiError, Result};
use crate::guard::{AuthorizationGuard, Identity, Ownership};

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("no such message: {id}"))
}

/// Send a message as `from_username`, who must be the caller.
pub fn create(
    db: &Database,
    actor: &Identity,
    from_username: &str,
    to_username: &str,
    body: &str,
) -> Result<Message> {
    if from_username.is_empty() || to_username.is_empty() {
        return Err(ApiError::Validation(
            "from_username and to_username are required".into(),
        ));
    }
    if body.trim().is_empty() {
        return Err(ApiError::Validation("message body is required".into()));
    }

    AuthorizationGuard::authorize(actor, Ownership::Sender(from_username))?;

    if db.find_user_by_username(to_username)?.is_none() {
        return Err(ApiError::NotFound(format!("no such user: {to_username}")));
    }

    let row = db.insert_message(&NewMessage {
        from_username,
        to_username,
        body,
        sent_at: Utc::now(),
    })?;

    info!("Message {} sent {} -> {}", row.id, row.from_username, row.to_username);
    Ok(row.into())
}

/// Fetch a message the caller sent or received.
pub fn get(db: &Database, actor: &Identity, id: i64) -> Result<Message> {
    let message: Message = db.find_message_by_id(id)?.ok_or_else(|| not_found(id))?.into();

    AuthorizationGuard::authorize(
        actor,
        Ownership::Participant {
            from: &message.from_username,
            to: &message.to_username,
        },
    )?;

    Ok(message)
}

/// Move a message to `Read`. Only the recipient may do this.
///
/// Marking an already-read message is a no-op that returns the record with
/// its original `read_at`.
pub fn mark_read(db: &Database, actor: &Identity, id: i64) -> Result<Message> {
    let message: Message = db.find_message_by_id(id)?.ok_or_else(|| not_found(id))?.into();

    AuthorizationGuard::authorize(actor, Ownership::Recipient(&message.to_username))?;

    if message.state() == MessageState::Read {
        debug!("Message {} already read", id);
        return Ok(message);
    }

    let updated = db
        .update_message_read_at(id, Utc::now())?
        .ok_or_else(|| not_found(id))?;

    Ok(updated.into())
}

/// Everything `username` has sent, oldest first. Empty is a valid answer.
pub fn list_from(db: &Database, username: &str) -> Result<Vec<Message>> {
    Ok(db
        .list_messages_by_sender(username)?
        .into_iter()
        .map(Message::from)
        .collect())
}

/// Everything `username` has received, oldest first. Empty is a valid answer.
pub fn list_to(db: &Database, username: &str) -> Result<Vec<Message>> {
    Ok(db
        .list_messages_by_recipient(username)?
        .into_iter()
        .map(Message::from)
        .collect())
}
