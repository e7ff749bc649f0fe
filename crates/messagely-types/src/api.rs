use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Message, UserSummary};

// -- JWT Claims --

/// Session token claims. `username` is the only identity claim; `exp` is
/// present only when the issuer was configured with a validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Returned by both register and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub username: String,
    pub token: String,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    /// Optional; when given it must name the caller.
    #[serde(default)]
    pub from_username: Option<String>,
    pub to_username: String,
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageDetail {
    pub id: i64,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub from_user: UserSummary,
    pub to_user: UserSummary,
}

/// Entry of a user's outbox (`/users/{username}/from`).
#[derive(Debug, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: i64,
    pub to_user: UserSummary,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Entry of a user's inbox (`/users/{username}/to`).
#[derive(Debug, Serialize, Deserialize)]
pub struct ReceivedMessage {
    pub id: i64,
    pub from_user: UserSummary,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub id: i64,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<&Message> for ReadReceipt {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            read_at: message.read_at,
        }
    }
}
