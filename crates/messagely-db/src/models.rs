//! Database row types. These map directly to SQLite rows and are kept
//! distinct from the messagely-types models so the password digest never
//! escapes this layer by accident.
use chrono::{DateTime, Utc};
use messagely_types::models::{Message, User};

pub struct UserRow {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            joined_at: row.join_at,
            last_login_at: row.last_login_at,
        }
    }
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: &'a str,
    pub join_at: DateTime<Utc>,
}

pub struct MessageRow {
    pub id: i64,
    pub from_username: String,
    pub to_username: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            from_username: row.from_username,
            to_username: row.to_username,
            body: row.body,
            sent_at: row.sent_at,
            read_at: row.read_at,
        }
    }
}

pub struct NewMessage<'a> {
    pub from_username: &'a str,
    pub to_username: &'a str,
    pub body: &'a str,
    pub sent_at: DateTime<Utc>,
}
