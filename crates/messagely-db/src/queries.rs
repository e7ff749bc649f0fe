use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};

use crate::models::{MessageRow, NewMessage, NewUser, UserRow};
use crate::{Database, Result};

const USER_COLUMNS: &str = "username, password, first_name, last_name, phone, join_at, last_login_at";
const MESSAGE_COLUMNS: &str = "id, from_username, to_username, body, sent_at, read_at";

impl Database {
    // -- Users --

    /// Fails with `DbError::Duplicate` if the username is taken.
    pub fn insert_user(&self, user: &NewUser<'_>) -> Result<UserRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password, first_name, last_name, phone, join_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    user.username,
                    user.password_hash,
                    user.first_name,
                    user.last_name,
                    user.phone,
                    user.join_at,
                ],
            )?;
            Ok(UserRow {
                username: user.username.to_string(),
                password: user.password_hash.to_string(),
                first_name: user.first_name.to_string(),
                last_name: user.last_name.to_string(),
                phone: user.phone.to_string(),
                join_at: user.join_at,
                last_login_at: None,
            })
        })
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, username))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY username"
            ))?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Stamp `last_login_at`. Returns `None` if the user does not exist.
    pub fn update_last_login(&self, username: &str, at: DateTime<Utc>) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET last_login_at = ?2 WHERE username = ?1",
                rusqlite::params![username, at],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user(conn, username)
        })
    }

    // -- Messages --

    /// Fails with `DbError::MissingReference` if either username is unknown.
    pub fn insert_message(&self, message: &NewMessage<'_>) -> Result<MessageRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (from_username, to_username, body, sent_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    message.from_username,
                    message.to_username,
                    message.body,
                    message.sent_at,
                ],
            )?;
            Ok(MessageRow {
                id: conn.last_insert_rowid(),
                from_username: message.from_username.to_string(),
                to_username: message.to_username.to_string(),
                body: message.body.to_string(),
                sent_at: message.sent_at,
                read_at: None,
            })
        })
    }

    pub fn find_message_by_id(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    /// Set `read_at` if it is still unset, then return the current row.
    ///
    /// The `read_at IS NULL` guard makes the transition apply at most once:
    /// a second call leaves the original timestamp in place. Returns `None`
    /// if the message does not exist.
    pub fn update_message_read_at(&self, id: i64, at: DateTime<Utc>) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE messages SET read_at = ?2 WHERE id = ?1 AND read_at IS NULL",
                rusqlite::params![id, at],
            )?;
            query_message(conn, id)
        })
    }

    pub fn list_messages_by_sender(&self, username: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages_where(conn, "from_username", username))
    }

    pub fn list_messages_by_recipient(&self, username: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages_where(conn, "to_username", username))
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        username: row.get(0)?,
        password: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        phone: row.get(4)?,
        join_at: row.get(5)?,
        last_login_at: row.get(6)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        from_username: row.get(1)?,
        to_username: row.get(2)?,
        body: row.get(3)?,
        sent_at: row.get(4)?,
        read_at: row.get(5)?,
    })
}

fn query_user(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
    ))?;

    stmt.query_row([username], user_from_row).optional()
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<MessageRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"
    ))?;

    stmt.query_row([id], message_from_row).optional()
}

// `column` is always one of two literals from this file, never user input.
fn query_messages_where(conn: &Connection, column: &str, username: &str) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE {column} = ?1 ORDER BY sent_at, id"
    ))?;

    let rows = stmt
        .query_map([username], message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
