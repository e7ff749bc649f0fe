pub mod migrations;
pub mod models;
pub mod queries;

use rusqlite::{Connection, ffi};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::info;

pub type Result<T> = std::result::Result<T, DbError>;

/// Storage failures. Absence of a record is not an error here: lookups
/// return `Option` and listings may be empty.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("referenced row does not exist: {0}")]
    MissingReference(String),

    #[error("sqlite: {0}")]
    Sqlite(#[source] rusqlite::Error),

    #[error("DB lock poisoned: {0}")]
    Poisoned(String),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref code, ref msg) = err {
            let detail = msg.clone().unwrap_or_else(|| code.to_string());
            match code.extended_code {
                ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                    return DbError::Duplicate(detail);
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return DbError::MissingReference(detail),
                _ => {}
            }
        }
        DbError::Sqlite(err)
    }
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Private in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` while holding the connection lock. Everything inside one call
    /// is serialised against every other caller.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DbError::Poisoned(e.to_string()))?;
        f(&conn)
    }
}
