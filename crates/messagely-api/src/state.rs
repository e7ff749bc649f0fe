use std::sync::Arc;

use messagely_db::Database;

use crate::password::PasswordHasher;
use crate::token::TokenIssuer;

pub type AppState = Arc<AppStateInner>;

/// Process-wide state. Built once before the listener starts and never
/// mutated afterwards; the database handles its own locking.
pub struct AppStateInner {
    pub db: Database,
    pub hasher: PasswordHasher,
    pub tokens: TokenIssuer,
}

impl AppStateInner {
    pub fn new(db: Database, hasher: PasswordHasher, tokens: TokenIssuer) -> AppState {
        Arc::new(Self { db, hasher, tokens })
    }
}
