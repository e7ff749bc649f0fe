use chrono::Utc;
use tracing::info;

use messagely_db::DbError;
use messagely_db::models::NewUser;
use messagely_types::api::{AuthResponse, LoginRequest, RegisterRequest};
use messagely_types::models::{User, UserSummary};

use crate::error::{ApiError, Result};
use crate::guard::{AuthorizationGuard, Identity, Ownership};
use crate::password::MAX_PASSWORD_BYTES;
use crate::state::AppStateInner;

const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;
const MIN_PASSWORD_CHARS: usize = 8;

fn validate_registration(req: &RegisterRequest) -> Result<()> {
    let len = req.username.chars().count();
    if !USERNAME_LEN.contains(&len) {
        return Err(ApiError::Validation(
            "username must be between 3 and 32 characters".into(),
        ));
    }
    if !req
        .username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::Validation(
            "username may only contain letters, digits, '_' and '-'".into(),
        ));
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    for (field, value) in [
        ("first_name", &req.first_name),
        ("last_name", &req.last_name),
        ("phone", &req.phone),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!("{field} is required")));
        }
    }
    Ok(())
}

/// Create an account and log it straight in.
pub fn register(state: &AppStateInner, req: &RegisterRequest) -> Result<AuthResponse> {
    validate_registration(req)?;

    let password_hash = state.hasher.hash(&req.password)?;

    let row = state
        .db
        .insert_user(&NewUser {
            username: &req.username,
            password_hash: &password_hash,
            first_name: req.first_name.trim(),
            last_name: req.last_name.trim(),
            phone: req.phone.trim(),
            join_at: Utc::now(),
        })
        .map_err(|e| match e {
            DbError::Duplicate(_) => ApiError::DuplicateIdentity(req.username.clone()),
            other => other.into(),
        })?;

    info!("Registered user {}", row.username);

    let token = state.tokens.issue(&row.username)?;
    Ok(AuthResponse {
        username: row.username,
        token,
    })
}

/// Check a username/password pair. Unknown user and wrong password both
/// come back as `Unauthenticated`, after the same amount of hashing work.
///
/// Passwords longer than [`MAX_PASSWORD_BYTES`] can never have been
/// registered; they are refused without hashing the oversized input.
pub fn authenticate(state: &AppStateInner, username: &str, password: &str) -> Result<()> {
    let oversized = password.len() > MAX_PASSWORD_BYTES;

    match state.db.find_user_by_username(username)? {
        Some(user) if !oversized => {
            if state.hasher.verify(password, &user.password)? {
                Ok(())
            } else {
                Err(ApiError::Unauthenticated)
            }
        }
        _ => {
            state.hasher.verify_dummy(if oversized { "" } else { password });
            Err(ApiError::Unauthenticated)
        }
    }
}

pub fn login(state: &AppStateInner, req: &LoginRequest) -> Result<AuthResponse> {
    authenticate(state, &req.username, &req.password)?;

    let row = state
        .db
        .update_last_login(&req.username, Utc::now())?
        .ok_or(ApiError::Unauthenticated)?;

    info!("User {} logged in", row.username);

    let token = state.tokens.issue(&row.username)?;
    Ok(AuthResponse {
        username: row.username,
        token,
    })
}

pub fn get_user(state: &AppStateInner, actor: &Identity, username: &str) -> Result<User> {
    AuthorizationGuard::authorize(actor, Ownership::Account(username))?;

    state
        .db
        .find_user_by_username(username)?
        .map(User::from)
        .ok_or_else(|| ApiError::NotFound(format!("no such user: {username}")))
}

pub fn list_users(state: &AppStateInner) -> Result<Vec<UserSummary>> {
    Ok(state
        .db
        .list_users()?
        .into_iter()
        .map(|row| User::from(row).summary())
        .collect())
}
