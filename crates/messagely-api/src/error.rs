use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use messagely_db::DbError;

use crate::password::PasswordError;
use crate::token::TokenError;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("username already taken: {0}")]
    DuplicateIdentity(String),

    /// Deliberately carries no detail: a missing token, a bad token, an
    /// unknown user and a wrong password all look the same to the caller.
    #[error("authentication failed")]
    Unauthenticated,

    #[error("not permitted: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("corrupt data: {0}")]
    CorruptData(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::InvalidInput(msg) => ApiError::Validation(msg.to_string()),
            PasswordError::CorruptDigest => ApiError::CorruptData(err.to_string()),
            PasswordError::InvalidCost(_) | PasswordError::Hashing(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid(_) | TokenError::Expired => ApiError::Unauthenticated,
            TokenError::Signing(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Duplicate(_) => ApiError::DuplicateIdentity(err.to_string()),
            DbError::MissingReference(_) => ApiError::NotFound("referenced user".into()),
            DbError::Sqlite(_) | DbError::Poisoned(_) => ApiError::Internal(err.to_string()),
        }
    }
}

// Malformed bodies and path parameters are the caller's fault and answer
// with the same JSON shape as every other validation failure.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::DuplicateIdentity(_) => StatusCode::CONFLICT,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::CorruptData(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::CorruptData(ref msg) => {
                error!("Corrupt data: {}", msg);
                "Internal server error".to_string()
            }
            ApiError::Internal(ref msg) => {
                error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            ApiError::Unauthorized(ref msg) => {
                warn!("Authorization denied: {}", msg);
                self.to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
