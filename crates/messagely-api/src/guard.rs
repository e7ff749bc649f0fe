use tracing::{debug, warn};

use crate::error::{ApiError, Result};
use crate::token::TokenIssuer;

/// The authenticated caller, attached to the request once its token checks out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Who may act on a particular resource instance. Chosen by the operation,
/// evaluated by the guard.
#[derive(Debug, Clone, Copy)]
pub enum Ownership<'a> {
    /// Sender or recipient of a message.
    Participant { from: &'a str, to: &'a str },
    /// Only the recipient.
    Recipient(&'a str),
    /// Only the sender.
    Sender(&'a str),
    /// Only the account holder.
    Account(&'a str),
}

impl Ownership<'_> {
    pub fn permits(&self, username: &str) -> bool {
        match *self {
            Ownership::Participant { from, to } => username == from || username == to,
            Ownership::Recipient(to) => username == to,
            Ownership::Sender(from) => username == from,
            Ownership::Account(owner) => username == owner,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Ownership::Participant { .. } => "only the sender or recipient may view this message",
            Ownership::Recipient(_) => "only the recipient may do this",
            Ownership::Sender(_) => "messages may only be sent as yourself",
            Ownership::Account(_) => "only the account holder may do this",
        }
    }
}

/// Three-stage check in front of every protected operation: authenticate
/// the bearer token, identify the caller, authorize against an ownership
/// rule.
pub struct AuthorizationGuard<'a> {
    tokens: &'a TokenIssuer,
}

impl<'a> AuthorizationGuard<'a> {
    pub fn new(tokens: &'a TokenIssuer) -> Self {
        Self { tokens }
    }

    /// Resolve the raw `Authorization` header value to an identity.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Identity> {
        let token = authorization
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                debug!("Missing or non-bearer Authorization header");
                ApiError::Unauthenticated
            })?;

        let username = self.tokens.verify(token).map_err(|e| {
            warn!("Token rejected: {}", e);
            ApiError::from(e)
        })?;

        Ok(Identity::new(username))
    }

    pub fn authorize(identity: &Identity, rule: Ownership<'_>) -> Result<()> {
        if rule.permits(&identity.username) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized(format!(
                "{} ({})",
                rule.describe(),
                identity.username
            )))
        }
    }
}
