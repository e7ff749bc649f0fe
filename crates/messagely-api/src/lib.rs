//! Authentication and message authorization for messagely.
//!
//! Credentials are hashed with argon2id ([`password`]), sessions are HS256
//! JWTs carrying the username ([`token`]), and every protected operation
//! goes through [`guard`] before the message state machine in [`messages`]
//! will act on it.

pub mod accounts;
pub mod error;
pub mod guard;
pub mod messages;
pub mod middleware;
pub mod password;
pub mod routes;
pub mod state;
pub mod token;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};
