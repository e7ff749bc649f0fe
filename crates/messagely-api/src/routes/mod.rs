pub mod auth;
pub mod messages;
pub mod users;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tracing::error;

use crate::error::{ApiError, Result};
use crate::middleware::require_auth;
use crate::state::AppState;

/// All routes. Cross-cutting layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/{username}", get(users::get_user))
        .route("/users/{username}/from", get(users::messages_from))
        .route("/users/{username}/to", get(users::messages_to))
        .route("/messages", post(messages::send_message))
        .route("/messages/{id}", get(messages::get_message))
        .route("/messages/{id}/read", post(messages::mark_read))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Run blocking DB or hashing work off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal("worker task failed".into())
    })?
}
